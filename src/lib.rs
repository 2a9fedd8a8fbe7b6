// src/lib.rs

//! Management client for a fleet of data-pipeline connectors.
//!
//! The control service is reachable only through a publish/subscribe bus.
//! This crate provides the protocol layer on top of that bus:
//!
//! - single request/reply calls with structured service errors,
//! - streamed listings terminated by a has-more flag,
//! - live capture of connector logs, events and metrics,
//!
//! and a typed façade, [`ConnectClient`], for the service's operations.
//!
//! ```no_run
//! use connect_client::{CaptureFilter, ClientConfig, ConnectClient};
//!
//! # async fn example() -> connect_client::Result<()> {
//! let config = ClientConfig::with_server("nats://localhost:4222", "acct1");
//! let client = ConnectClient::connect(&config).await?;
//!
//! if let Some(connector) = client.get_connector("orders-to-s3").await? {
//!     println!("{}: {}", connector.connector_id, connector.description);
//! }
//!
//! let logs = client
//!     .capture_logs(&CaptureFilter::connector("orders-to-s3"), |line| {
//!         println!("[{}] {}", line.source.instance_id, line.record.text);
//!     })
//!     .await?;
//! // ...
//! logs.stop().await;
//! # Ok(())
//! # }
//! ```

// Logging macros first so every module below can use them.
mod macros;

// Import all sub modules once...
mod capture;
mod client;
mod connect;
mod domain;
mod protocol;
mod transport;

mod rpc_config;

mod error;
mod retry;

pub mod model;
pub mod subjects;

// Re-export main types
pub use client::{CursorItem, ReplyStream, RpcClient};
pub use connect::ConnectClient;

pub use capture::{
    //
    capture,
    capture_events,
    capture_logs,
    capture_metrics,
    CaptureFilter,
    CaptureHandle,
    CaptureKind,
    CaptureSource,
};

pub use rpc_config::{ClientConfig, RequestOptions, DEFAULT_REQUEST_TIMEOUT};

pub use error::{ConnectError, Result};
pub use retry::{retry_with_backoff, RetryConfig};

pub use protocol::{
    //
    EVENT_TYPE_HEADER,
    HAS_MORE_HEADER,
    SERVICE_ERROR_CODE_HEADER,
    SERVICE_ERROR_HEADER,
};

pub use transport::{create_memory_transport, create_memory_transport_with_hub, MemoryHub};

#[cfg(feature = "transport_nats")]
pub use transport::create_nats_transport;

// --- public re-exports
pub use domain::{
    //
    Headers,
    Message,
    Subject,
    SubscriptionHandle,
    Transport,
    TransportBase,
    TransportPtr,
    INBOX_PREFIX,
};

/// Create the transport selected by `config`.
///
/// - `transport_uri` set and feature `transport_nats` enabled: NATS
/// - `transport_uri` unset: the in-memory transport on the process-global hub
///
/// # Errors
///
/// `ConnectError::MissingConfig` if a server URI is given but no bus client
/// is compiled in; otherwise whatever the selected transport returns.
pub async fn create_transport(config: &ClientConfig) -> Result<TransportPtr> {
    // ---
    match config.transport_uri.as_deref() {
        #[cfg(feature = "transport_nats")]
        Some(_) => create_nats_transport(config).await,

        #[cfg(not(feature = "transport_nats"))]
        Some(uri) => Err(ConnectError::MissingConfig(format!(
            "no bus client compiled in for '{uri}' (enable feature transport_nats)"
        ))),

        None => create_memory_transport(config).await,
    }
}
