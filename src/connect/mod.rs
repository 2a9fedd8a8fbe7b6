// src/connect/mod.rs

//! Typed operations of the control service.
//!
//! [`ConnectClient`] maps each operation onto exactly one request (or one
//! streamed listing, or one capture) on the account's subjects. It holds no
//! state beyond the bound account, the transport and the default request
//! options; every call is independent.
//!
//! Look-ups return `Ok(None)` when the service reports the item as not
//! found, and `ConnectError::Decode` when it reports the item as found but
//! leaves it out. Every other failure is returned exactly as the [`RpcClient`]
//! produced it.

mod capture;
mod connectors;
mod deployments;
mod library;

use serde::de::{self, DeserializeOwned};
use serde::Serialize;

use crate::macros::log_info;
use crate::{
    // ---
    create_transport,
    subjects,
    ClientConfig,
    ConnectError,
    RequestOptions,
    Result,
    RpcClient,
    Subject,
    TransportPtr,
};

/// Client for connector, deployment and library management.
///
/// Cheap to clone. Construct it once at startup and pass it to whatever
/// needs it:
///
/// ```no_run
/// # use connect_client::{ClientConfig, ConnectClient};
/// # async fn example() -> connect_client::Result<()> {
/// let config = ClientConfig::with_server("nats://localhost:4222", "acct1");
/// let client = ConnectClient::connect(&config).await?;
///
/// for connector in client.list_connectors().await? {
///     println!("{} ({})", connector.connector_id, connector.running_instances);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectClient {
    // ---
    rpc: RpcClient,
    options: RequestOptions,
}

impl ConnectClient {
    // ---
    /// Build a client on an existing transport.
    pub fn with_transport(transport: TransportPtr, account: impl Into<String>) -> Self {
        let account: String = account.into();
        Self {
            rpc: RpcClient::new(transport, account),
            options: RequestOptions::default(),
        }
    }

    /// Open the transport described by `config` and build a client on it.
    ///
    /// # Errors
    ///
    /// Returns whatever [`create_transport`] returns.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        // ---
        let transport = create_transport(config).await?;
        log_info!(
            "{}: connected for account {}",
            config.transport_id,
            config.account
        );

        let client = Self::with_transport(transport, config.account.clone());
        Ok(client.with_options(config.request_options()))
    }

    /// Replace the request options used by every operation.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> RequestOptions {
        self.options
    }

    pub fn account(&self) -> &str {
        self.rpc.account()
    }

    /// The underlying request/reply client.
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Close the underlying transport.
    pub async fn close(&self) -> Result<()> {
        self.rpc.transport().close().await
    }

    fn subject(&self, op: &str) -> Subject {
        subjects::rpc_subject(self.rpc.account(), op)
    }

    async fn call<Req, Resp>(&self, op: &str, req: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        self.rpc
            .request_json(&self.subject(op), req, self.options)
            .await
    }

    async fn list<Req, T>(&self, op: &str, req: &Req) -> Result<Vec<T>>
    where
        Req: Serialize,
        T: DeserializeOwned,
    {
        // ---
        self.rpc
            .open_list(&self.subject(op), req, self.options)
            .await?
            .collect_json()
            .await
    }

    async fn list_with<Req, T, F>(&self, op: &str, req: &Req, handler: F) -> Result<()>
    where
        Req: Serialize,
        T: DeserializeOwned,
        F: FnMut(Option<T>, bool) -> Result<()>,
    {
        self.rpc
            .request_list_json(&self.subject(op), req, self.options, handler)
            .await
    }
}

/// Turn a `{found, <item>}` reply into `Some(item)` or `None`.
///
/// A reply that says found but carries no item is a malformed success
/// payload and fails with `ConnectError::Decode`.
fn found<T>(found: bool, item: Option<T>, field: &'static str) -> Result<Option<T>> {
    // ---
    match (found, item) {
        (false, _) => Ok(None),
        (true, Some(item)) => Ok(Some(item)),
        (true, None) => Err(ConnectError::Decode(de::Error::missing_field(field))),
    }
}
