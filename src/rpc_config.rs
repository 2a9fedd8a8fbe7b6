// src/rpc_config.rs

//! Client configuration and per-call request options.
//!
//! This type intentionally contains no bus-client-specific settings;
//! transport factories interpret it into concrete connection parameters.
//! Credentials are never part of it: the bus connection is expected to be
//! authenticated by whoever launches the client.

use std::time::Duration;

/// Default bound on every blocking wait (send, reply, next streamed reply).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-call configuration.
///
/// The timeout bounds sending the request and each individual receive: for
/// a single request it is the wait for the one reply, for a streamed listing
/// it is the wait for the *next* reply and is reset by every reply that
/// arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    pub timeout: Duration,
}

impl RequestOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Connection parameters and client defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // ---
    /// Tenant account; every subject is namespaced by it.
    pub account: String,

    /// Bus server URI (e.g. `"nats://localhost:4222"`).
    ///
    /// `None` selects the in-memory transport.
    pub transport_uri: Option<String>,

    /// Identifier for the transport instance, used for logging and as the
    /// connection name.
    pub transport_id: String,

    /// Timeout applied when a call does not pass its own [`RequestOptions`].
    ///
    /// Default: 5 seconds
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Create a config that connects to the given bus server.
    pub fn with_server(transport_uri: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            transport_uri: Some(transport_uri.into()),
            transport_id: "connect-client".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create an in-memory transport config (no server).
    pub fn memory(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            transport_uri: None,
            transport_id: "connect-client".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the transport identifier.
    pub fn with_transport_id(mut self, id: impl Into<String>) -> Self {
        self.transport_id = id.into();
        self
    }

    /// Set the default per-call timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use connect_client::ClientConfig;
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::with_server("nats://localhost:4222", "acct1")
    ///     .with_request_timeout(Duration::from_secs(10));
    /// assert_eq!(config.request_options().timeout, Duration::from_secs(10));
    /// ```
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Request options derived from this config's default timeout.
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions::with_timeout(self.request_timeout)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_request_options_default_is_five_seconds() {
        // ---
        assert_eq!(RequestOptions::default().timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_memory_config_defaults() {
        // ---
        let config = ClientConfig::memory("acct1");

        assert_eq!(config.account, "acct1");
        assert!(config.transport_uri.is_none());
        assert_eq!(config.request_options(), RequestOptions::default());
    }

    #[test]
    fn test_builder_chain() {
        // ---
        let config = ClientConfig::with_server("nats://x:4222", "acct2")
            .with_transport_id("ops-cli")
            .with_request_timeout(Duration::from_millis(750));

        let timeout = config.request_options().timeout;
        assert_eq!(config.transport_uri.as_deref(), Some("nats://x:4222"));
        assert_eq!(config.transport_id, "ops-cli");
        assert_eq!(timeout, Duration::from_millis(750));
    }
}
