// src/error.rs

use thiserror::Error;

/// Errors returned by the connect client.
///
/// The variants keep the four protocol failure kinds (encode, transport,
/// timeout, service) distinguishable so that a caller can decide what to
/// surface and what to re-issue.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Request payload could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// Success payload could not be deserialized into the expected type.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Bus-level failure: no connection, closed transport, or a failed
    /// connect, subscribe, publish or flush on the bus client.
    #[error("transport error: {0}")]
    Transport(String),

    /// No reply (or no next streamed reply) within the configured window.
    #[error("request timed out")]
    Timeout,

    /// The control service explicitly rejected the call.
    #[error("service error {code}: {message}")]
    Service { message: String, code: u16 },

    /// Subject is not legal for the requested operation.
    #[error("invalid subject: {0}")]
    InvalidSubject(String),

    /// Required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),
}

impl ConnectError {
    /// True when re-issuing the whole call may succeed.
    ///
    /// Only timeouts qualify; service rejections and encode failures are
    /// deterministic and transport failures need a new connection.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectError::Timeout)
    }

    /// Build a service error from the raw out-of-band header values.
    pub(crate) fn service(message: impl Into<String>, code: Option<&str>) -> Self {
        // ---
        let code = code.and_then(|c| c.trim().parse().ok()).unwrap_or(0);
        ConnectError::Service {
            message: message.into(),
            code,
        }
    }
}

/// Result type alias for connect client operations
pub type Result<T> = std::result::Result<T, ConnectError>;
