// src/domain/transport.rs

//! Bus domain abstractions.
//!
//! This module defines the message-bus interface used by the RPC client and
//! the capture layer. It intentionally avoids any reference to a concrete
//! client library; concrete implementations live under `src/transport/`.
//!
//! The bus is responsible only for delivering opaque messages to subscribed
//! consumers. Request/reply correlation, pagination, timeouts and service
//! error decoding are handled by [`RpcClient`](crate::RpcClient).
use crate::{ConnectError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

/// Prefix for generated reply inboxes.
pub const INBOX_PREFIX: &str = "_INBOX";

/// A hierarchical, dot-separated bus address.
///
/// Subjects used for publishing must be concrete. Subjects used for
/// subscribing may contain wildcard tokens:
///
/// - `*` matches exactly one token
/// - `>` matches one or more trailing tokens and must be the last token
///
/// ```
/// # use connect_client::Subject;
/// let pattern = Subject::from("$CONNECT.acct.LOGS.CONNECTOR.*.DEPLOYMENT.*.INSTANCE.i1");
/// assert!(pattern.is_wildcard());
/// let subject = Subject::from("$CONNECT.acct.LOGS.CONNECTOR.c1.DEPLOYMENT.d1.INSTANCE.i1");
/// assert!(subject.matches(&pattern));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subject(pub Arc<str>);

impl Subject {
    // ---
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the dot-separated tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// True if any token is a wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.tokens().any(|t| t == "*" || t == ">")
    }

    /// Does this concrete subject match `pattern`?
    ///
    /// Matching is token-wise; a literal token must be equal, `*` accepts any
    /// single token and `>` accepts the rest of the subject as long as at
    /// least one token remains.
    pub fn matches(&self, pattern: &Subject) -> bool {
        // ---
        let mut subject = self.tokens();
        let mut pattern = pattern.tokens();

        loop {
            match (pattern.next(), subject.next()) {
                (None, None) => return true,
                (Some(">"), Some(_)) => return true,
                (Some("*"), Some(_)) => continue,
                (Some(p), Some(s)) if p == s => continue,
                _ => return false,
            }
        }
    }

    /// Reject wildcards and empty tokens on subjects used as publish targets.
    pub fn ensure_publishable(&self) -> Result<()> {
        // ---
        if self.0.is_empty() || self.tokens().any(str::is_empty) {
            return Err(ConnectError::InvalidSubject(format!(
                "empty token in subject '{self}'"
            )));
        }
        if self.is_wildcard() {
            return Err(ConnectError::InvalidSubject(format!(
                "wildcard subject '{self}' cannot be used as a publish target"
            )));
        }
        Ok(())
    }
}

impl<T> From<T> for Subject
where
    T: Into<Arc<str>>,
{
    fn from(value: T) -> Self {
        // ---
        Subject(value.into())
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Out-of-band message metadata.
///
/// Header names are compared exactly; the protocol constants in
/// [`crate::protocol`] are the only names this crate reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A single bus message.
///
/// The bus does not interpret the payload or the headers; it only routes on
/// `subject` and hands `reply` to whoever answers.
#[derive(Clone, Debug)]
pub struct Message {
    // ---
    /// Delivery subject.
    pub subject: Subject,

    /// Reply subject for request/reply exchanges.
    pub reply: Option<Subject>,

    /// Out-of-band metadata (service errors, has-more flag, event type).
    pub headers: Headers,

    /// Opaque payload bytes, JSON for every subject this crate uses.
    pub payload: Bytes,

    /// Bus status code, set by the bus itself (e.g. `503` for no responders).
    pub status: Option<u16>,
}

impl Message {
    // ---
    /// Create a message with no reply subject and no headers.
    pub fn new(subject: impl Into<Subject>, payload: impl Into<Bytes>) -> Self {
        // ---
        Self {
            subject: subject.into(),
            reply: None,
            headers: Headers::new(),
            payload: payload.into(),
            status: None,
        }
    }

    pub fn with_reply(mut self, reply: impl Into<Subject>) -> Self {
        self.reply = Some(reply.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

/// Handle returned from a successful subscription.
///
/// The subscription remains active until either:
/// - the handle is dropped (receiver channel closes)
/// - the transport is closed
///
/// Dropping the handle unsubscribes.
pub struct SubscriptionHandle {
    // ---
    /// Subject (possibly a wildcard pattern) this handle listens on.
    pub subject: Subject,

    /// Receiver channel for delivered messages matching the subject.
    pub inbox: mpsc::Receiver<Message>,
}

/// Shared base state for all transport implementations.
///
/// Each concrete transport embeds this as a field named `base` so the default
/// `Transport` methods can delegate to it.
#[derive(Debug, Clone)]
pub struct TransportBase {
    /// Unique identifier for this transport instance, used for logging.
    pub transport_id: String,
    /// Prefix for generated reply inboxes.
    pub inbox_prefix: String,
}

impl TransportBase {
    pub fn new(transport_id: impl Into<String>) -> Self {
        // ---
        Self {
            transport_id: transport_id.into(),
            inbox_prefix: INBOX_PREFIX.to_string(),
        }
    }
}

/// Message bus abstraction.
///
/// Implementations must ensure that:
/// - once `subscribe()` returns successfully, messages published *after* that
///   point and matching the subscription are deliverable;
/// - messages published by one caller on one subject are delivered to a
///   subscriber in publish order;
/// - `publish()` rejects wildcard subjects.
///
/// The in-memory transport is the reference implementation of these
/// semantics.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    // ---
    /// Returns a reference to the shared base state.
    fn base(&self) -> &TransportBase;

    /// Returns the transport_id of the transport.
    fn transport_id(&self) -> &str {
        &self.base().transport_id
    }

    /// Generate a fresh, unique reply subject.
    fn new_inbox(&self) -> Subject {
        // ---
        Subject::from(format!(
            "{}.{}",
            self.base().inbox_prefix,
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// Publish a message on its subject.
    async fn publish(&self, msg: Message) -> Result<()>;

    /// Register a subscription and return a handle for receiving messages.
    async fn subscribe(&self, subject: Subject) -> Result<SubscriptionHandle>;

    /// Wait until every message published so far has been handed to the bus.
    async fn flush(&self) -> Result<()>;

    /// Close the transport and release any associated resources.
    async fn close(&self) -> Result<()>;
}

/// Shared transport pointer.
///
/// `.clone()` only increments a reference count; every clone shares the same
/// underlying connection.
pub type TransportPtr = Arc<dyn Transport>;

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_single_token_wildcard() {
        // ---
        let pattern = Subject::from("a.*.c");
        assert!(Subject::from("a.b.c").matches(&pattern));
        assert!(!Subject::from("a.b.b.c").matches(&pattern));
        assert!(!Subject::from("a.b").matches(&pattern));
    }

    #[test]
    fn test_tail_wildcard_needs_a_token() {
        // ---
        let pattern = Subject::from("$CONSVC.acct.>");
        let list = Subject::from("$CONSVC.acct.CONNECTORS.LIST");
        assert!(list.matches(&pattern));
        assert!(Subject::from("$CONSVC.acct.X").matches(&pattern));
        assert!(!Subject::from("$CONSVC.acct").matches(&pattern));
    }

    #[test]
    fn test_literal_match() {
        // ---
        let s = Subject::from("_INBOX.abc");
        assert!(s.matches(&s.clone()));
        assert!(!Subject::from("_INBOX.abd").matches(&s));
    }

    #[test]
    fn test_publishable() {
        // ---
        assert!(Subject::from("a.b").ensure_publishable().is_ok());
        assert!(matches!(
            Subject::from("a.*").ensure_publishable(),
            Err(ConnectError::InvalidSubject(_))
        ));
        assert!(matches!(
            Subject::from("a..b").ensure_publishable(),
            Err(ConnectError::InvalidSubject(_))
        ));
    }

    #[test]
    fn test_message_builders() {
        // ---
        let msg = Message::new("a.b", Bytes::from_static(b"{}"))
            .with_reply("_INBOX.1")
            .with_header("Connect-Has-More", "true");

        assert_eq!(msg.reply, Some(Subject::from("_INBOX.1")));
        assert_eq!(msg.header("Connect-Has-More"), Some("true"));
        assert_eq!(msg.header("missing"), None);
    }
}
