// src/transport/memory.rs

//! In-memory transport implementation.
//!
//! This module provides a pure in-process implementation of the domain-level
//! `Transport` trait. It is intended primarily for testing, local execution,
//! and as a reference for bus semantics.
//!
//! ## Reference Semantics
//!
//! The in-memory transport defines the **reference behavior** for the bus
//! layer:
//!
//! - Once `subscribe()` returns successfully, messages published *after* that
//!   point and matching the subscription are deliverable.
//! - Subject matching follows NATS rules (`*` one token, `>` the tail).
//! - Messages from one publisher on one subject arrive in publish order.
//! - Publishing to a wildcard subject is rejected.
//! - No messages are dropped due to timing, scheduling, or background IO.
//!
//! ## Non-Goals
//!
//! This transport does not emulate persistence, queue groups, or the
//! "no responders" status of a real server; an unanswered request simply
//! times out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::{mpsc, RwLock};

use crate::macros::{log_debug, log_trace};
use crate::{
    // ---
    ClientConfig,
    ConnectError,
    Message,
    Result,
    Subject,
    SubscriptionHandle,
    Transport,
    TransportBase,
    TransportPtr,
};

/// Capacity of each subscription inbox.
const INBOX_CAPACITY: usize = 256;

struct HubSubscriber {
    // ---
    owner: String,
    pattern: Subject,
    sender: mpsc::Sender<Message>,
}

/// Shared message bus for the in-memory transport.
///
/// Simulates a broker within a single process. All memory transports that
/// share a `MemoryHub` can publish and receive each other's messages, exactly
/// as clients connected to the same server would.
///
/// Integration tests construct one hub per test case and pass it to
/// [`create_memory_transport_with_hub`] so parallel tests stay isolated.
///
/// ```
/// # use connect_client::{ClientConfig, MemoryHub};
/// # async fn example() -> connect_client::Result<()> {
/// let hub = MemoryHub::new();
///
/// let service = connect_client::create_memory_transport_with_hub(
///     &ClientConfig::memory("acct").with_transport_id("service"),
///     hub.clone(),
/// ).await?;
/// let client = connect_client::create_memory_transport_with_hub(
///     &ClientConfig::memory("acct").with_transport_id("cli"),
///     hub.clone(),
/// ).await?;
/// # Ok(())
/// # }
/// ```
pub struct MemoryHub {
    // ---
    subscribers: RwLock<Vec<HubSubscriber>>,
}

impl MemoryHub {
    /// Create a new, empty hub.
    pub fn new() -> Arc<Self> {
        // ---
        Arc::new(Self::default())
    }

    /// Number of live subscriptions on the hub.
    pub async fn subscription_count(&self) -> usize {
        // ---
        let subs = self.subscribers.read().await;
        subs.iter().filter(|s| !s.sender.is_closed()).count()
    }

    async fn publish(&self, transport_id: &str, msg: Message) -> Result<()> {
        // ---
        msg.subject.ensure_publishable()?;

        // Collect targets first so no lock is held while a slow subscriber
        // applies backpressure.
        let targets: Vec<mpsc::Sender<Message>> = {
            let subs = self.subscribers.read().await;
            subs.iter()
                .filter(|s| !s.sender.is_closed() && msg.subject.matches(&s.pattern))
                .map(|s| s.sender.clone())
                .collect()
        };

        log_trace!(
            "{transport_id}: publish {} to {} subscriber(s)",
            msg.subject,
            targets.len()
        );

        for sender in targets {
            // A closed channel indicates a dropped SubscriptionHandle.
            if sender.send(msg.clone()).await.is_err() {
                log_trace!("{transport_id}: subscriber went away during publish");
            }
        }

        Ok(())
    }

    async fn subscribe(&self, transport_id: &str, subject: Subject) -> Result<SubscriptionHandle> {
        // ---
        log_debug!("{transport_id}: subscribe to {subject}");

        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);

        let mut subs = self.subscribers.write().await;
        subs.retain(|s| !s.sender.is_closed());
        subs.push(HubSubscriber {
            owner: transport_id.to_string(),
            pattern: subject.clone(),
            sender: tx,
        });

        Ok(SubscriptionHandle { subject, inbox: rx })
    }

    async fn remove_owner(&self, transport_id: &str) {
        // ---
        let mut subs = self.subscribers.write().await;
        subs.retain(|s| s.owner != transport_id);
    }
}

impl Default for MemoryHub {
    fn default() -> Self {
        // ---
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }
}

/// Process-global hub used by [`create_memory_transport`].
static GLOBAL_HUB: OnceLock<Arc<MemoryHub>> = OnceLock::new();

fn global_hub() -> Arc<MemoryHub> {
    GLOBAL_HUB.get_or_init(MemoryHub::new).clone()
}

/// In-memory transport.
///
/// Routes messages through a shared [`MemoryHub`].
struct MemoryTransport {
    // ---
    base: TransportBase,
    hub: Arc<MemoryHub>,
    closed: AtomicBool,
}

impl MemoryTransport {
    fn ensure_open(&self) -> Result<()> {
        // ---
        if self.closed.load(Ordering::Acquire) {
            return Err(ConnectError::Transport(format!(
                "{}: transport closed",
                self.transport_id()
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    // ---
    fn base(&self) -> &TransportBase {
        &self.base
    }

    /// Publish a message to all matching subscriptions on the shared hub.
    async fn publish(&self, msg: Message) -> Result<()> {
        self.ensure_open()?;
        self.hub.publish(self.transport_id(), msg).await
    }

    /// Register a subscription on the shared hub.
    ///
    /// Once this function returns successfully, any subsequent calls to
    /// `publish()` with matching subjects are deliverable to the returned
    /// inbox.
    async fn subscribe(&self, subject: Subject) -> Result<SubscriptionHandle> {
        self.ensure_open()?;
        self.hub.subscribe(self.transport_id(), subject).await
    }

    /// Delivery into the hub is complete when `publish()` returns.
    async fn flush(&self) -> Result<()> {
        self.ensure_open()
    }

    /// Close the transport.
    ///
    /// Removes this transport's subscriptions from the hub, which ends every
    /// open inbox. Subscriptions of other transports on the same hub are
    /// untouched.
    async fn close(&self) -> Result<()> {
        // ---
        log_debug!("{}: closing transport", self.transport_id());

        self.closed.store(true, Ordering::Release);
        self.hub.remove_owner(self.transport_id()).await;
        Ok(())
    }
}

/// Create a new in-memory transport using the process-global hub.
///
/// All transports created with this function share a single bus. For
/// isolated parallel testing, use [`create_memory_transport_with_hub`].
///
/// # Errors
///
/// Currently infallible; always returns `Ok`.
pub async fn create_memory_transport(config: &ClientConfig) -> Result<TransportPtr> {
    // ---
    create_memory_transport_with_hub(config, global_hub()).await
}

/// Create a new in-memory transport using the provided hub.
///
/// # Errors
///
/// Currently infallible; always returns `Ok`.
pub async fn create_memory_transport_with_hub(
    config: &ClientConfig,
    hub: Arc<MemoryHub>,
) -> Result<TransportPtr> {
    // ---
    log_debug!("{}: create memory transport", config.transport_id);

    let transport = MemoryTransport {
        base: TransportBase::new(config.transport_id.clone()),
        hub,
        closed: AtomicBool::new(false),
    };

    Ok(Arc::new(transport))
}
