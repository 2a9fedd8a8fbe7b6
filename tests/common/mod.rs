// tests/common/mod.rs

//! Scripted stand-in for the control service.
//!
//! A `FakeService` listens on `$CONSVC.<account>.>` on its own memory
//! transport and answers every request with the replies its script returns.
//! Each test builds its own `MemoryHub`, so tests never see each other's
//! traffic.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use connect_client::{
    //
    create_memory_transport_with_hub,
    ClientConfig,
    ConnectClient,
    MemoryHub,
    Message,
    Subject,
    TransportPtr,
    HAS_MORE_HEADER,
    SERVICE_ERROR_CODE_HEADER,
    SERVICE_ERROR_HEADER,
};

pub const ACCOUNT: &str = "acct1";

pub fn init_logging() {
    // ---
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One scripted reply.
#[derive(Debug, Clone)]
pub struct Reply {
    pub payload: Bytes,
    pub headers: Vec<(&'static str, String)>,
    /// Wait this long (after the previous reply) before sending.
    pub delay: Duration,
}

impl Reply {
    pub fn json<T: Serialize>(body: &T) -> Self {
        Self {
            payload: Bytes::from(serde_json::to_vec(body).unwrap()),
            headers: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    /// The empty-slot sentinel.
    pub fn null() -> Self {
        Self {
            payload: Bytes::from_static(b"null"),
            headers: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(payload: &'static [u8]) -> Self {
        Self {
            payload: Bytes::from_static(payload),
            headers: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn service_error(message: &str, code: u16) -> Self {
        Self::raw(b"")
            .header(SERVICE_ERROR_HEADER, message)
            .header(SERVICE_ERROR_CODE_HEADER, code.to_string())
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn more(self, has_more: bool) -> Self {
        self.header(HAS_MORE_HEADER, has_more.to_string())
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Stream `items` the way the service does: one reply per item, has-more on
/// all but the last, and a single `null` reply for an empty list.
pub fn stream<T: Serialize>(items: &[T]) -> Vec<Reply> {
    // ---
    if items.is_empty() {
        return vec![Reply::null().more(false)];
    }

    let last = items.len() - 1;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| Reply::json(item).more(i != last))
        .collect()
}

/// A request as the service saw it: operation (subject after the account)
/// and decoded body.
#[derive(Debug, Clone)]
pub struct Received {
    pub op: String,
    pub body: Value,
}

pub struct FakeService {
    // ---
    pub hub: Arc<MemoryHub>,
    transport: TransportPtr,
    received: Arc<Mutex<Vec<Received>>>,
    task: JoinHandle<()>,
}

impl FakeService {
    // ---
    /// Start answering requests with `script(op, body)`.
    pub async fn start<S>(mut script: S) -> Self
    where
        S: FnMut(&str, &Value) -> Vec<Reply> + Send + 'static,
    {
        // ---
        let hub = MemoryHub::new();
        let transport = create_memory_transport_with_hub(
            &ClientConfig::memory(ACCOUNT).with_transport_id("fake-service"),
            hub.clone(),
        )
        .await
        .unwrap();

        let prefix = format!("$CONSVC.{ACCOUNT}.");
        let mut sub = transport
            .subscribe(Subject::from(format!("{prefix}>")))
            .await
            .unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let log = received.clone();
        let service = transport.clone();

        let task = tokio::spawn(async move {
            // ---
            while let Some(req) = sub.inbox.recv().await {
                let op = req.subject.as_str().trim_start_matches(prefix.as_str());
                let op = op.to_string();
                let body: Value = serde_json::from_slice(&req.payload).unwrap_or(Value::Null);
                let replies = script(&op, &body);
                log.lock().unwrap().push(Received { op, body });

                let Some(reply_to) = req.reply else { continue };

                for reply in replies {
                    if !reply.delay.is_zero() {
                        tokio::time::sleep(reply.delay).await;
                    }
                    let mut msg = Message::new(reply_to.clone(), reply.payload);
                    for (name, value) in reply.headers {
                        msg = msg.with_header(name, value);
                    }
                    if service.publish(msg).await.is_err() {
                        break;
                    }
                }
            }
        });

        Self {
            hub,
            transport,
            received,
            task,
        }
    }

    /// A client for the same account on a transport of its own.
    pub async fn client(&self) -> ConnectClient {
        // ---
        let transport = create_memory_transport_with_hub(
            &ClientConfig::memory(ACCOUNT).with_transport_id("client"),
            self.hub.clone(),
        )
        .await
        .unwrap();
        ConnectClient::with_transport(transport, ACCOUNT)
    }

    /// A second transport on the hub, for publishing capture traffic.
    pub async fn agent(&self) -> TransportPtr {
        create_memory_transport_with_hub(
            &ClientConfig::memory(ACCOUNT).with_transport_id("agent"),
            self.hub.clone(),
        )
        .await
        .unwrap()
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }

    pub async fn shutdown(self) {
        // ---
        self.transport.close().await.unwrap();
        self.task.await.expect("fake service task panicked");
    }
}
