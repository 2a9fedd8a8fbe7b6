// src/capture/mod.rs

//! Live capture of connector logs, events and metrics.
//!
//! A capture subscribes to a (usually wildcard) capture subject and pushes
//! every inbound message to a caller-supplied handler on a background task.
//! It runs until the caller releases the returned [`CaptureHandle`].
//!
//! # Decode failures
//!
//! The typed captures ([`capture_logs`], [`capture_events`],
//! [`capture_metrics`]) decode each payload into a record before calling the
//! handler. A payload that fails to decode is logged and dropped; it never
//! reaches the handler and never ends the capture. Callers therefore cannot
//! observe that records were lost. This trades completeness for
//! availability of long-running captures and is a known gap.

mod runner;

use std::fmt;

use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::macros::log_debug;
use crate::model::{Captured, EventRecord, LogRecord, MetricsRecord};
use crate::protocol::EVENT_TYPE_HEADER;
use crate::subjects::{capture_subject, parse_capture_subject};
use crate::{ConnectError, Message, Result, Subject, TransportPtr};

/// Kind of capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    Logs,
    Events,
    Metrics,
}

impl CaptureKind {
    /// Subject token for this kind.
    pub fn as_token(&self) -> &'static str {
        match self {
            CaptureKind::Logs => "LOGS",
            CaptureKind::Events => "EVENTS",
            CaptureKind::Metrics => "METRICS",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "LOGS" => Some(CaptureKind::Logs),
            "EVENTS" => Some(CaptureKind::Events),
            "METRICS" => Some(CaptureKind::Metrics),
            _ => None,
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Which connectors, deployments and instances to capture.
///
/// Unset (or empty) fields match anything.
///
/// ```
/// # use connect_client::CaptureFilter;
/// let all_instances_of_c1 = CaptureFilter::connector("c1");
/// let one_instance = CaptureFilter::default().instance("i-42");
/// # let _ = (all_instances_of_c1, one_instance);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureFilter {
    pub connector_id: Option<String>,
    pub deployment_id: Option<String>,
    pub instance_id: Option<String>,
}

impl CaptureFilter {
    /// Everything from one connector.
    pub fn connector(id: impl Into<String>) -> Self {
        Self {
            connector_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn deployment(mut self, id: impl Into<String>) -> Self {
        self.deployment_id = Some(id.into());
        self
    }

    pub fn instance(mut self, id: impl Into<String>) -> Self {
        self.instance_id = Some(id.into());
        self
    }
}

/// The connector, deployment and instance a captured message came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CaptureSource {
    pub connector_id: String,
    pub deployment_id: String,
    pub instance_id: String,
}

/// Live capture subscription.
///
/// Owned by the caller. Delivery continues until [`stop`](Self::stop) is
/// called or the handle is dropped; either one stops further handler calls
/// and releases the bus subscription, but a handler call already in
/// progress always runs to completion. The handle does not keep the
/// transport alive for any other purpose and the transport does not keep
/// the capture alive: closing the transport ends the capture.
pub struct CaptureHandle {
    // ---
    subject: Subject,
    task: Option<JoinHandle<()>>,
}

impl CaptureHandle {
    /// Subject (with wildcards) this capture listens on.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// False once the capture has been stopped or its subscription closed.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop delivery and wait for the delivery task to wind down.
    pub async fn stop(mut self) {
        // ---
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            log_debug!("capture {}: stopped", self.subject);
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl fmt::Debug for CaptureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureHandle")
            .field("subject", &self.subject)
            .field("active", &self.is_active())
            .finish()
    }
}

async fn start<C>(
    transport: &TransportPtr,
    account: &str,
    kind: CaptureKind,
    filter: &CaptureFilter,
    consumer: C,
) -> Result<CaptureHandle>
where
    C: runner::MessageConsumer,
{
    // ---
    let subject = capture_subject(kind, account, filter);
    let subscription = transport.subscribe(subject.clone()).await?;

    log_debug!("capture {subject}: started");

    Ok(CaptureHandle {
        subject,
        task: Some(runner::run(subscription, consumer)),
    })
}

/// Subscribe to raw capture messages of `kind` matching `filter`.
///
/// Returns as soon as the subscription is established; `on_message` is then
/// invoked once per inbound message with a non-empty payload, on a task
/// owned by the capture. Subscription failures are returned here; there is
/// no error channel after that.
pub async fn capture<F>(
    transport: &TransportPtr,
    account: &str,
    kind: CaptureKind,
    filter: &CaptureFilter,
    on_message: F,
) -> Result<CaptureHandle>
where
    F: Fn(Message) + Send + Sync + 'static,
{
    // ---
    start(transport, account, kind, filter, move |msg: Message| -> Result<()> {
        on_message(msg);
        Ok(())
    })
    .await
}

fn source_of(msg: &Message) -> CaptureSource {
    parse_capture_subject(&msg.subject).unwrap_or_default()
}

fn decode_json<T: DeserializeOwned>(msg: &Message) -> Result<T> {
    serde_json::from_slice(&msg.payload)
        .map_err(ConnectError::Decode)
}

async fn capture_decoded<T, D, F>(
    transport: &TransportPtr,
    account: &str,
    kind: CaptureKind,
    filter: &CaptureFilter,
    decode: D,
    on_record: F,
) -> Result<CaptureHandle>
where
    T: Send + 'static,
    D: Fn(&Message) -> Result<T> + Send + Sync + 'static,
    F: Fn(Captured<T>) + Send + Sync + 'static,
{
    // ---
    start(transport, account, kind, filter, move |msg: Message| -> Result<()> {
        let record = decode(&msg)?;
        on_record(Captured {
            source: source_of(&msg),
            record,
        });
        Ok(())
    })
    .await
}

/// Capture log lines. Undecodable records are dropped.
pub async fn capture_logs<F>(
    transport: &TransportPtr,
    account: &str,
    filter: &CaptureFilter,
    on_record: F,
) -> Result<CaptureHandle>
where
    F: Fn(Captured<LogRecord>) + Send + Sync + 'static,
{
    let kind = CaptureKind::Logs;
    capture_decoded(transport, account, kind, filter, decode_json, on_record)
        .await
}

/// Capture lifecycle events.
///
/// The event type is taken from the event-type header, not from the body.
/// Undecodable records are dropped.
pub async fn capture_events<F>(
    transport: &TransportPtr,
    account: &str,
    filter: &CaptureFilter,
    on_record: F,
) -> Result<CaptureHandle>
where
    F: Fn(Captured<EventRecord>) + Send + Sync + 'static,
{
    // ---
    let decode = |msg: &Message| -> Result<EventRecord> {
        Ok(EventRecord {
            event_type: msg.header(EVENT_TYPE_HEADER).map(str::to_string),
            data: decode_json(msg)?,
        })
    };

    let kind = CaptureKind::Events;
    capture_decoded(transport, account, kind, filter, decode, on_record)
        .await
}

/// Capture metrics samples. Undecodable records are dropped.
pub async fn capture_metrics<F>(
    transport: &TransportPtr,
    account: &str,
    filter: &CaptureFilter,
    on_record: F,
) -> Result<CaptureHandle>
where
    F: Fn(Captured<MetricsRecord>) + Send + Sync + 'static,
{
    let kind = CaptureKind::Metrics;
    capture_decoded(transport, account, kind, filter, decode_json, on_record)
        .await
}
