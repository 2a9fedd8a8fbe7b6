// src/transport/nats.rs

//! NATS transport implementation using `async-nats`.
//!
//! One transport instance corresponds to a single, already-authenticated
//! server connection. Credentials are the launcher's business; this module
//! only connects to the configured URI.
//!
//! ## Message delivery
//!
//! Each `subscribe()` creates a NATS subscriber and a forwarding task that
//! moves messages into the `SubscriptionHandle` inbox. The task ends, and
//! unsubscribes on the server, when the handle is dropped, the server side
//! of the subscription closes or the transport is closed. Closing the
//! transport therefore ends every open inbox, including those of captures.
//!
//! ## Errors
//!
//! Every failure reported by the NATS client (connect, publish, subscribe,
//! flush) surfaces as `ConnectError::Transport`.
//!
//! Bus headers are converted one-to-one; when a header carries several
//! values only the first one is kept.

use std::fmt::Display;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};

use crate::macros::{log_debug, log_error, log_trace};
use crate::{
    // ---
    ClientConfig,
    ConnectError,
    Headers,
    Message,
    Result,
    Subject,
    SubscriptionHandle,
    Transport,
    TransportBase,
    TransportPtr,
};

const INBOX_CAPACITY: usize = 256;

struct NatsTransport {
    // ---
    base: TransportBase,
    client: async_nats::Client,
    shutdown_tx: watch::Sender<bool>,
}

impl NatsTransport {
    fn ensure_open(&self) -> Result<()> {
        // ---
        if *self.shutdown_tx.borrow() {
            return Err(ConnectError::Transport(format!(
                "{}: transport closed",
                self.transport_id()
            )));
        }
        Ok(())
    }
}

fn bus_error(context: impl Display, err: impl Display) -> ConnectError {
    ConnectError::Transport(format!("{context}: {err}"))
}

fn to_nats_headers(headers: &Headers) -> async_nats::HeaderMap {
    // ---
    let mut map = async_nats::HeaderMap::new();
    for (name, value) in headers.iter() {
        map.insert(name, value);
    }
    map
}

fn from_nats_message(msg: async_nats::Message) -> Message {
    // ---
    let mut headers = Headers::new();
    if let Some(map) = &msg.headers {
        for (name, values) in map.iter() {
            if let Some(value) = values.first() {
                headers.insert(name.to_string(), value.as_str());
            }
        }
    }

    Message {
        subject: Subject::from(msg.subject.as_str()),
        reply: msg.reply.as_ref().map(|r| Subject::from(r.as_str())),
        headers,
        payload: msg.payload,
        status: msg.status.map(|s| s.as_u16()),
    }
}

#[async_trait::async_trait]
impl Transport for NatsTransport {
    // ---
    fn base(&self) -> &TransportBase {
        &self.base
    }

    fn new_inbox(&self) -> Subject {
        Subject::from(self.client.new_inbox())
    }

    async fn publish(&self, msg: Message) -> Result<()> {
        // ---
        self.ensure_open()?;
        msg.subject.ensure_publishable()?;

        let subject = msg.subject.to_string();
        let headers = to_nats_headers(&msg.headers);

        let result = match msg.reply {
            Some(reply) => {
                let reply = reply.to_string();
                self.client
                    .publish_with_reply_and_headers(subject, reply, headers, msg.payload)
                    .await
            }
            None => {
                self.client
                    .publish_with_headers(subject, headers, msg.payload)
                    .await
            }
        };

        result.map_err(|e| bus_error(format!("publish to {}", msg.subject), e))
    }

    async fn subscribe(&self, subject: Subject) -> Result<SubscriptionHandle> {
        // ---
        self.ensure_open()?;
        log_debug!("{}: subscribe to {subject}", self.transport_id());

        let mut subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| bus_error(format!("subscribe to {subject}"), e))?;

        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let transport_id = self.transport_id().to_string();
        let pattern = subject.clone();

        tokio::spawn(async move {
            // ---
            forward(&mut subscriber, from_nats_message, tx, shutdown_rx).await;

            if let Err(_err) = subscriber.unsubscribe().await {
                log_trace!("{transport_id}: unsubscribe from {pattern} failed: {_err}");
            }
            log_debug!("{transport_id}: subscription to {pattern} ended");
        });

        Ok(SubscriptionHandle { subject, inbox: rx })
    }

    async fn flush(&self) -> Result<()> {
        // ---
        self.ensure_open()?;
        self.client
            .flush()
            .await
            .map_err(|e| bus_error("flush failed", e))
    }

    async fn close(&self) -> Result<()> {
        // ---
        log_debug!("{}: closing transport", self.transport_id());

        // Wakes every forwarding task, which drops its inbox sender.
        if self.shutdown_tx.send_replace(true) {
            return Ok(());
        }
        self.client
            .flush()
            .await
            .map_err(|e| bus_error("flush on close failed", e))
    }
}

/// Connect to a NATS server and wrap the connection as a transport.
///
/// # Errors
///
/// Returns `MissingConfig` if no URI is configured and `Transport` if the
/// connection cannot be established.
pub async fn create_nats_transport(config: &ClientConfig) -> Result<TransportPtr> {
    // ---
    let uri = config
        .transport_uri
        .as_deref()
        .ok_or_else(|| ConnectError::MissingConfig("transport_uri".into()))?;

    log_debug!("{}: connecting to {uri}", config.transport_id);

    let client = async_nats::ConnectOptions::new()
        .name(config.transport_id.clone())
        .connect(uri)
        .await
        .map_err(|e| {
            log_error!("{}: connection to {uri} failed: {e}", config.transport_id);
            bus_error(format!("connect to {uri}"), e)
        })?;

    let (shutdown_tx, _shutdown_rx) = watch::channel(false);

    Ok(Arc::new(NatsTransport {
        base: TransportBase::new(config.transport_id.clone()),
        client,
        shutdown_tx,
    }))
}

/// Move messages from `source` into an inbox until the inbox is dropped,
/// the source ends or shutdown is signalled.
async fn forward<S, T, F>(
    source: &mut S,
    convert: F,
    tx: mpsc::Sender<Message>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    S: Stream<Item = T> + Unpin,
    F: Fn(T) -> Message,
{
    // ---
    if *shutdown_rx.borrow_and_update() {
        return;
    }

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            _ = tx.closed() => break,
            next = source.next() => match next {
                Some(item) => {
                    if tx.send(convert(item)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use bytes::Bytes;
    use futures::channel::mpsc as source_channel;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(1);

    fn msg(body: &'static [u8]) -> Message {
        Message::new("$CONNECT.acct.LOGS.x", Bytes::from_static(body))
    }

    #[tokio::test]
    async fn test_forward_ends_inbox_on_shutdown() {
        // ---
        let (source_tx, mut source_rx) = source_channel::unbounded::<Message>();
        let (tx, mut rx) = mpsc::channel(INBOX_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            forward(&mut source_rx, |m| m, tx, shutdown_rx).await;
        });

        source_tx.unbounded_send(msg(b"one")).unwrap();
        let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.payload, Bytes::from_static(b"one"));

        shutdown_tx.send_replace(true);
        timeout(WAIT, task).await.unwrap().unwrap();

        // Still open on the source side, but nothing reaches the inbox.
        let _ = source_tx.unbounded_send(msg(b"two"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_forward_after_shutdown_delivers_nothing() {
        // ---
        let (source_tx, mut source_rx) = source_channel::unbounded::<Message>();
        let (tx, mut rx) = mpsc::channel(INBOX_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send_replace(true);

        source_tx.unbounded_send(msg(b"late")).unwrap();
        forward(&mut source_rx, |m| m, tx, shutdown_rx).await;

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_forward_stops_when_inbox_dropped() {
        // ---
        let (_source_tx, mut source_rx) = source_channel::unbounded::<Message>();
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        drop(rx);
        timeout(WAIT, forward(&mut source_rx, |m| m, tx, shutdown_rx))
            .await
            .expect("forwarding outlived its inbox");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // ---
        let config = ClientConfig::with_server("nats://127.0.0.1:1", "acct");
        let err = match create_nats_transport(&config).await {
            Ok(_) => panic!("connected to a closed port"),
            Err(err) => err,
        };
        assert!(matches!(err, ConnectError::Transport(_)), "got {err:?}");
    }
}
