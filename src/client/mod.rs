// src/client/mod.rs

//! Request/reply client.
//!
//! [`RpcClient`] performs the two call shapes of the control service:
//!
//! - a single request answered by exactly one reply ([`RpcClient::request`]);
//! - a streamed listing answered by a sequence of replies, each carrying a
//!   has-more flag ([`RpcClient::request_list`], [`RpcClient::open_list`]).
//!
//! # Reply inboxes
//!
//! Every call subscribes a private `_INBOX.<id>` subject *before* the request
//! is published, so no reply can arrive ahead of the listener. The request
//! is then published with the inbox as its reply subject and the transport
//! is flushed. The inbox subscription lives exactly as long as the call (or
//! the [`ReplyStream`]).
//!
//! # Timeouts
//!
//! [`RequestOptions::timeout`] bounds sending the request (inbox subscribe,
//! publish and flush together) and each receive. A streamed listing whose
//! replies keep arriving within the window may run for longer than one
//! window in total; a stall between two replies fails with
//! [`ConnectError::Timeout`].
//!
//! The client never retries. See [`retry_with_backoff`](crate::retry_with_backoff)
//! for an opt-in layer.

mod cursor;

pub use cursor::{CursorItem, ReplyStream};

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time;

use crate::capture::{self, CaptureFilter, CaptureHandle, CaptureKind};
use crate::macros::{log_debug, log_trace};
use crate::model::{Captured, EventRecord, LogRecord, MetricsRecord};
use crate::protocol::{is_no_responders, service_error};
use crate::{
    // ---
    ConnectError,
    Message,
    RequestOptions,
    Result,
    Subject,
    SubscriptionHandle,
    TransportPtr,
};

/// Request/reply client bound to one account.
///
/// Cheap to clone (internally `Arc`-backed). Any number of calls may be in
/// flight at once; each owns its own reply inbox.
#[derive(Clone)]
pub struct RpcClient {
    inner: Arc<Inner>,
}

struct Inner {
    // ---
    transport: TransportPtr,
    account: Arc<str>,
}

impl RpcClient {
    // ---
    /// Bind a client to an already connected transport and an account.
    ///
    /// The account is fixed for the lifetime of the client.
    pub fn new(transport: TransportPtr, account: impl Into<Arc<str>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                account: account.into(),
            }),
        }
    }

    pub fn account(&self) -> &str {
        &self.inner.account
    }

    pub fn transport(&self) -> &TransportPtr {
        &self.inner.transport
    }

    /// Send one request and wait for its reply.
    ///
    /// Returns the raw reply payload; decoding is left to the caller.
    ///
    /// # Errors
    ///
    /// - `ConnectError::Encode` if `req` cannot be serialized
    /// - `ConnectError::InvalidSubject` if `subject` contains wildcards
    /// - `ConnectError::Timeout` if the request cannot be sent, or no reply
    ///   arrives, within `opts.timeout`
    /// - `ConnectError::Service` if the reply carries a service error; the
    ///   body is not returned in that case
    /// - `ConnectError::Transport` for bus failures, including "no responders"
    pub async fn request<Req>(
        &self,
        subject: &Subject,
        req: &Req,
        opts: RequestOptions,
    ) -> Result<Bytes>
    where
        Req: Serialize + ?Sized,
    {
        // ---
        let mut inbox = self.send(subject, req, opts).await?;

        let reply = next_reply(&mut inbox, opts.timeout).await?;
        check_reply(&reply)?;

        log_trace!("{subject}: reply ({} bytes)", reply.payload.len());
        Ok(reply.payload)
    }

    /// [`request`](Self::request) followed by decoding the reply into `Resp`.
    ///
    /// # Errors
    ///
    /// As [`request`](Self::request), plus `ConnectError::Decode` if the
    /// reply body is not a valid `Resp`.
    pub async fn request_json<Req, Resp>(
        &self,
        subject: &Subject,
        req: &Req,
        opts: RequestOptions,
    ) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = self.request(subject, req, opts).await?;
        serde_json::from_slice(&payload).map_err(ConnectError::Decode)
    }

    /// Start a streamed listing and return a reader over its replies.
    ///
    /// Returns once the request has been published and flushed; replies are
    /// read with [`ReplyStream::next`].
    pub async fn open_list<Req>(
        &self,
        subject: &Subject,
        req: &Req,
        opts: RequestOptions,
    ) -> Result<ReplyStream>
    where
        Req: Serialize + ?Sized,
    {
        let inbox = self.send(subject, req, opts).await?;
        Ok(ReplyStream::new(inbox, opts.timeout))
    }

    /// Run a streamed listing, calling `handler` once per reply.
    ///
    /// `handler` receives the raw element (`None` for the empty slot) and
    /// the has-more flag. It is called in reply order, and exactly once with
    /// `has_more == false` when the stream completes, including for an empty
    /// result. An error returned by `handler` stops the stream and is
    /// returned unchanged.
    pub async fn request_list<Req, F>(
        &self,
        subject: &Subject,
        req: &Req,
        opts: RequestOptions,
        mut handler: F,
    ) -> Result<()>
    where
        Req: Serialize + ?Sized,
        F: FnMut(Option<Bytes>, bool) -> Result<()>,
    {
        // ---
        let mut stream = self.open_list(subject, req, opts).await?;

        while let Some(CursorItem { item, has_more }) = stream.next().await? {
            handler(item, has_more)?;
        }

        Ok(())
    }

    /// [`request_list`](Self::request_list) with each element decoded into `T`.
    ///
    /// A decode failure stops the stream with `ConnectError::Decode`.
    pub async fn request_list_json<Req, T, F>(
        &self,
        subject: &Subject,
        req: &Req,
        opts: RequestOptions,
        mut handler: F,
    ) -> Result<()>
    where
        Req: Serialize + ?Sized,
        T: DeserializeOwned,
        F: FnMut(Option<T>, bool) -> Result<()>,
    {
        // ---
        let mut stream = self.open_list(subject, req, opts).await?;

        while let Some((item, has_more)) = stream.next_json().await? {
            handler(item, has_more)?;
        }

        Ok(())
    }

    /// Raw capture bound to this client's account and transport.
    pub async fn capture<F>(
        &self,
        kind: CaptureKind,
        filter: &CaptureFilter,
        on_message: F,
    ) -> Result<CaptureHandle>
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        capture::capture(self.transport(), self.account(), kind, filter, on_message)
            .await
    }

    pub async fn capture_logs<F>(
        &self,
        filter: &CaptureFilter,
        on_record: F,
    ) -> Result<CaptureHandle>
    where
        F: Fn(Captured<LogRecord>) + Send + Sync + 'static,
    {
        capture::capture_logs(self.transport(), self.account(), filter, on_record)
            .await
    }

    pub async fn capture_events<F>(
        &self,
        filter: &CaptureFilter,
        on_record: F,
    ) -> Result<CaptureHandle>
    where
        F: Fn(Captured<EventRecord>) + Send + Sync + 'static,
    {
        capture::capture_events(self.transport(), self.account(), filter, on_record)
            .await
    }

    pub async fn capture_metrics<F>(
        &self,
        filter: &CaptureFilter,
        on_record: F,
    ) -> Result<CaptureHandle>
    where
        F: Fn(Captured<MetricsRecord>) + Send + Sync + 'static,
    {
        capture::capture_metrics(self.transport(), self.account(), filter, on_record)
            .await
    }

    /// Encode, subscribe the reply inbox, publish and flush.
    ///
    /// The bus work is bounded by `opts.timeout` as a whole.
    async fn send<Req>(
        &self,
        subject: &Subject,
        req: &Req,
        opts: RequestOptions,
    ) -> Result<SubscriptionHandle>
    where
        Req: Serialize + ?Sized,
    {
        // ---
        let payload = serde_json::to_vec(req).map_err(ConnectError::Encode)?;
        subject.ensure_publishable()?;

        let msg = Message::new(subject.clone(), Bytes::from(payload));

        match time::timeout(opts.timeout, self.deliver(msg)).await {
            Ok(result) => result,
            Err(_) => {
                log_debug!("{subject}: send timed out after {:?}", opts.timeout);
                Err(ConnectError::Timeout)
            }
        }
    }

    async fn deliver(&self, msg: Message) -> Result<SubscriptionHandle> {
        // ---
        let transport = &self.inner.transport;
        let inbox = transport.subscribe(transport.new_inbox()).await?;

        log_debug!("{}: request, reply to {}", msg.subject, inbox.subject);

        let msg = msg.with_reply(inbox.subject.clone());
        transport.publish(msg).await?;
        transport.flush().await?;

        Ok(inbox)
    }
}

/// Wait at most `timeout` for the next message on a reply inbox.
pub(crate) async fn next_reply(
    inbox: &mut SubscriptionHandle,
    timeout: Duration,
) -> Result<Message> {
    // ---
    match time::timeout(timeout, inbox.inbox.recv()).await {
        Ok(Some(msg)) => Ok(msg),
        Ok(None) => {
            let reason = format!("reply inbox {} closed", inbox.subject);
            Err(ConnectError::Transport(reason))
        }
        Err(_) => Err(ConnectError::Timeout),
    }
}

/// Reject bus-level and service-level failures carried by a reply.
pub(crate) fn check_reply(reply: &Message) -> Result<()> {
    // ---
    if is_no_responders(reply) {
        let reason = "no responders on request subject".to_string();
        return Err(ConnectError::Transport(reason));
    }

    match service_error(reply) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
