// src/client/cursor.rs

use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::{check_reply, next_reply};
use crate::macros::log_trace;
use crate::protocol::{has_more, is_null_payload};
use crate::{ConnectError, Result, Subject, SubscriptionHandle};

/// One reply of a streamed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorItem {
    /// Raw element bytes; `None` for the empty-slot sentinel.
    pub item: Option<Bytes>,

    /// False on the terminal reply.
    pub has_more: bool,
}

impl CursorItem {
    /// Decode the element, keeping the empty slot as `None`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        // ---
        self.item
            .as_deref()
            .map(serde_json::from_slice)
            .transpose()
            .map_err(ConnectError::Decode)
    }
}

/// Pull-based reader over the replies of one streamed listing.
///
/// Returned by [`RpcClient::open_list`](super::RpcClient::open_list). Each
/// [`next`](Self::next) waits at most one timeout window for the next reply.
/// The stream yields every reply up to and including the terminal one (the
/// first with `has_more == false`) and then returns `Ok(None)`.
///
/// An error ends the stream: later calls return `Ok(None)`. Dropping the
/// stream releases the reply inbox; any replies still in flight are
/// discarded.
pub struct ReplyStream {
    // ---
    subscription: SubscriptionHandle,
    timeout: Duration,
    finished: bool,
    received: usize,
}

impl ReplyStream {
    pub(crate) fn new(subscription: SubscriptionHandle, timeout: Duration) -> Self {
        Self {
            subscription,
            timeout,
            finished: false,
            received: 0,
        }
    }

    /// Inbox subject the replies arrive on.
    pub fn inbox(&self) -> &Subject {
        &self.subscription.subject
    }

    /// True once the terminal reply was yielded or an error was returned.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Next reply, or `Ok(None)` once the stream has ended.
    ///
    /// # Errors
    ///
    /// - `ConnectError::Timeout` if no reply arrives within the window
    /// - `ConnectError::Service` if the reply carries a service error
    /// - `ConnectError::Transport` if the inbox closes or the bus reports
    ///   no responders
    pub async fn next(&mut self) -> Result<Option<CursorItem>> {
        // ---
        if self.finished {
            return Ok(None);
        }

        let reply = next_reply(&mut self.subscription, self.timeout)
            .await
            .and_then(|msg| check_reply(&msg).map(|()| msg));

        let msg = match reply {
            Ok(msg) => msg,
            Err(err) => {
                self.finished = true;
                return Err(err);
            }
        };

        self.received += 1;
        let has_more = has_more(&msg);
        if !has_more {
            self.finished = true;
        }

        log_trace!(
            "{}: reply {} ({} bytes, has_more={has_more})",
            self.subscription.subject,
            self.received,
            msg.payload.len()
        );

        let item = (!is_null_payload(&msg.payload)).then_some(msg.payload);
        Ok(Some(CursorItem { item, has_more }))
    }

    /// Like [`next`](Self::next), decoding the element into `T`.
    ///
    /// A decode failure ends the stream with `ConnectError::Decode`.
    pub async fn next_json<T: DeserializeOwned>(&mut self) -> Result<Option<(Option<T>, bool)>> {
        // ---
        let Some(cursor) = self.next().await? else {
            return Ok(None);
        };

        match cursor.decode() {
            Ok(item) => Ok(Some((item, cursor.has_more))),
            Err(err) => {
                self.finished = true;
                Err(err)
            }
        }
    }

    /// Drain the stream into a vector, skipping empty slots.
    pub async fn collect_json<T: DeserializeOwned>(mut self) -> Result<Vec<T>> {
        // ---
        let mut items = Vec::new();
        while let Some((item, _)) = self.next_json().await? {
            items.extend(item);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_decode_keeps_empty_slot() {
        // ---
        let cursor = CursorItem {
            item: None,
            has_more: false,
        };
        assert_eq!(cursor.decode::<u32>().unwrap(), None);

        let cursor = CursorItem {
            item: Some(Bytes::from_static(b"7")),
            has_more: true,
        };
        assert_eq!(cursor.decode::<u32>().unwrap(), Some(7));
    }

    #[test]
    fn test_decode_failure_is_decode_error() {
        // ---
        let cursor = CursorItem {
            item: Some(Bytes::from_static(b"{not json")),
            has_more: true,
        };
        let err = cursor.decode::<u32>().unwrap_err();
        assert!(matches!(err, ConnectError::Decode(_)));
    }
}
