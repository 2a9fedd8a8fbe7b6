// src/capture/runner.rs

//! Capture delivery loop.
//!
//! Glue between a bus subscription and a capture consumer. The runner:
//! - drives a receive loop over the subscription inbox on its own task
//! - drops messages with an empty payload
//! - dispatches every other message to the consumer
//! - logs consumer errors without ending the loop
//!
//! The loop owns the `SubscriptionHandle`, so the subscription lives exactly
//! as long as the task. Aborting the task drops the handle, which
//! unsubscribes.
//!
//! ### Error handling
//!
//! An error returned by [`MessageConsumer::handle_message`] concerns one
//! message only. It is logged at `warn` level and the next message is
//! processed normally; a single malformed record must never end a
//! long-lived capture. This also means a consumer has no way to report
//! failures back to whoever started the capture.

use tokio::task::JoinHandle;

use crate::macros::{log_debug, log_trace, log_warn};
use crate::{Message, Result, SubscriptionHandle};

/// A consumer of captured bus messages.
///
/// Implementations run on the capture task; they may be invoked while the
/// caller's own code is running concurrently, so any shared state they touch
/// needs its own synchronization.
pub(crate) trait MessageConsumer: Send + Sync + 'static {
    /// Handle a single message with a non-empty payload.
    fn handle_message(&self, msg: Message) -> Result<()>;
}

impl<F> MessageConsumer for F
where
    F: Fn(Message) -> Result<()> + Send + Sync + 'static,
{
    fn handle_message(&self, msg: Message) -> Result<()> {
        self(msg)
    }
}

/// Start the receive loop for `consumer` on a new task.
///
/// Returns immediately. The loop ends when the subscription closes (the
/// transport was closed) or when the returned task is aborted.
pub(crate) fn run<C>(mut handle: SubscriptionHandle, consumer: C) -> JoinHandle<()>
where
    C: MessageConsumer,
{
    // ---
    tokio::spawn(async move {
        // ---
        while let Some(msg) = handle.inbox.recv().await {
            if msg.payload.is_empty() {
                log_trace!("capture {}: dropping empty message", handle.subject);
                continue;
            }

            let _subject = msg.subject.clone();
            if let Err(_err) = consumer.handle_message(msg) {
                log_warn!(
                    "capture {}: dropping record from {_subject}: {_err}",
                    handle.subject
                );
            }
        }

        log_debug!("capture {}: subscription closed", handle.subject);
    })
}
