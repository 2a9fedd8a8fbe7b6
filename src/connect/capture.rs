// src/connect/capture.rs

use super::ConnectClient;
use crate::capture::{CaptureFilter, CaptureHandle};
use crate::model::{Captured, EventRecord, LogRecord, MetricsRecord};
use crate::Result;

impl ConnectClient {
    // ---
    /// Follow the logs of the instances matching `filter`.
    ///
    /// Returns once subscribed. Records that fail to decode are dropped.
    pub async fn capture_logs<F>(
        &self,
        filter: &CaptureFilter,
        on_record: F,
    ) -> Result<CaptureHandle>
    where
        F: Fn(Captured<LogRecord>) + Send + Sync + 'static,
    {
        self.rpc.capture_logs(filter, on_record).await
    }

    pub async fn capture_events<F>(
        &self,
        filter: &CaptureFilter,
        on_record: F,
    ) -> Result<CaptureHandle>
    where
        F: Fn(Captured<EventRecord>) + Send + Sync + 'static,
    {
        self.rpc.capture_events(filter, on_record).await
    }

    pub async fn capture_metrics<F>(
        &self,
        filter: &CaptureFilter,
        on_record: F,
    ) -> Result<CaptureHandle>
    where
        F: Fn(Captured<MetricsRecord>) + Send + Sync + 'static,
    {
        self.rpc.capture_metrics(filter, on_record).await
    }
}
