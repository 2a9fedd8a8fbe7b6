// src/model/capture.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capture::CaptureSource;

/// A captured record together with the instance that emitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct Captured<T> {
    pub source: CaptureSource,
    pub record: T,
}

/// One log line of a connector instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,

    #[serde(default)]
    pub level: String,

    pub text: String,
}

/// A lifecycle event of a connector instance.
///
/// `event_type` travels in a message header; `data` is the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event_type: Option<String>,
    pub data: serde_json::Value,
}

/// A metrics sample of a connector instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub timestamp: String,

    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}
