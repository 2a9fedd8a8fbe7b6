// src/protocol/mod.rs

//! Wire-level protocol details shared by the RPC client and capture.
//!
//! Everything the control service communicates out-of-band travels in
//! message headers; this module owns those names and their interpretation.

mod headers;

pub use headers::{
    //
    EVENT_TYPE_HEADER,
    HAS_MORE_HEADER,
    SERVICE_ERROR_CODE_HEADER,
    SERVICE_ERROR_HEADER,
};

pub(crate) use headers::{has_more, is_no_responders, is_null_payload, service_error};
