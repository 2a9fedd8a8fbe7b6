// src/domain/mod.rs

//! Domain layer public interface.
//!
//! This module defines bus-level abstractions that are independent of any
//! concrete message-bus client library.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod transport;

// --- Transport domain re-exports ---

pub use transport::{
    //
    Headers,
    Message,
    Subject,
    SubscriptionHandle,
    Transport,
    TransportBase,
    TransportPtr,
    INBOX_PREFIX,
};
