// src/transport/mod.rs

//! Transport implementations.
//!
//! This module provides concrete implementations of the domain-level
//! `Transport` trait. Bus clients other than the in-memory one are hidden
//! behind feature flags and exposed only through constructor functions.
//!
//! Domain code must not depend on transport-specific types.

mod memory;

#[cfg(feature = "transport_nats")]
mod nats;

pub use memory::{create_memory_transport, create_memory_transport_with_hub, MemoryHub};

#[cfg(feature = "transport_nats")]
pub use nats::create_nats_transport;
