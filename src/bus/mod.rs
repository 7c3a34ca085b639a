//! Message bus adapter.
//!
//! The bus is Redis pub/sub. We SUBSCRIBE to `bus.my_channel`, where every
//! message is an inbound JSON envelope, and PUBLISH our own envelopes to
//! `bus.channel`.

mod client;

pub use client::{BusClient, BusLink, RECONNECT_DELAY, spawn_bus};

use crate::bridge::BusEnvelope;

/// Where the bridge sends envelopes. Never blocks.
pub trait BusPublisher: Send + Sync {
    fn publish(&self, envelope: BusEnvelope);
}
