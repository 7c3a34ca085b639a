//! Outbound rate governor.
//!
//! Two bounded lanes feed the same send primitive. The restricted lane runs
//! the configured [`RatePolicy`]; the unrestricted lane is used when the bot
//! holds `o` or `v` on the destination and sends as fast as it can. Each lane
//! has exactly one consumer, so items leave in arrival order.

mod envelope;
mod lanes;
mod policy;

pub use envelope::{Display, OutboundEnvelope};
pub use lanes::{
    Lane, Lanes, Outbound, RESTRICTED_CAPACITY, UNRESTRICTED_CAPACITY, deliver, spawn_lanes,
};
pub use policy::{RateBucket, RatePolicy, Throttle};
