//! slirc-bridge - relays IRC channels to a Redis pub/sub message bus and back.
//!
//! The lifecycle keeps one IRC connection alive, the privilege cache tracks
//! who holds `o`/`v` where, the bridge translates between chat and bus
//! envelopes, and the outbound lanes keep us under the server's flood limits.

pub mod app;
pub mod bridge;
pub mod bus;
pub mod config;
pub mod error;
pub mod irc;
pub mod lifecycle;
pub mod outbound;
pub mod settings;
pub mod shutdown;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::{App, open_settings};
pub use error::BridgeError;
pub use shutdown::Shutdown;
