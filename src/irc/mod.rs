//! Adapter between the wire crate and the lifecycle.
//!
//! Inbound traffic becomes [`Event`] values dispatched over a closed
//! [`EventKind`]; outbound traffic goes through [`IrcActions`].

mod actions;
mod connector;
mod event;

pub use actions::{ClientHandle, IrcActions};
pub use connector::{Connector, Session, TcpConnector, spawn_session};
pub use event::{Event, EventKind, Source};
