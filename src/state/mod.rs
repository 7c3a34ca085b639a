//! Shared state rebuilt from protocol traffic.
//!
//! Contains the privilege cache and the per-connection session record.

mod privilege;
mod session;

pub use privilege::{ModeFlags, OP, PrivilegeCache, VOICE};
pub use session::{AnnouncedModes, ConnectionState, Status};
