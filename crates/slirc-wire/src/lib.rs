//! # slirc-wire
//!
//! The wire half of slirc-bridge: IRC line framing, message parsing and
//! serialization, and plain/TLS client transports.
//!
//! Nothing in here knows about channels, privileges or the bus. The bridge
//! turns [`Message`] values into its own event model and only ever talks to
//! the network through [`Transport`].
//!
//! ```rust
//! use slirc_wire::Message;
//!
//! let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.source_nickname(), Some("nick"));
//! assert_eq!(msg.params, vec!["#channel", "Hello!"]);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod codec;
pub mod error;
pub mod message;
pub mod prefix;
pub mod sasl;
pub mod transport;

pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower};
pub use self::codec::{IrcCodec, LineCodec, MAX_INBOUND_LINE_LEN, MAX_IRC_LINE_LEN};
pub use self::error::{MessageParseError, ProtocolError};
pub use self::message::Message;
pub use self::prefix::Prefix;
pub use self::sasl::{chunk_payload, encode_plain};
pub use self::transport::{framed, MessageSink, MessageStream, TlsOptions, Transport};
