//! Line framing and the [`Message`] codec.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::{self, ProtocolError};
use crate::message::Message;

/// Maximum length of an outgoing line, terminator included.
pub const MAX_IRC_LINE_LEN: usize = 512;

/// Maximum length of an incoming line. Servers may prepend up to 8191 bytes
/// of tags to a standard 512-byte line.
pub const MAX_INBOUND_LINE_LEN: usize = 8191 + MAX_IRC_LINE_LEN;

/// Control characters stripped from outgoing lines.
///
/// Formatting codes (bold, colour, CTCP delimiters and friends) pass through.
fn is_illegal_control_char(ch: char) -> bool {
    matches!(ch, '\x00' | '\x07' | '\x08' | '\x0b' | '\x0c' | '\x7f')
}

/// Splits a byte stream into `\n`-terminated lines.
///
/// Invalid UTF-8 is replaced rather than rejected so that one badly encoded
/// line from a remote user does not tear down the connection.
#[derive(Debug)]
pub struct LineCodec {
    next_index: usize,
    max_len: usize,
}

impl LineCodec {
    /// Codec with the given inbound line ceiling.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::with_max_len(MAX_INBOUND_LINE_LEN)
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            Ok(Some(String::from_utf8_lossy(&line).into_owned()))
        } else {
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        dst.extend_from_slice(line.as_bytes());
        if !line.ends_with('\n') {
            dst.extend_from_slice(b"\r\n");
        }
        Ok(())
    }
}

/// Tokio codec turning lines into [`Message`] values and back.
///
/// Lines that fail to parse are logged and skipped; a decode error from
/// `Framed` would otherwise end the stream.
#[derive(Debug, Default)]
pub struct IrcCodec {
    inner: LineCodec,
}

impl IrcCodec {
    /// Codec with the default inbound ceiling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare a serialized message for the wire.
    ///
    /// Anything after the first line break is dropped, illegal control
    /// characters are removed and the result is cut to fit
    /// [`MAX_IRC_LINE_LEN`] including the `\r\n` terminator.
    pub fn sanitize(mut data: String) -> String {
        if let Some(pos) = data.find(['\r', '\n']) {
            data.truncate(pos);
        }

        if data.contains(is_illegal_control_char) {
            data.retain(|ch| !is_illegal_control_char(ch));
        }

        let budget = MAX_IRC_LINE_LEN - 2;
        if data.len() > budget {
            let mut cut = budget;
            while !data.is_char_boundary(cut) {
                cut -= 1;
            }
            data.truncate(cut);
        }

        data.push_str("\r\n");
        data
    }
}

impl Decoder for IrcCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<Message>> {
        loop {
            let Some(line) = self.inner.decode(src)? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Message>() {
                Ok(msg) => return Ok(Some(msg)),
                Err(e) => warn!(error = %e, "skipping unparseable line"),
            }
        }
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> error::Result<()> {
        self.inner.encode(Self::sanitize(msg.to_string()), dst)
    }
}
