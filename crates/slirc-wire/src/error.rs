//! Error types for framing and parsing.

use thiserror::Error;

/// Convenience alias for results carrying a [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors raised while reading, writing or framing IRC lines.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error on the underlying stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A received line exceeded the configured maximum length.
    #[error("message too long: {actual} bytes (limit {limit})")]
    MessageTooLong {
        /// Length of the offending line.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },

    /// A line could not be parsed into a [`crate::Message`].
    #[error("invalid message {string:?}: {cause}")]
    InvalidMessage {
        /// The raw line.
        string: String,
        /// Why parsing failed.
        #[source]
        cause: MessageParseError,
    },
}

/// Reasons a single line failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageParseError {
    /// The line was empty after trimming the terminator.
    #[error("empty message")]
    EmptyMessage,

    /// The command token was neither letters nor a three-digit numeric.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The prefix could not be split into a server or nick mask.
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// Parser failure with the byte offset where it stopped.
    #[error("parse error at position {position}: {context}")]
    ParseContext {
        /// Byte offset into the line.
        position: usize,
        /// Parser detail.
        context: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err: ProtocolError = io_err.into();
        assert!(matches!(err, ProtocolError::Io(_)));
        assert_eq!(err.to_string(), "io error: connection refused");
    }

    #[test]
    fn test_invalid_message_chains_cause() {
        let err = ProtocolError::InvalidMessage {
            string: "".to_string(),
            cause: MessageParseError::EmptyMessage,
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("empty message"));
    }
}
