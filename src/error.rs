//! Error types for the bot core.
//!
//! This module defines the protocol-level errors raised by the line codec,
//! the parse failures of the message grammar, the lookup failure of the tag
//! decoder, the configuration errors of the outbound rate limiter and the
//! failures of the rate-limited send path.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Transport-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// Line exceeded maximum allowed length.
    #[error("message too long: {actual} bytes (limit {limit})")]
    MessageTooLong {
        /// Length of the offending line in bytes.
        actual: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// Illegal control character in a line.
    #[error("illegal control character: {0:?}")]
    IllegalControlChar(char),
}

/// Errors encountered when parsing a wire line into a [`Message`](crate::Message).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty.
    #[error("empty message")]
    EmptyMessage,

    /// The line does not match the grammar (no command token, dangling
    /// tag block or prefix).
    #[error("malformed line at position {position}: {context}")]
    MalformedLine {
        /// Byte position where parsing failed.
        position: usize,
        /// What was being parsed when the failure occurred.
        context: &'static str,
    },
}

/// A tag key that was expected on a message is absent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("tag `{key}` not present")]
pub struct TagLookupMiss {
    /// The key that was looked up.
    pub key: String,
}

impl TagLookupMiss {
    pub(crate) fn new(key: &str) -> Self {
        Self {
            key: key.to_owned(),
        }
    }
}

/// Misconfiguration of the outbound token bucket.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum LimiterError {
    /// Capacity was zero or negative.
    #[error("token bucket capacity must be positive, got {0}")]
    InvalidCapacity(f64),

    /// Refill rate was zero or negative.
    #[error("token bucket refill rate must be positive, got {0}/s")]
    InvalidRefillRate(f64),

    /// An acquire asked for more tokens than the bucket can ever hold.
    #[error("cannot acquire {requested} tokens from a bucket of capacity {capacity}")]
    ExceedsCapacity {
        /// Tokens requested.
        requested: u32,
        /// Bucket capacity.
        capacity: f64,
    },
}

/// Failures of the rate-limited send path.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OutboundError {
    /// The writer side of the connection is gone.
    #[error("outbound channel closed")]
    Closed,

    /// The limiter refused the acquire.
    #[error(transparent)]
    Limiter(#[from] LimiterError),

    /// The line cannot be put on the wire.
    #[error("invalid outbound line: {0}")]
    Invalid(#[from] ProtocolError),
}
