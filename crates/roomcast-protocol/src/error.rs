//! Error types for the protocol layer.

/// A frame that could not be encoded or decoded.
///
/// Never fatal to a connection: the caller logs it and drops that one
/// frame. Decoding never yields a partial [`Message`](crate::Message).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The buffer ended before a length prefix could be read.
    #[error("truncated frame: {field} length needs {needed} bytes, {remaining} remain")]
    Truncated {
        /// Field whose length prefix was being read.
        field: &'static str,
        /// Bytes required for the prefix.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// A length prefix declares more bytes than the buffer holds.
    #[error("{field} declares {declared} bytes but only {remaining} remain")]
    LengthOverflow {
        /// Field whose body was being read.
        field: &'static str,
        /// Declared length.
        declared: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// Bytes remain after the last field.
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    /// A string field is not valid UTF-8.
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    /// A field is too long for its 32-bit length prefix.
    #[error("{field} is {len} bytes, which does not fit a 32-bit length")]
    FieldTooLong {
        /// Offending field.
        field: &'static str,
        /// Its length in bytes.
        len: usize,
    },

    /// A field that must be non-empty on inbound frames is empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// The frame exceeds the configured maximum size.
    #[error("frame of {size} bytes exceeds maximum of {max}")]
    TooLarge {
        /// Frame size in bytes.
        size: usize,
        /// Configured maximum.
        max: usize,
    },
}
