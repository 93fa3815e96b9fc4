//! Decoding errors.

use thiserror::Error;

/// Convenience alias for decoding results.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors produced while decoding TLV input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input ended before the element it declared.
    #[error("truncated input: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required to finish the element.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// An element of the wrong type appeared where a specific one is required.
    #[error("unexpected TLV type {actual:#x}, expected {expected:#x}")]
    UnexpectedType {
        /// Type the decoder was looking for.
        expected: u64,
        /// Type found on the wire.
        actual: u64,
    },

    /// A NonNegativeInteger with a length other than 1, 2, 4 or 8.
    #[error("invalid non-negative integer length {0}")]
    InvalidInteger(usize),

    /// A required field was absent.
    #[error("missing required field {0}")]
    MissingField(&'static str),

    /// A string field held bytes that are not UTF-8.
    #[error("field {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    /// A field was present but its value is not acceptable.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A name URI could not be parsed.
    #[error("invalid name URI {0:?}")]
    InvalidUri(String),

    /// Bytes remained after the outermost element.
    #[error("{0} trailing bytes after element")]
    TrailingBytes(usize),
}
