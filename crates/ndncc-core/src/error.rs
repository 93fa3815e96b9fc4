//! Error types for command encoding and transport.

use std::io;

use ndncc_proto::{DecodeError, ParameterField};
use thiserror::Error;

/// A command could not be built from the caller's arguments.
///
/// Surfaces to the immediate caller; never swallowed.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// A parameter the verb requires was not supplied.
    #[error("{module}/{verb} requires parameter {field}")]
    MissingField {
        /// Management module.
        module: String,
        /// Command verb.
        verb: String,
        /// The absent field.
        field: ParameterField,
    },

    /// A name argument did not parse.
    #[error("invalid name: {0}")]
    InvalidName(#[from] DecodeError),

    /// A face URI argument was unusable.
    #[error("invalid face URI {0:?}")]
    InvalidUri(String),
}

/// The transport to the forwarder failed.
///
/// Timeouts and Nacks are not errors; see
/// [`ExchangeOutcome`](crate::face::ExchangeOutcome).
#[derive(Debug, Error)]
pub enum FaceError {
    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The forwarder closed the connection.
    #[error("face closed by forwarder")]
    Closed,

    /// The forwarder sent an element larger than any valid packet.
    #[error("incoming element of {0} bytes exceeds packet size limit")]
    PacketTooLarge(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_display() {
        let err = EncodingError::MissingField {
            module: "faces".into(),
            verb: "create".into(),
            field: ParameterField::Uri,
        };
        assert_eq!(err.to_string(), "faces/create requires parameter uri");
    }

    #[test]
    fn face_error_from_io() {
        let err: FaceError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, FaceError::Io(_)));
        assert!(err.to_string().contains("pipe"));
    }
}
