//! Client error type.

use ndncc_core::{EncodingError, FaceError};
use thiserror::Error;

/// Failure of a high-level operation.
///
/// A forwarder that does not answer, or answers with something undecodable,
/// is not an error: operations return `Ok(None)` for that. These variants
/// cover the caller's own mistakes and a broken connection.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The command could not be built from the arguments.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The connection to the forwarder failed.
    #[error(transparent)]
    Face(#[from] FaceError),
}

impl From<ndncc_proto::DecodeError> for ClientError {
    fn from(err: ndncc_proto::DecodeError) -> Self {
        Self::Encoding(EncodingError::InvalidName(err))
    }
}
