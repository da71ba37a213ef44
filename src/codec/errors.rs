//! Codec errors

use thiserror::Error;

/// Failure raised by a binary codec.
///
/// Raised only for data that already passed shape validation, so it
/// signals a mismatch between the shape's leniency and the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("Invalid Avro schema: {0}")]
    InvalidSchema(String),

    #[error("Avro serialization failed: {0}")]
    Encode(String),

    #[error("Codec schema cache lock poisoned")]
    Poisoned,
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, SerializationError>;
