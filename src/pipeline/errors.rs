//! Caller-facing pipeline errors
//!
//! Exactly two failure kinds reach the caller: the input (or the schema
//! it names) was rejected before encoding, or the codec refused data
//! that had already passed validation.

use thiserror::Error;

use crate::codec::SerializationError;
use crate::schema::SchemaError;

/// Coarse classification of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SchemaValidation,
    Serialization,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SchemaValidation => "SchemaValidation",
            ErrorKind::Serialization => "Serialization",
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unknown schema, unsupported or malformed definition, or data
    /// that does not conform. Raised before the codec is invoked.
    #[error(transparent)]
    SchemaValidation(#[from] SchemaError),

    /// The codec refused validated data
    #[error("Encoding against schema {schema_id} v{schema_version} failed: {source}")]
    Serialization {
        schema_id: String,
        schema_version: u32,
        #[source]
        source: SerializationError,
    },
}

impl PipelineError {
    /// Wraps a codec failure with the schema it was encoding against
    pub fn serialization(
        schema_id: impl Into<String>,
        schema_version: u32,
        source: SerializationError,
    ) -> Self {
        PipelineError::Serialization {
            schema_id: schema_id.into(),
            schema_version,
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::SchemaValidation(_) => ErrorKind::SchemaValidation,
            PipelineError::Serialization { .. } => ErrorKind::Serialization,
        }
    }

    /// Distinguishes an unregistered schema from other rejections
    pub fn is_schema_not_found(&self) -> bool {
        match self {
            PipelineError::SchemaValidation(err) => err.is_not_found(),
            PipelineError::Serialization { .. } => false,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::SchemaValidation(err) => err.code().code(),
            PipelineError::Serialization { .. } => "AVRO_SERIALIZATION_FAILED",
        }
    }

    pub fn as_schema_error(&self) -> Option<&SchemaError> {
        match self {
            PipelineError::SchemaValidation(err) => Some(err),
            PipelineError::Serialization { .. } => None,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaErrorCode, ValidationDetails};

    #[test]
    fn test_not_found_is_schema_validation_kind() {
        let err = PipelineError::from(SchemaError::not_found("orders", 3));
        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
        assert!(err.is_schema_not_found());
        assert_eq!(err.code(), "AVRO_SCHEMA_NOT_FOUND");
    }

    #[test]
    fn test_validation_failure_is_not_not_found() {
        let details = ValidationDetails::missing_field("value");
        let err = PipelineError::from(SchemaError::validation_failed(details));
        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
        assert!(!err.is_schema_not_found());
        assert_eq!(
            err.as_schema_error().map(|e| e.code()),
            Some(SchemaErrorCode::AvroSchemaValidationFailed)
        );
    }

    #[test]
    fn test_serialization_kind() {
        let err = PipelineError::serialization("orders", 2, SerializationError::Encode("bad".into()));
        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert_eq!(err.kind().as_str(), "Serialization");
        assert!(!err.is_schema_not_found());
        assert!(err.as_schema_error().is_none());
        assert_eq!(
            err.to_string(),
            "Encoding against schema orders v2 failed: Avro serialization failed: bad"
        );
    }
}
