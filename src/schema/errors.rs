//! Schema error types
//!
//! Error codes:
//! - AVRO_UNSUPPORTED_SCHEMA
//! - AVRO_MALFORMED_SCHEMA
//! - AVRO_SCHEMA_NOT_FOUND
//! - AVRO_SCHEMA_IMMUTABLE
//! - AVRO_SCHEMA_VALIDATION_FAILED
//! - AVRO_REGISTRY_IO
//!
//! Every one of these reaches callers of the pipeline as a schema
//! validation failure; the code keeps the finer distinction.

use std::fmt;

use super::registry::RegistryError;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Type tag or union member is not a supported schema node
    AvroUnsupportedSchema,
    /// Schema node is missing a required key or carries an invalid one
    AvroMalformedSchema,
    /// No schema registered under (id, version)
    AvroSchemaNotFound,
    /// Attempt to overwrite a registered schema
    AvroSchemaImmutable,
    /// Data violates the compiled shape
    AvroSchemaValidationFailed,
    /// Registry storage could not be read or written
    AvroRegistryIo,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::AvroUnsupportedSchema => "AVRO_UNSUPPORTED_SCHEMA",
            SchemaErrorCode::AvroMalformedSchema => "AVRO_MALFORMED_SCHEMA",
            SchemaErrorCode::AvroSchemaNotFound => "AVRO_SCHEMA_NOT_FOUND",
            SchemaErrorCode::AvroSchemaImmutable => "AVRO_SCHEMA_IMMUTABLE",
            SchemaErrorCode::AvroSchemaValidationFailed => "AVRO_SCHEMA_VALIDATION_FAILED",
            SchemaErrorCode::AvroRegistryIo => "AVRO_REGISTRY_IO",
        }
    }

    /// Returns true for codes raised while compiling a schema definition
    pub fn is_schema_defect(&self) -> bool {
        matches!(
            self,
            SchemaErrorCode::AvroUnsupportedSchema | SchemaErrorCode::AvroMalformedSchema
        )
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Value path (e.g., "user.address.city", "readings[2]")
    pub path: String,
    /// Expected shape or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(path: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: "required field to be present".into(),
            actual: "missing".into(),
        }
    }

    pub fn type_mismatch(path: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::new(path, expected, actual)
    }

    pub fn invalid_symbol(path: impl Into<String>, enum_name: &str, symbols: &[String], symbol: &str) -> Self {
        Self {
            path: path.into(),
            expected: format!("a symbol of enum '{}' [{}]", enum_name, symbols.join(", ")),
            actual: format!("'{}' is not a valid {}", symbol, enum_name),
        }
    }

    pub fn wrong_length(path: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self {
            path: path.into(),
            expected: format!("{} bytes", expected),
            actual: format!("{} bytes", actual),
        }
    }

    pub fn no_alternative(path: impl Into<String>, attempted: &[String], actual: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: format!("one of [{}]", attempted.join(", ")),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': expected {}, got {}", self.path, self.expected, self.actual)
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    schema_id: Option<String>,
    schema_version: Option<u32>,
    details: Option<ValidationDetails>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            schema_id: None,
            schema_version: None,
            details: None,
        }
    }

    /// Create an unsupported type error naming the offending type string
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::AvroUnsupportedSchema,
            format!("Unsupported type: {}", type_name.into()),
        )
    }

    /// Create an unsupported primitive error
    pub fn unsupported_primitive(type_name: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::AvroUnsupportedSchema,
            format!("Unsupported primitive type: {}", type_name.into()),
        )
    }

    /// Create a malformed schema error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::AvroMalformedSchema, reason.into())
    }

    /// Create a schema not found error
    pub fn not_found(schema_id: impl Into<String>, schema_version: u32) -> Self {
        let id = schema_id.into();
        Self {
            code: SchemaErrorCode::AvroSchemaNotFound,
            message: format!("Schema {} v{} not found", id, schema_version),
            schema_id: Some(id),
            schema_version: Some(schema_version),
            details: None,
        }
    }

    /// Create a schema immutable error
    pub fn immutable(schema_id: impl Into<String>, schema_version: u32) -> Self {
        let id = schema_id.into();
        Self {
            code: SchemaErrorCode::AvroSchemaImmutable,
            message: format!("Schema {} v{} is immutable", id, schema_version),
            schema_id: Some(id),
            schema_version: Some(schema_version),
            details: None,
        }
    }

    /// Create a registry storage error
    pub fn registry_io(reason: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::AvroRegistryIo, reason.into())
    }

    /// Create a validation failed error
    pub fn validation_failed(details: ValidationDetails) -> Self {
        Self {
            code: SchemaErrorCode::AvroSchemaValidationFailed,
            message: format!("Validation failed: {}", details),
            schema_id: None,
            schema_version: None,
            details: Some(details),
        }
    }

    /// Attaches the schema identity the error was raised against
    pub fn with_schema(mut self, schema_id: impl Into<String>, schema_version: u32) -> Self {
        self.schema_id = Some(schema_id.into());
        self.schema_version = Some(schema_version);
        self
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the schema ID if applicable
    pub fn schema_id(&self) -> Option<&str> {
        self.schema_id.as_deref()
    }

    /// Returns the schema version if applicable
    pub fn schema_version(&self) -> Option<u32> {
        self.schema_version
    }

    /// Returns validation details if applicable
    pub fn details(&self) -> Option<&ValidationDetails> {
        self.details.as_ref()
    }

    /// Returns whether the schema was missing from the registry
    pub fn is_not_found(&self) -> bool {
        self.code == SchemaErrorCode::AvroSchemaNotFound
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

impl From<RegistryError> for SchemaError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound {
                schema_id,
                schema_version,
            } => SchemaError::not_found(schema_id, schema_version),
            RegistryError::NoVersions(_) => {
                SchemaError::new(SchemaErrorCode::AvroSchemaNotFound, err.to_string())
            }
            RegistryError::Immutable {
                schema_id,
                schema_version,
            } => SchemaError::immutable(schema_id, schema_version),
            RegistryError::Malformed { .. } | RegistryError::InvalidId(_) => {
                SchemaError::malformed(err.to_string())
            }
            RegistryError::Io { .. } => SchemaError::registry_io(err.to_string()),
        }
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
