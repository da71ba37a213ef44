//! Pipeline subsystem
//!
//! Composes the registry, the shape compiler and validator, and a codec
//! into a single request/response operation, and owns the policy that
//! translates stage failures into the two caller-facing error kinds.
//!
//! ```ignore
//! use avrogate::codec::AvroCodec;
//! use avrogate::pipeline::ValidateAndSerialize;
//! use avrogate::schema::FileRegistry;
//!
//! let pipeline = ValidateAndSerialize::new(FileRegistry::open(".registry")?, AvroCodec::new());
//! let bytes = pipeline.execute(&raw, "temperature", 1)?;
//! ```

mod errors;
mod executor;

pub use errors::{ErrorKind, PipelineError, PipelineResult};
pub use executor::ValidateAndSerialize;
