//! Binary codec adapter
//!
//! Encodes validated data with the schema definition it was validated
//! against. The definition is passed through untouched; the codec parses
//! it in its own representation.

mod avro;
mod errors;

pub use avro::{AvroCodec, Codec};
pub use errors::{CodecResult, SerializationError};
