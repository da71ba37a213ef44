//! avrogate - validate JSON documents against registered Avro schemas
//! and encode them to Avro binary
//!
//! - `schema`: stored definitions and the registry
//! - `shape`: schema-to-shape compiler and the validator
//! - `codec`: Avro binary encoding
//! - `pipeline`: fetch, compile, validate, encode

pub mod cli;
pub mod codec;
pub mod observability;
pub mod pipeline;
pub mod schema;
pub mod shape;
