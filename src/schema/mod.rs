//! Schema subsystem
//!
//! Schemas are immutable Avro definitions registered under an
//! identifier and an integer version.
//!
//! # Design Principles
//!
//! - A registered (id, version) never changes
//! - Fetch distinguishes not-found from other failures
//! - Definitions are kept in their wire form and never rewritten

mod errors;
mod registry;
mod types;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, ValidationDetails};
pub use registry::{FileRegistry, MemoryRegistry, RegistryError, RegistryResult, SchemaRegistry};
pub use types::{fingerprint, qualified_name, StoredSchema};
