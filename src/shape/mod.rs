//! Shape subsystem
//!
//! Compiles schema definitions into reusable validator descriptors and
//! applies them to raw JSON data.
//!
//! ```ignore
//! use avrogate::shape::{ShapeCompiler, ShapeValidator};
//!
//! let compiler = ShapeCompiler::new();
//! let shape = compiler.compile(&definition)?;
//! let datum = ShapeValidator::new(&compiler).apply(&shape, &raw)?;
//! ```

mod compiler;
mod datum;
mod types;
mod validator;

pub use compiler::ShapeCompiler;
pub use datum::Datum;
pub use types::{Branch, EnumShape, FieldShape, FixedShape, RecordShape, Shape};
pub use validator::{ShapeValidator, ValidationOptions};
