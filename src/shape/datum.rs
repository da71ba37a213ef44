//! Validated data
//!
//! The output of applying a shape to raw input: defaults materialized,
//! enum symbols confirmed, union branches resolved to a single index.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Canonical value produced by the validator and consumed once by the codec.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    /// Kept at double precision; narrowed when encoded
    Float(f64),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    Fixed(Vec<u8>),
    /// Symbol and its position in the enum declaration
    Enum(usize, String),
    Array(Vec<Datum>),
    Map(BTreeMap<String, Datum>),
    /// Fields in record declaration order
    Record(Vec<(String, Datum)>),
    /// Resolved union branch index and its value
    Union(usize, Box<Datum>),
}

impl Datum {
    /// Renders the plain mapping/sequence/scalar form.
    ///
    /// Unions collapse to their value, enums to their symbol, and byte
    /// blocks to arrays of numbers.
    pub fn to_json(&self) -> Value {
        match self {
            Datum::Null => Value::Null,
            Datum::Boolean(b) => Value::Bool(*b),
            Datum::Int(i) => Value::from(*i),
            Datum::Long(l) => Value::from(*l),
            Datum::Float(f) | Datum::Double(f) => Value::from(*f),
            Datum::Bytes(bytes) | Datum::Fixed(bytes) => {
                Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
            }
            Datum::String(s) => Value::String(s.clone()),
            Datum::Enum(_, symbol) => Value::String(symbol.clone()),
            Datum::Array(items) => Value::Array(items.iter().map(Datum::to_json).collect()),
            Datum::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            Datum::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            Datum::Union(_, inner) => inner.to_json(),
        }
    }

    /// Looks up a record field by name
    pub fn field(&self, name: &str) -> Option<&Datum> {
        match self {
            Datum::Record(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Strips union wrappers
    pub fn unwrap_union(&self) -> &Datum {
        match self {
            Datum::Union(_, inner) => inner.unwrap_union(),
            other => other,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.unwrap_union(), Datum::Null)
    }
}
