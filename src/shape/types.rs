//! Compiled shape definitions
//!
//! One variant per schema node kind. Shapes are immutable once built and
//! shared through `Arc`; named types are owned by the compiler arena.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A compiled, directly usable validator descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Null,
    Boolean,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// Single precision float
    Float,
    Double,
    Bytes,
    String,
    Record(RecordShape),
    Enum(EnumShape),
    Fixed(FixedShape),
    /// Homogeneous sequence of the item shape
    Array(Arc<Shape>),
    /// String-keyed mapping to the value shape
    Map(Arc<Shape>),
    /// Union containing "null".
    ///
    /// No branches: always null. One branch: optional of that shape.
    /// Several branches: optional one-of, tried in declaration order.
    Optional {
        null_index: usize,
        branches: Vec<Branch>,
    },
    /// Union without "null"; first matching branch wins.
    OneOf(Vec<Branch>),
    /// Forward reference to a named type, resolved through the compiler arena.
    Ref(String),
}

impl Shape {
    /// Returns the shape name used in error messages
    pub fn describe(&self) -> String {
        match self {
            Shape::Null => "null".into(),
            Shape::Boolean => "boolean".into(),
            Shape::Int => "int".into(),
            Shape::Long => "long".into(),
            Shape::Float => "float".into(),
            Shape::Double => "double".into(),
            Shape::Bytes => "bytes".into(),
            Shape::String => "string".into(),
            Shape::Record(record) => format!("record {}", record.name),
            Shape::Enum(enum_shape) => format!("enum {}", enum_shape.name),
            Shape::Fixed(fixed) => format!("fixed {}[{}]", fixed.name, fixed.size),
            Shape::Array(items) => format!("array<{}>", items.describe()),
            Shape::Map(values) => format!("map<{}>", values.describe()),
            Shape::Optional { branches, .. } => {
                let mut names = vec!["null".to_string()];
                names.extend(branches.iter().map(|b| b.shape.describe()));
                format!("union[{}]", names.join(", "))
            }
            Shape::OneOf(branches) => {
                let names: Vec<_> = branches.iter().map(|b| b.shape.describe()).collect();
                format!("union[{}]", names.join(", "))
            }
            Shape::Ref(name) => name.clone(),
        }
    }

    /// Returns true for a union whose only member is "null"
    pub fn is_always_null(&self) -> bool {
        matches!(self, Shape::Optional { branches, .. } if branches.is_empty())
    }

    /// Returns true if null is an accepted value
    pub fn is_nullable(&self) -> bool {
        matches!(self, Shape::Null | Shape::Optional { .. })
    }

    /// Returns the record shape, if this is a record
    pub fn as_record(&self) -> Option<&RecordShape> {
        match self {
            Shape::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// A union member together with its position in the declared union.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub index: usize,
    pub shape: Arc<Shape>,
}

/// Record shape, fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordShape {
    /// Qualified name
    pub name: String,
    pub fields: Vec<FieldShape>,
}

impl RecordShape {
    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldShape> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// A record field. A field without a declared default is required.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    pub name: String,
    pub shape: Arc<Shape>,
    pub default: Option<Value>,
}

impl FieldShape {
    pub fn required(&self) -> bool {
        self.default.is_none()
    }
}

/// Closed set of symbols, declaration order preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumShape {
    /// Qualified name
    pub name: String,
    pub symbols: Vec<String>,
}

impl EnumShape {
    /// Position of a symbol in the declaration
    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

/// Fixed-length byte block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedShape {
    /// Qualified name
    pub name: String,
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_collections() {
        let shape = Shape::Map(Arc::new(Shape::Array(Arc::new(Shape::Long))));
        assert_eq!(shape.describe(), "map<array<long>>");
    }

    #[test]
    fn test_describe_unions() {
        let optional = Shape::Optional {
            null_index: 0,
            branches: vec![Branch {
                index: 1,
                shape: Arc::new(Shape::String),
            }],
        };
        assert_eq!(optional.describe(), "union[null, string]");
        assert!(optional.is_nullable());
        assert!(!optional.is_always_null());

        let always_null = Shape::Optional {
            null_index: 0,
            branches: vec![],
        };
        assert!(always_null.is_always_null());
    }

    #[test]
    fn test_field_required_follows_default() {
        let required = FieldShape {
            name: "value".into(),
            shape: Arc::new(Shape::Float),
            default: None,
        };
        let defaulted = FieldShape {
            name: "unit".into(),
            shape: Arc::new(Shape::String),
            default: Some(json!("Celsius")),
        };
        assert!(required.required());
        assert!(!defaulted.required());
    }

    #[test]
    fn test_enum_position() {
        let status = EnumShape {
            name: "Status".into(),
            symbols: vec!["PENDING".into(), "ACTIVE".into()],
        };
        assert_eq!(status.position("ACTIVE"), Some(1));
        assert_eq!(status.position("active"), None);
    }
}
