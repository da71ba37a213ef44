//! Shape validator and canonicalizer
//!
//! Validation semantics:
//! - Records: declared fields in order, defaults filled for absent fields,
//!   undeclared input keys ignored
//! - Enums: exact symbol match
//! - Unions: branches tried in declaration order, first match wins
//! - Collections: every element validated, first failure reported
//!
//! The first mismatch is reported with its path, expected shape and the
//! actual JSON type. Validation never mutates the input.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::schema::{SchemaError, SchemaResult, ValidationDetails};

use super::compiler::ShapeCompiler;
use super::datum::Datum;
use super::types::{Branch, EnumShape, RecordShape, Shape};

/// Coercion policy for the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// When false, numeric strings are accepted for numeric primitives
    pub strict_numbers: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strict_numbers: true,
        }
    }
}

/// Applies compiled shapes to raw data.
///
/// Borrows the compiler to resolve [`Shape::Ref`] forward references.
pub struct ShapeValidator<'a> {
    compiler: &'a ShapeCompiler,
    options: ValidationOptions,
}

impl<'a> ShapeValidator<'a> {
    /// Creates a validator with strict number handling.
    pub fn new(compiler: &'a ShapeCompiler) -> Self {
        Self::with_options(compiler, ValidationOptions::default())
    }

    pub fn with_options(compiler: &'a ShapeCompiler, options: ValidationOptions) -> Self {
        Self { compiler, options }
    }

    /// Validates `raw` against `shape` and returns the canonical datum.
    ///
    /// # Errors
    ///
    /// Returns `AVRO_SCHEMA_VALIDATION_FAILED` with the path of the first
    /// mismatch.
    pub fn apply(&self, shape: &Shape, raw: &Value) -> SchemaResult<Datum> {
        self.validate(shape, raw, "")
            .map_err(SchemaError::validation_failed)
    }

    fn validate(&self, shape: &Shape, value: &Value, path: &str) -> Result<Datum, ValidationDetails> {
        match shape {
            Shape::Null => {
                if value.is_null() {
                    Ok(Datum::Null)
                } else {
                    Err(type_error(path, "null", value))
                }
            }
            Shape::Boolean => value
                .as_bool()
                .map(Datum::Boolean)
                .ok_or_else(|| type_error(path, "boolean", value)),
            Shape::Int => self
                .integer(value)
                .and_then(|i| i32::try_from(i).ok())
                .map(Datum::Int)
                .ok_or_else(|| type_error(path, "int", value)),
            Shape::Long => self
                .integer(value)
                .map(Datum::Long)
                .ok_or_else(|| type_error(path, "long", value)),
            Shape::Float => self
                .number(value)
                .filter(|f| f.abs() <= f64::from(f32::MAX))
                .map(Datum::Float)
                .ok_or_else(|| type_error(path, "float", value)),
            Shape::Double => self
                .number(value)
                .map(Datum::Double)
                .ok_or_else(|| type_error(path, "double", value)),
            Shape::Bytes => bytes_of(value)
                .map(Datum::Bytes)
                .ok_or_else(|| type_error(path, "bytes", value)),
            Shape::String => value
                .as_str()
                .map(|s| Datum::String(s.to_string()))
                .ok_or_else(|| type_error(path, "string", value)),
            Shape::Record(record) => self.validate_record(record, value, path),
            Shape::Enum(enum_shape) => validate_enum(enum_shape, value, path),
            Shape::Fixed(fixed) => {
                let bytes = bytes_of(value).ok_or_else(|| type_error(path, &shape.describe(), value))?;
                if bytes.len() != fixed.size {
                    return Err(ValidationDetails::wrong_length(at(path), fixed.size, bytes.len()));
                }
                Ok(Datum::Fixed(bytes))
            }
            Shape::Array(items) => {
                let elements = value
                    .as_array()
                    .ok_or_else(|| type_error(path, &shape.describe(), value))?;
                elements
                    .iter()
                    .enumerate()
                    .map(|(i, elem)| self.validate(items, elem, &format!("{}[{}]", path, i)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Datum::Array)
            }
            Shape::Map(values) => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| type_error(path, &shape.describe(), value))?;
                let mut map = BTreeMap::new();
                for (key, entry) in entries {
                    let datum = self.validate(values, entry, &make_path(path, key))?;
                    map.insert(key.clone(), datum);
                }
                Ok(Datum::Map(map))
            }
            Shape::Optional {
                null_index,
                branches,
            } => {
                if value.is_null() {
                    return Ok(Datum::Union(*null_index, Box::new(Datum::Null)));
                }
                match branches.as_slice() {
                    [] => Err(type_error(path, "null", value)),
                    [only] => self
                        .validate(&only.shape, value, path)
                        .map(|datum| Datum::Union(only.index, Box::new(datum)))
                        .map_err(|err| {
                            // Mismatch of the member itself reads better as a union failure
                            if err.path == at(path) {
                                union_error(branches, true, value, path)
                            } else {
                                err
                            }
                        }),
                    many => self.first_match(many, true, value, path),
                }
            }
            Shape::OneOf(branches) => self.first_match(branches, false, value, path),
            Shape::Ref(name) => {
                let target = self.compiler.lookup(name).ok().flatten().ok_or_else(|| {
                    ValidationDetails::new(at(path), format!("named type '{}'", name), "unresolved reference")
                })?;
                self.validate(&target, value, path)
            }
        }
    }

    fn validate_record(
        &self,
        record: &RecordShape,
        value: &Value,
        path: &str,
    ) -> Result<Datum, ValidationDetails> {
        let obj = value
            .as_object()
            .ok_or_else(|| type_error(path, &format!("record {}", record.name), value))?;

        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            let field_path = make_path(path, &field.name);

            let datum = match (obj.get(&field.name), &field.default) {
                (Some(supplied), _) => self.validate(&field.shape, supplied, &field_path)?,
                (None, Some(default)) => {
                    self.validate(&field.shape, default, &format!("{}(default)", field_path))?
                }
                (None, None) => return Err(ValidationDetails::missing_field(field_path)),
            };
            fields.push((field.name.clone(), datum));
        }

        Ok(Datum::Record(fields))
    }

    fn first_match(
        &self,
        branches: &[Branch],
        nullable: bool,
        value: &Value,
        path: &str,
    ) -> Result<Datum, ValidationDetails> {
        for branch in branches {
            if let Ok(datum) = self.validate(&branch.shape, value, path) {
                return Ok(Datum::Union(branch.index, Box::new(datum)));
            }
        }
        Err(union_error(branches, nullable, value, path))
    }

    fn integer(&self, value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) if !self.options.strict_numbers => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn number(&self, value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if !self.options.strict_numbers => {
                s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
            }
            _ => None,
        }
    }
}

fn validate_enum(enum_shape: &EnumShape, value: &Value, path: &str) -> Result<Datum, ValidationDetails> {
    let symbol = value
        .as_str()
        .ok_or_else(|| type_error(path, &format!("enum {}", enum_shape.name), value))?;

    enum_shape
        .position(symbol)
        .map(|index| Datum::Enum(index, symbol.to_string()))
        .ok_or_else(|| {
            ValidationDetails::invalid_symbol(at(path), &enum_shape.name, &enum_shape.symbols, symbol)
        })
}

/// Byte blocks arrive as arrays of 0-255 or as strings of code points <= U+00FF.
fn bytes_of(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => s.chars().map(|c| u8::try_from(c).ok()).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect(),
        _ => None,
    }
}

fn union_error(branches: &[Branch], nullable: bool, value: &Value, path: &str) -> ValidationDetails {
    let mut attempted = Vec::with_capacity(branches.len() + 1);
    if nullable {
        attempted.push("null".to_string());
    }
    attempted.extend(branches.iter().map(|b| b.shape.describe()));
    ValidationDetails::no_alternative(at(path), &attempted, json_type_name(value))
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Creates a value path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// Path as reported: the top value is `$root`.
fn at(path: &str) -> String {
    if path.is_empty() {
        "$root".to_string()
    } else {
        path.to_string()
    }
}

fn type_error(path: &str, expected: &str, actual: &Value) -> ValidationDetails {
    ValidationDetails::type_mismatch(at(path), expected, json_type_name(actual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaErrorCode;
    use serde_json::json;
    use std::sync::Arc;

    fn apply(definition: Value, raw: Value) -> SchemaResult<Datum> {
        let compiler = ShapeCompiler::new();
        let shape = compiler.compile(&definition).unwrap();
        ShapeValidator::new(&compiler).apply(&shape, &raw)
    }

    fn temperature() -> Value {
        json!({
            "type": "record",
            "name": "Temperature",
            "fields": [
                {"name": "value", "type": "float"},
                {"name": "unit", "type": "string", "default": "Celsius"}
            ]
        })
    }

    #[test]
    fn test_primitive_literals_unchanged() {
        let cases = [
            ("null", json!(null)),
            ("boolean", json!(true)),
            ("int", json!(-42)),
            ("long", json!(9_007_199_254_740_993_i64)),
            ("float", json!(25.3)),
            ("double", json!(1.0e300)),
            ("bytes", json!([0, 1, 255])),
            ("string", json!("hello")),
        ];
        for (name, literal) in cases {
            let datum = apply(json!(name), literal.clone()).unwrap();
            assert_eq!(datum.to_json(), literal, "primitive {}", name);
        }
    }

    #[test]
    fn test_default_filled() {
        let datum = apply(temperature(), json!({"value": 25.3})).unwrap();
        assert_eq!(datum.to_json(), json!({"value": 25.3, "unit": "Celsius"}));
    }

    #[test]
    fn test_default_only_record() {
        let definition = json!({
            "type": "record",
            "name": "Unit",
            "fields": [{"name": "unit", "type": "string", "default": "Celsius"}]
        });
        let datum = apply(definition, json!({})).unwrap();
        assert_eq!(datum.to_json(), json!({"unit": "Celsius"}));
    }

    #[test]
    fn test_missing_required_field() {
        let err = apply(temperature(), json!({"unit": "Kelvin"})).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::AvroSchemaValidationFailed);
        let details = err.details().unwrap();
        assert_eq!(details.path, "value");
        assert_eq!(details.actual, "missing");
    }

    #[test]
    fn test_type_mismatch() {
        let err = apply(temperature(), json!({"value": "invalid"})).unwrap_err();
        let details = err.details().unwrap();
        assert_eq!(details.path, "value");
        assert_eq!(details.expected, "float");
        assert_eq!(details.actual, "string");
    }

    #[test]
    fn test_extra_keys_ignored() {
        let datum = apply(temperature(), json!({"value": 1.5, "sensor": "x"})).unwrap();
        assert_eq!(datum.to_json(), json!({"value": 1.5, "unit": "Celsius"}));
    }

    #[test]
    fn test_non_object_record() {
        let err = apply(temperature(), json!([1, 2])).unwrap_err();
        let details = err.details().unwrap();
        assert_eq!(details.path, "$root");
        assert_eq!(details.expected, "record Temperature");
    }

    #[test]
    fn test_nullable_union() {
        let schema = json!(["null", "string"]);
        assert_eq!(apply(schema.clone(), json!(null)).unwrap().to_json(), json!(null));
        assert_eq!(apply(schema.clone(), json!("hello")).unwrap().to_json(), json!("hello"));

        let err = apply(schema, json!(42)).unwrap_err();
        let details = err.details().unwrap();
        assert_eq!(details.expected, "one of [null, string]");
        assert_eq!(details.actual, "integer");
    }

    #[test]
    fn test_union_branch_indices() {
        let datum = apply(json!(["string", "null"]), json!(null)).unwrap();
        assert_eq!(datum, Datum::Union(1, Box::new(Datum::Null)));

        let datum = apply(json!(["long", "double"]), json!(2.5)).unwrap();
        assert_eq!(datum, Datum::Union(1, Box::new(Datum::Double(2.5))));
    }

    #[test]
    fn test_union_earliest_branch_wins() {
        let datum = apply(json!(["double", "long"]), json!(7)).unwrap();
        assert_eq!(datum, Datum::Union(0, Box::new(Datum::Double(7.0))));
    }

    #[test]
    fn test_union_names_all_alternatives() {
        let err = apply(json!(["null", "int", "boolean"]), json!("text")).unwrap_err();
        assert_eq!(err.details().unwrap().expected, "one of [null, int, boolean]");

        let err = apply(json!(["int", "boolean"]), json!(null)).unwrap_err();
        assert_eq!(err.details().unwrap().expected, "one of [int, boolean]");
    }

    #[test]
    fn test_always_null_union() {
        assert!(apply(json!(["null"]), json!(null)).is_ok());
        assert!(apply(json!(["null"]), json!(0)).is_err());
    }

    #[test]
    fn test_enum_membership() {
        let schema = json!({
            "type": "enum",
            "name": "Status",
            "symbols": ["PENDING", "ACTIVE", "INACTIVE"]
        });
        let datum = apply(schema.clone(), json!("PENDING")).unwrap();
        assert_eq!(datum, Datum::Enum(0, "PENDING".into()));

        let err = apply(schema, json!("INVALID")).unwrap_err();
        assert!(err.message().contains("INVALID"));
        assert!(err.message().contains("Status"));
    }

    #[test]
    fn test_nested_record_path() {
        let schema = json!({
            "type": "record",
            "name": "User",
            "fields": [
                {"name": "name", "type": "string"},
                {"name": "address", "type": {
                    "type": "record",
                    "name": "Address",
                    "fields": [
                        {"name": "street", "type": "string"},
                        {"name": "city", "type": "string"}
                    ]
                }}
            ]
        });

        let datum = apply(
            schema.clone(),
            json!({"name": "Bob", "address": {"street": "123 Main St", "city": "Springfield"}}),
        )
        .unwrap();
        assert_eq!(
            datum.field("address").unwrap().field("street"),
            Some(&Datum::String("123 Main St".into()))
        );

        let err = apply(schema, json!({"name": "Bob", "address": {"street": "x"}})).unwrap_err();
        assert_eq!(err.details().unwrap().path, "address.city");
    }

    #[test]
    fn test_collection_paths() {
        let schema = json!({
            "type": "record",
            "name": "ComplexData",
            "fields": [
                {"name": "id", "type": "string"},
                {"name": "metadata", "type": {"type": "map", "values": "string"}},
                {"name": "readings", "type": {"type": "array", "items": "float"}}
            ]
        });

        let valid = json!({
            "id": "sensor-1",
            "metadata": {"location": "room-101"},
            "readings": [25.3, 26.0]
        });
        assert_eq!(apply(schema.clone(), valid.clone()).unwrap().to_json(), valid);

        let bad_reading = json!({"id": "s", "metadata": {}, "readings": [1.0, "x"]});
        let err = apply(schema.clone(), bad_reading).unwrap_err();
        assert_eq!(err.details().unwrap().path, "readings[1]");

        let bad_meta = json!({"id": "s", "metadata": {"floor": 3}, "readings": []});
        let err = apply(schema, bad_meta).unwrap_err();
        assert_eq!(err.details().unwrap().path, "metadata.floor");
    }

    #[test]
    fn test_recursive_record_validation() {
        let schema = json!({
            "type": "record",
            "name": "LinkedList",
            "fields": [
                {"name": "value", "type": "int"},
                {"name": "next", "type": ["null", "LinkedList"]}
            ]
        });
        let list = json!({"value": 1, "next": {"value": 2, "next": {"value": 3, "next": null}}});
        assert_eq!(apply(schema.clone(), list.clone()).unwrap().to_json(), list);

        let broken = json!({"value": 1, "next": {"value": "two", "next": null}});
        let err = apply(schema, broken).unwrap_err();
        assert_eq!(err.details().unwrap().path, "next.value");
    }

    #[test]
    fn test_fixed_length() {
        let schema = json!({"type": "fixed", "name": "Tag", "size": 4});
        assert_eq!(
            apply(schema.clone(), json!([1, 2, 3, 4])).unwrap(),
            Datum::Fixed(vec![1, 2, 3, 4])
        );
        assert_eq!(
            apply(schema.clone(), json!("abcd")).unwrap(),
            Datum::Fixed(b"abcd".to_vec())
        );

        let err = apply(schema.clone(), json!([1, 2])).unwrap_err();
        assert_eq!(err.details().unwrap().expected, "4 bytes");
        assert!(apply(schema, json!([1, 2, 3, 256])).is_err());
    }

    #[test]
    fn test_int_range() {
        assert!(apply(json!("int"), json!(2_147_483_647_i64)).is_ok());
        assert!(apply(json!("int"), json!(2_147_483_648_i64)).is_err());
        assert!(apply(json!("int"), json!(1.5)).is_err());
        assert!(apply(json!("long"), json!(u64::MAX)).is_err());
    }

    #[test]
    fn test_float_widening_and_range() {
        assert_eq!(apply(json!("float"), json!(3)).unwrap(), Datum::Float(3.0));
        assert!(apply(json!("float"), json!(1.0e39)).is_err());
    }

    #[test]
    fn test_lax_numbers() {
        let compiler = ShapeCompiler::new();
        let shape = compiler.compile(&json!("long")).unwrap();

        let strict = ShapeValidator::new(&compiler);
        assert!(strict.apply(&shape, &json!("12")).is_err());

        let lax = ShapeValidator::with_options(
            &compiler,
            ValidationOptions {
                strict_numbers: false,
            },
        );
        assert_eq!(lax.apply(&shape, &json!("12")).unwrap(), Datum::Long(12));
        assert!(lax.apply(&shape, &json!("twelve")).is_err());
    }

    #[test]
    fn test_invalid_default_reported() {
        let schema = json!({
            "type": "record",
            "name": "Bad",
            "fields": [{"name": "count", "type": "int", "default": "zero"}]
        });
        let err = apply(schema, json!({})).unwrap_err();
        assert_eq!(err.details().unwrap().path, "count(default)");
    }

    #[test]
    fn test_null_default_on_optional_field() {
        let schema = json!({
            "type": "record",
            "name": "Document",
            "fields": [{"name": "content", "type": ["null", "string"], "default": null}]
        });
        assert_eq!(apply(schema.clone(), json!({})).unwrap().to_json(), json!({"content": null}));
        assert_eq!(
            apply(schema, json!({"content": "Hello"})).unwrap().to_json(),
            json!({"content": "Hello"})
        );
    }

    #[test]
    fn test_nullable_field_without_default_is_required() {
        let schema = json!({
            "type": "record",
            "name": "Document",
            "fields": [{"name": "content", "type": ["null", "string"]}]
        });
        let err = apply(schema, json!({})).unwrap_err();
        assert_eq!(err.details().unwrap().path, "content");
    }

    #[test]
    fn test_unresolved_ref() {
        let compiler = ShapeCompiler::new();
        let validator = ShapeValidator::new(&compiler);
        let err = validator
            .apply(&Shape::Array(Arc::new(Shape::Ref("Ghost".into()))), &json!([{}]))
            .unwrap_err();
        assert_eq!(err.details().unwrap().actual, "unresolved reference");
    }
}
