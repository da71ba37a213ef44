//! Shape compiler
//!
//! Translates a schema definition tree into a [`Shape`]. Named types
//! (records, enums, fixed) are memoized by qualified name in an arena
//! owned by the compiler:
//!
//! - A record's name is reserved before its fields are compiled, so a
//!   field referring back to it compiles to [`Shape::Ref`] instead of
//!   recursing forever.
//! - The finished shape is published to the arena; later references
//!   receive the same `Arc`.
//! - A failed compilation publishes nothing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tracing::trace;

use crate::schema::{qualified_name, SchemaError, SchemaResult};

use super::types::{Branch, EnumShape, FieldShape, FixedShape, RecordShape, Shape};

type Arena = HashMap<String, Arc<Shape>>;

/// Compiles schema definitions and owns the named-shape arena.
///
/// The arena lives as long as the compiler. Shapes are never mutated or
/// evicted individually.
pub struct ShapeCompiler {
    primitives: HashMap<&'static str, Arc<Shape>>,
    arena: RwLock<Arena>,
}

impl Default for ShapeCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeCompiler {
    pub fn new() -> Self {
        let primitives = [
            ("null", Shape::Null),
            ("boolean", Shape::Boolean),
            ("int", Shape::Int),
            ("long", Shape::Long),
            ("float", Shape::Float),
            ("double", Shape::Double),
            ("bytes", Shape::Bytes),
            ("string", Shape::String),
        ]
        .into_iter()
        .map(|(name, shape)| (name, Arc::new(shape)))
        .collect();

        Self {
            primitives,
            arena: RwLock::new(HashMap::new()),
        }
    }

    /// Compiles a schema definition.
    ///
    /// Holds the arena write lock for the whole call: concurrent compilations
    /// are serialized and readers only ever observe finished shapes.
    ///
    /// # Errors
    ///
    /// - `AVRO_UNSUPPORTED_SCHEMA` for an unknown type tag, primitive or reference
    /// - `AVRO_MALFORMED_SCHEMA` for a node missing required keys
    pub fn compile(&self, definition: &Value) -> SchemaResult<Arc<Shape>> {
        let mut arena = self
            .arena
            .write()
            .map_err(|_| SchemaError::malformed("shape arena lock poisoned"))?;

        let mut session = Session {
            primitives: &self.primitives,
            arena: &mut *arena,
            reserved: HashSet::new(),
            published: Vec::new(),
        };

        let result = session.compile_node(definition, None);
        if result.is_err() {
            session.rollback();
        }
        result
    }

    /// Returns the published shape for a qualified name.
    pub fn lookup(&self, qualified_name: &str) -> SchemaResult<Option<Arc<Shape>>> {
        let arena = self
            .arena
            .read()
            .map_err(|_| SchemaError::malformed("shape arena lock poisoned"))?;
        Ok(arena.get(qualified_name).cloned())
    }

    /// Returns true if a named shape has been published.
    pub fn contains(&self, qualified_name: &str) -> bool {
        matches!(self.lookup(qualified_name), Ok(Some(_)))
    }

    /// Number of named shapes in the arena.
    pub fn named_count(&self) -> usize {
        self.arena.read().map(|a| a.len()).unwrap_or(0)
    }
}

/// State of one `compile` call.
struct Session<'c> {
    primitives: &'c HashMap<&'static str, Arc<Shape>>,
    arena: &'c mut Arena,
    /// Named types whose definition is being compiled
    reserved: HashSet<String>,
    /// Names published by this call, in order
    published: Vec<String>,
}

impl Session<'_> {
    fn compile_node(&mut self, node: &Value, namespace: Option<&str>) -> SchemaResult<Arc<Shape>> {
        match node {
            Value::String(name) => self.compile_name(name, namespace),
            Value::Array(members) => self.compile_union(members, namespace),
            Value::Object(obj) => self.compile_object(obj, namespace),
            other => Err(SchemaError::unsupported_type(other.to_string())),
        }
    }

    /// A bare name: a primitive or a reference to a named type.
    fn compile_name(&mut self, name: &str, namespace: Option<&str>) -> SchemaResult<Arc<Shape>> {
        if let Some(primitive) = self.primitives.get(name) {
            return Ok(Arc::clone(primitive));
        }
        self.resolve_reference(name, namespace)
            .ok_or_else(|| SchemaError::unsupported_primitive(name))
    }

    fn compile_object(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> SchemaResult<Arc<Shape>> {
        match obj.get("type") {
            Some(Value::String(tag)) => match tag.as_str() {
                "record" => self.compile_record(obj, namespace),
                "enum" => self.compile_enum(obj, namespace),
                "fixed" => self.compile_fixed(obj, namespace),
                "array" => {
                    let items = obj
                        .get("items")
                        .ok_or_else(|| SchemaError::malformed("array schema missing 'items'"))?;
                    Ok(Arc::new(Shape::Array(self.compile_node(items, namespace)?)))
                }
                "map" => {
                    let values = obj
                        .get("values")
                        .ok_or_else(|| SchemaError::malformed("map schema missing 'values'"))?;
                    Ok(Arc::new(Shape::Map(self.compile_node(values, namespace)?)))
                }
                other => self
                    .compile_name(other, namespace)
                    .map_err(|_| SchemaError::unsupported_type(other)),
            },
            Some(nested @ (Value::Array(_) | Value::Object(_))) => {
                self.compile_node(nested, namespace)
            }
            Some(other) => Err(SchemaError::unsupported_type(other.to_string())),
            None => Err(SchemaError::malformed("schema object missing 'type'")),
        }
    }

    fn compile_record(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> SchemaResult<Arc<Shape>> {
        let name = required_str(obj, "name", "record")?;
        let namespace = namespace_of(obj, namespace)?;
        let qualified = qualified_name(namespace, name);

        if let Some(hit) = self.named(&qualified) {
            return Ok(hit);
        }

        trace!(name = %qualified, "compiling record");
        self.reserved.insert(qualified.clone());

        let declared: &[Value] = match obj.get("fields") {
            None => &[],
            Some(Value::Array(fields)) => fields,
            Some(_) => {
                return Err(SchemaError::malformed(format!(
                    "record '{}' fields must be a list",
                    qualified
                )))
            }
        };

        let mut fields: Vec<FieldShape> = Vec::with_capacity(declared.len());
        for (position, field) in declared.iter().enumerate() {
            let field = field.as_object().ok_or_else(|| {
                SchemaError::malformed(format!(
                    "field #{} of record '{}' is not an object",
                    position, qualified
                ))
            })?;

            let field_name = field.get("name").and_then(Value::as_str).ok_or_else(|| {
                SchemaError::malformed(format!(
                    "field #{} of record '{}' has no name",
                    position, qualified
                ))
            })?;

            if fields.iter().any(|f| f.name == field_name) {
                return Err(SchemaError::malformed(format!(
                    "record '{}' declares field '{}' more than once",
                    qualified, field_name
                )));
            }

            let field_type = field.get("type").ok_or_else(|| {
                SchemaError::malformed(format!(
                    "field '{}' of record '{}' has no type",
                    field_name, qualified
                ))
            })?;

            fields.push(FieldShape {
                name: field_name.to_string(),
                shape: self.compile_node(field_type, namespace)?,
                default: field.get("default").cloned(),
            });
        }

        let shape = Shape::Record(RecordShape {
            name: qualified.clone(),
            fields,
        });
        Ok(self.publish(qualified, shape))
    }

    fn compile_enum(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> SchemaResult<Arc<Shape>> {
        let name = required_str(obj, "name", "enum")?;
        let qualified = qualified_name(namespace_of(obj, namespace)?, name);

        if let Some(hit) = self.named(&qualified) {
            return Ok(hit);
        }

        let declared = obj
            .get("symbols")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SchemaError::malformed(format!("enum '{}' missing 'symbols' list", qualified))
            })?;

        let mut symbols: Vec<String> = Vec::with_capacity(declared.len());
        for symbol in declared {
            let symbol = symbol.as_str().ok_or_else(|| {
                SchemaError::malformed(format!(
                    "enum '{}' has non-string symbol {}",
                    qualified, symbol
                ))
            })?;
            if symbols.iter().any(|s| s == symbol) {
                return Err(SchemaError::malformed(format!(
                    "enum '{}' declares symbol '{}' more than once",
                    qualified, symbol
                )));
            }
            symbols.push(symbol.to_string());
        }

        let shape = Shape::Enum(EnumShape {
            name: qualified.clone(),
            symbols,
        });
        Ok(self.publish(qualified, shape))
    }

    fn compile_fixed(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> SchemaResult<Arc<Shape>> {
        let name = required_str(obj, "name", "fixed")?;
        let qualified = qualified_name(namespace_of(obj, namespace)?, name);

        if let Some(hit) = self.named(&qualified) {
            return Ok(hit);
        }

        let size = obj
            .get("size")
            .and_then(Value::as_u64)
            .and_then(|size| usize::try_from(size).ok())
            .ok_or_else(|| {
                SchemaError::malformed(format!(
                    "fixed '{}' requires a non-negative integer 'size'",
                    qualified
                ))
            })?;

        let shape = Shape::Fixed(FixedShape {
            name: qualified.clone(),
            size,
        });
        Ok(self.publish(qualified, shape))
    }

    fn compile_union(&mut self, members: &[Value], namespace: Option<&str>) -> SchemaResult<Arc<Shape>> {
        if members.is_empty() {
            return Err(SchemaError::malformed("union must declare at least one member"));
        }

        let mut null_index = None;
        let mut branches = Vec::with_capacity(members.len());

        for (index, member) in members.iter().enumerate() {
            if is_null_member(member) {
                if null_index.is_some() {
                    return Err(SchemaError::malformed("union declares 'null' more than once"));
                }
                null_index = Some(index);
                continue;
            }
            if member.is_array() {
                return Err(SchemaError::unsupported_type(format!("nested union {}", member)));
            }
            branches.push(Branch {
                index,
                shape: self.compile_node(member, namespace)?,
            });
        }

        let shape = match null_index {
            Some(null_index) => Shape::Optional {
                null_index,
                branches,
            },
            None => Shape::OneOf(branches),
        };
        Ok(Arc::new(shape))
    }

    /// Resolves a reference: enclosing namespace first, then the name as
    /// written, then a dotted full name split at its last dot.
    fn resolve_reference(&self, name: &str, namespace: Option<&str>) -> Option<Arc<Shape>> {
        let mut candidates = Vec::with_capacity(3);
        if namespace.is_some() {
            candidates.push(qualified_name(namespace, name));
        }
        candidates.push(name.to_string());
        if let Some((ns, short)) = name.rsplit_once('.') {
            candidates.push(qualified_name(Some(ns), short));
        }
        candidates.iter().find_map(|candidate| self.named(candidate))
    }

    /// Arena lookup that also sees names reserved by this session.
    fn named(&self, qualified: &str) -> Option<Arc<Shape>> {
        if self.reserved.contains(qualified) {
            trace!(name = qualified, "forward reference");
            return Some(Arc::new(Shape::Ref(qualified.to_string())));
        }
        let hit = self.arena.get(qualified).cloned();
        if hit.is_some() {
            trace!(name = qualified, "shape arena hit");
        }
        hit
    }

    fn publish(&mut self, qualified: String, shape: Shape) -> Arc<Shape> {
        self.reserved.remove(&qualified);
        let shape = Arc::new(shape);
        self.arena.insert(qualified.clone(), Arc::clone(&shape));
        self.published.push(qualified);
        shape
    }

    /// Drops every shape published by this session.
    fn rollback(&mut self) {
        for name in self.published.drain(..) {
            self.arena.remove(&name);
        }
        self.reserved.clear();
    }
}

fn required_str<'v>(obj: &'v Map<String, Value>, key: &str, kind: &str) -> SchemaResult<&'v str> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| SchemaError::malformed(format!("{} schema missing '{}'", kind, key)))
}

/// Own namespace if declared (empty string resets it), else the inherited one.
fn namespace_of<'v>(
    obj: &'v Map<String, Value>,
    inherited: Option<&'v str>,
) -> SchemaResult<Option<&'v str>> {
    match obj.get("namespace") {
        None | Some(Value::Null) => Ok(inherited),
        Some(Value::String(ns)) if ns.is_empty() => Ok(None),
        Some(Value::String(ns)) => Ok(Some(ns.as_str())),
        Some(other) => Err(SchemaError::malformed(format!(
            "namespace must be a string, got {}",
            other
        ))),
    }
}

fn is_null_member(member: &Value) -> bool {
    member.as_str() == Some("null") || member.get("type").and_then(Value::as_str) == Some("null")
}
