//! Avro binary codec over `apache-avro`
//!
//! Produces a single schemaless datum: no container header, no
//! fingerprint prefix.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use apache_avro::types::Value as AvroValue;
use apache_avro::Schema as AvroSchema;
use serde_json::Value;
use tracing::trace;

use crate::schema::fingerprint;
use crate::shape::Datum;

use super::errors::{CodecResult, SerializationError};

/// Encode contract: schema definition plus validated data in, bytes out.
pub trait Codec {
    fn encode(&self, definition: &Value, datum: &Datum) -> CodecResult<Vec<u8>>;
}

impl<C: Codec + ?Sized> Codec for &C {
    fn encode(&self, definition: &Value, datum: &Datum) -> CodecResult<Vec<u8>> {
        (**self).encode(definition, datum)
    }
}

impl<C: Codec + ?Sized> Codec for Arc<C> {
    fn encode(&self, definition: &Value, datum: &Datum) -> CodecResult<Vec<u8>> {
        (**self).encode(definition, datum)
    }
}

impl<C: Codec + ?Sized> Codec for Box<C> {
    fn encode(&self, definition: &Value, datum: &Datum) -> CodecResult<Vec<u8>> {
        (**self).encode(definition, datum)
    }
}

/// Avro binary encoder.
///
/// Parsed schemas are memoized by definition fingerprint.
#[derive(Default)]
pub struct AvroCodec {
    parsed: RwLock<HashMap<String, Arc<AvroSchema>>>,
}

impl AvroCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parsed schemas held by the codec.
    pub fn cached_schemas(&self) -> usize {
        self.parsed.read().map(|p| p.len()).unwrap_or(0)
    }

    fn parsed_schema(&self, definition: &Value) -> CodecResult<Arc<AvroSchema>> {
        let key = fingerprint(definition);

        if let Some(schema) = self
            .parsed
            .read()
            .map_err(|_| SerializationError::Poisoned)?
            .get(&key)
        {
            return Ok(Arc::clone(schema));
        }

        trace!(fingerprint = %key, "parsing avro schema");
        let schema = AvroSchema::parse(definition)
            .map_err(|e| SerializationError::InvalidSchema(e.to_string()))?;

        let mut parsed = self.parsed.write().map_err(|_| SerializationError::Poisoned)?;
        Ok(Arc::clone(parsed.entry(key).or_insert_with(|| Arc::new(schema))))
    }
}

impl Codec for AvroCodec {
    fn encode(&self, definition: &Value, datum: &Datum) -> CodecResult<Vec<u8>> {
        let schema = self.parsed_schema(definition)?;
        apache_avro::to_avro_datum(&schema, to_avro_value(datum))
            .map_err(|e| SerializationError::Encode(e.to_string()))
    }
}

/// Structural conversion; union and enum positions come from validation.
fn to_avro_value(datum: &Datum) -> AvroValue {
    match datum {
        Datum::Null => AvroValue::Null,
        Datum::Boolean(b) => AvroValue::Boolean(*b),
        Datum::Int(i) => AvroValue::Int(*i),
        Datum::Long(l) => AvroValue::Long(*l),
        Datum::Float(f) => AvroValue::Float(*f as f32),
        Datum::Double(d) => AvroValue::Double(*d),
        Datum::Bytes(bytes) => AvroValue::Bytes(bytes.clone()),
        Datum::String(s) => AvroValue::String(s.clone()),
        Datum::Fixed(bytes) => AvroValue::Fixed(bytes.len(), bytes.clone()),
        Datum::Enum(index, symbol) => AvroValue::Enum(*index as u32, symbol.clone()),
        Datum::Array(items) => AvroValue::Array(items.iter().map(to_avro_value).collect()),
        Datum::Map(entries) => AvroValue::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), to_avro_value(v)))
                .collect(),
        ),
        Datum::Record(fields) => AvroValue::Record(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), to_avro_value(v)))
                .collect(),
        ),
        Datum::Union(index, inner) => {
            AvroValue::Union(*index as u32, Box::new(to_avro_value(inner)))
        }
    }
}
