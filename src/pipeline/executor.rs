//! Validate-and-serialize orchestrator
//!
//! Stages, each a failure boundary:
//! 1. Fetch the schema by (id, version)
//! 2. Compile its shape, or reuse the memoized one
//! 3. Validate and canonicalize the input
//! 4. Encode the canonical data with the fetched definition
//!
//! Any stage failure short-circuits; bytes are returned only on success.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::Codec;
use crate::observability::PipelineMetrics;
use crate::schema::{SchemaError, SchemaRegistry, StoredSchema};
use crate::shape::{Datum, Shape, ShapeCompiler, ShapeValidator, ValidationOptions};

use super::errors::{PipelineError, PipelineResult};

/// A compiled schema version.
///
/// Each version owns its compiler so that an evolved record keeping its
/// qualified name never resolves to the shape of an older version.
struct CompiledSchema {
    compiler: ShapeCompiler,
    root: Arc<Shape>,
}

/// Validates raw data against a registered schema and encodes it.
pub struct ValidateAndSerialize<R, C> {
    registry: R,
    codec: C,
    compiled: RwLock<HashMap<(String, u32), Arc<CompiledSchema>>>,
    options: ValidationOptions,
    metrics: Arc<PipelineMetrics>,
}

impl<R: SchemaRegistry, C: Codec> ValidateAndSerialize<R, C> {
    pub fn new(registry: R, codec: C) -> Self {
        Self {
            registry,
            codec,
            compiled: RwLock::new(HashMap::new()),
            options: ValidationOptions::default(),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Shares an externally owned counter set
    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Number of schema versions with a memoized shape
    pub fn compiled_count(&self) -> usize {
        self.compiled.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Validates `raw` against schema `(schema_id, schema_version)` and
    /// returns its binary encoding.
    ///
    /// # Errors
    ///
    /// - `SchemaValidation` when the schema is unknown, unsupported or
    ///   malformed, or the data does not conform. The codec is not invoked.
    /// - `Serialization` when the codec rejects validated data.
    pub fn execute(
        &self,
        raw: &Value,
        schema_id: &str,
        schema_version: u32,
    ) -> PipelineResult<Vec<u8>> {
        self.metrics.increment_requests();

        let (stored, datum) = self
            .fetch_and_validate(raw, schema_id, schema_version)
            .map_err(|err| self.rejected(err, schema_id, schema_version))?;

        debug!(schema_id, schema_version, "encoding validated data");
        let bytes = self
            .codec
            .encode(&stored.definition, &datum)
            .map_err(|source| {
                self.metrics.increment_serialization_failures();
                warn!(
                    schema_id,
                    schema_version,
                    error = %source,
                    "codec rejected validated data"
                );
                PipelineError::serialization(schema_id, schema_version, source)
            })?;

        self.metrics.record_encoded(bytes.len() as u64);
        debug!(schema_id, schema_version, length = bytes.len(), "encoded");
        Ok(bytes)
    }

    /// Runs the fetch, compile and validate stages only.
    pub fn validate(
        &self,
        raw: &Value,
        schema_id: &str,
        schema_version: u32,
    ) -> PipelineResult<Datum> {
        self.metrics.increment_requests();

        self.fetch_and_validate(raw, schema_id, schema_version)
            .map(|(_, datum)| datum)
            .map_err(|err| self.rejected(err, schema_id, schema_version))
    }

    fn fetch_and_validate(
        &self,
        raw: &Value,
        schema_id: &str,
        schema_version: u32,
    ) -> Result<(StoredSchema, Datum), SchemaError> {
        debug!(schema_id, schema_version, "fetching schema");
        let stored = self
            .registry
            .fetch(schema_id, schema_version)
            .map_err(SchemaError::from)?;

        let compiled = self.compiled_schema(&stored)?;
        let datum = ShapeValidator::with_options(&compiled.compiler, self.options)
            .apply(&compiled.root, raw)?;

        Ok((stored, datum))
    }

    fn compiled_schema(&self, stored: &StoredSchema) -> Result<Arc<CompiledSchema>, SchemaError> {
        let key = (stored.schema_id.clone(), stored.schema_version);

        if let Some(hit) = self
            .compiled
            .read()
            .map_err(|_| SchemaError::malformed("compiled schema cache lock poisoned"))?
            .get(&key)
        {
            self.metrics.increment_shape_cache_hits();
            return Ok(Arc::clone(hit));
        }

        debug!(
            schema_id = %stored.schema_id,
            schema_version = stored.schema_version,
            "compiling shape"
        );
        self.metrics.increment_shape_cache_misses();
        let compiler = ShapeCompiler::new();
        let root = compiler.compile(&stored.definition)?;

        let mut compiled = self
            .compiled
            .write()
            .map_err(|_| SchemaError::malformed("compiled schema cache lock poisoned"))?;
        Ok(Arc::clone(
            compiled
                .entry(key)
                .or_insert_with(|| Arc::new(CompiledSchema { compiler, root })),
        ))
    }

    /// Single reclassification point for pre-encode failures
    fn rejected(&self, err: SchemaError, schema_id: &str, schema_version: u32) -> PipelineError {
        let err = err.with_schema(schema_id, schema_version);
        if err.is_not_found() {
            self.metrics.increment_schema_not_found();
        }
        self.metrics.increment_rejected();
        warn!(
            schema_id,
            schema_version,
            code = err.code().code(),
            "request rejected: {}",
            err.message()
        );
        PipelineError::SchemaValidation(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{AvroCodec, CodecResult, SerializationError};
    use crate::pipeline::ErrorKind;
    use crate::schema::{MemoryRegistry, SchemaErrorCode};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCodec {
        calls: Arc<AtomicUsize>,
    }

    impl Codec for CountingCodec {
        fn encode(&self, _definition: &Value, _datum: &Datum) -> CodecResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0xAB])
        }
    }

    fn registry() -> MemoryRegistry {
        let registry = MemoryRegistry::new();
        registry
            .register(StoredSchema::new(
                "temperature",
                json!({
                    "type": "record",
                    "name": "Temperature",
                    "fields": [
                        {"name": "value", "type": "float"},
                        {"name": "unit", "type": "string", "default": "Celsius"}
                    ]
                }),
                1,
            ))
            .unwrap();
        registry
    }

    #[test]
    fn test_codec_bytes_returned_unchanged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = ValidateAndSerialize::new(
            registry(),
            CountingCodec {
                calls: Arc::clone(&calls),
            },
        );

        let bytes = pipeline.execute(&json!({"value": 1.5}), "temperature", 1).unwrap();
        assert_eq!(bytes, vec![0xAB]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_data_never_reaches_codec() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = ValidateAndSerialize::new(
            registry(),
            CountingCodec {
                calls: Arc::clone(&calls),
            },
        );

        let err = pipeline
            .execute(&json!({"value": "hot"}), "temperature", 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let schema_err = err.as_schema_error().unwrap();
        assert_eq!(schema_err.schema_id(), Some("temperature"));
        assert_eq!(schema_err.schema_version(), Some(1));
    }

    #[test]
    fn test_not_found_reclassified() {
        let pipeline = ValidateAndSerialize::new(registry(), AvroCodec::new());

        let err = pipeline.execute(&json!({}), "temperature", 9).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
        assert!(err.is_schema_not_found());
        assert_eq!(
            err.as_schema_error().unwrap().code(),
            SchemaErrorCode::AvroSchemaNotFound
        );
        assert!(err.to_string().contains("temperature v9 not found"));
        assert_eq!(pipeline.metrics().snapshot().schema_not_found, 1);
    }

    #[test]
    fn test_shape_memoized_per_version() {
        let pipeline = ValidateAndSerialize::new(registry(), AvroCodec::new());

        pipeline.execute(&json!({"value": 1.0}), "temperature", 1).unwrap();
        pipeline.execute(&json!({"value": 2.0}), "temperature", 1).unwrap();

        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.shape_cache_misses, 1);
        assert_eq!(snapshot.shape_cache_hits, 1);
        assert_eq!(snapshot.encoded, 2);
        assert_eq!(pipeline.compiled_count(), 1);
    }

    #[test]
    fn test_codec_failure_keeps_serialization_kind() {
        struct FailingCodec;
        impl Codec for FailingCodec {
            fn encode(&self, _: &Value, _: &Datum) -> CodecResult<Vec<u8>> {
                Err(SerializationError::Encode("refused".into()))
            }
        }

        let pipeline = ValidateAndSerialize::new(registry(), FailingCodec);
        let err = pipeline
            .execute(&json!({"value": 1.0}), "temperature", 1)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert!(matches!(
            err,
            PipelineError::Serialization { ref schema_id, schema_version: 1, .. } if schema_id == "temperature"
        ));
        assert_eq!(pipeline.metrics().snapshot().serialization_failures, 1);
    }

    #[test]
    fn test_validate_fills_defaults() {
        let pipeline = ValidateAndSerialize::new(registry(), AvroCodec::new());

        let datum = pipeline
            .validate(&json!({"value": 21.5}), "temperature", 1)
            .unwrap();
        assert_eq!(datum.to_json(), json!({"value": 21.5, "unit": "Celsius"}));
    }

    #[test]
    fn test_lax_numbers_option() {
        let pipeline = ValidateAndSerialize::new(registry(), AvroCodec::new())
            .with_options(ValidationOptions {
                strict_numbers: false,
            });

        let datum = pipeline
            .validate(&json!({"value": "21.5"}), "temperature", 1)
            .unwrap();
        assert_eq!(datum.field("value"), Some(&Datum::Float(21.5)));
    }
}
