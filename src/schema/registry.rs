//! Schema registry
//!
//! - Schemas stored at `<registry_dir>/<schema_id>_<schema_version>.json`
//! - One file per schema version, holding the raw definition
//! - A registered (id, version) pair never changes

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::types::StoredSchema;

/// Failure kinds of a registry operation.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Schema '{schema_id}' version {schema_version} not found")]
    NotFound {
        schema_id: String,
        schema_version: u32,
    },

    #[error("Schema '{0}' has no registered versions")]
    NoVersions(String),

    #[error("Schema '{schema_id}' version {schema_version} is already registered with a different definition")]
    Immutable {
        schema_id: String,
        schema_version: u32,
    },

    #[error("Malformed schema file '{path}': {reason}")]
    Malformed { path: String, reason: String },

    #[error("Invalid schema id '{0}'")]
    InvalidId(String),

    #[error("Registry I/O error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl RegistryError {
    fn io(path: &Path, source: io::Error) -> Self {
        RegistryError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn poisoned() -> Self {
        RegistryError::Io {
            path: "<memory>".into(),
            source: io::Error::other("registry lock poisoned"),
        }
    }

    /// Returns true for the not-found outcome
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::NotFound { .. } | RegistryError::NoVersions(_)
        )
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Fetch-by-identifier-and-version contract.
///
/// The same (id, version) pair must always return an identical definition.
pub trait SchemaRegistry {
    fn fetch(&self, schema_id: &str, schema_version: u32) -> RegistryResult<StoredSchema>;
}

impl<R: SchemaRegistry + ?Sized> SchemaRegistry for &R {
    fn fetch(&self, schema_id: &str, schema_version: u32) -> RegistryResult<StoredSchema> {
        (**self).fetch(schema_id, schema_version)
    }
}

impl<R: SchemaRegistry + ?Sized> SchemaRegistry for Arc<R> {
    fn fetch(&self, schema_id: &str, schema_version: u32) -> RegistryResult<StoredSchema> {
        (**self).fetch(schema_id, schema_version)
    }
}

impl<R: SchemaRegistry + ?Sized> SchemaRegistry for Box<R> {
    fn fetch(&self, schema_id: &str, schema_version: u32) -> RegistryResult<StoredSchema> {
        (**self).fetch(schema_id, schema_version)
    }
}

/// Schema ids become part of a file name.
fn check_schema_id(schema_id: &str) -> RegistryResult<()> {
    let invalid = schema_id.is_empty()
        || schema_id.starts_with('.')
        || schema_id.contains(['/', '\\'])
        || schema_id.chars().any(char::is_control);
    if invalid {
        return Err(RegistryError::InvalidId(schema_id.to_string()));
    }
    Ok(())
}

/// File-backed registry.
pub struct FileRegistry {
    schema_dir: PathBuf,
}

impl FileRegistry {
    /// Directory used when none is configured
    pub const DEFAULT_DIR: &'static str = ".registry";

    /// Opens a registry rooted at `schema_dir`, creating the directory if needed.
    pub fn open(schema_dir: impl AsRef<Path>) -> RegistryResult<Self> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        fs::create_dir_all(&schema_dir).map_err(|e| RegistryError::io(&schema_dir, e))?;
        Ok(Self { schema_dir })
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    fn schema_path(&self, schema_id: &str, schema_version: u32) -> RegistryResult<PathBuf> {
        check_schema_id(schema_id)?;
        Ok(self
            .schema_dir
            .join(format!("{}_{}.json", schema_id, schema_version)))
    }

    fn read_definition(path: &Path) -> RegistryResult<Value> {
        let content = fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| RegistryError::Malformed {
            path: path.display().to_string(),
            reason: format!("Invalid JSON: {}", e),
        })
    }

    /// Stores a schema and returns its version.
    ///
    /// Registering the identical definition again is a no-op; a different
    /// definition for an existing (id, version) is rejected.
    pub fn register(&self, schema: &StoredSchema) -> RegistryResult<u32> {
        let path = self.schema_path(&schema.schema_id, schema.schema_version)?;

        if path.exists() {
            let existing = Self::read_definition(&path)?;
            if existing == schema.definition {
                debug!(
                    schema_id = %schema.schema_id,
                    schema_version = schema.schema_version,
                    "schema already registered"
                );
                return Ok(schema.schema_version);
            }
            return Err(RegistryError::Immutable {
                schema_id: schema.schema_id.clone(),
                schema_version: schema.schema_version,
            });
        }

        let content = serde_json::to_string(&schema.definition).map_err(|e| {
            RegistryError::Malformed {
                path: path.display().to_string(),
                reason: format!("Failed to serialize schema: {}", e),
            }
        })?;
        fs::write(&path, content).map_err(|e| RegistryError::io(&path, e))?;

        info!(
            schema_id = %schema.schema_id,
            schema_version = schema.schema_version,
            fingerprint = %schema.fingerprint(),
            "schema registered"
        );
        Ok(schema.schema_version)
    }

    /// Lists the registered versions of a schema id, ascending.
    pub fn versions(&self, schema_id: &str) -> RegistryResult<Vec<u32>> {
        check_schema_id(schema_id)?;

        let entries =
            fs::read_dir(&self.schema_dir).map_err(|e| RegistryError::io(&self.schema_dir, e))?;

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RegistryError::io(&self.schema_dir, e))?;
            let file_name = entry.file_name();
            let Some(stem) = file_name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            let Some((id, version)) = stem.rsplit_once('_') else {
                continue;
            };
            if id != schema_id {
                continue;
            }
            if let Ok(version) = version.parse::<u32>() {
                versions.push(version);
            }
        }

        versions.sort_unstable();
        Ok(versions)
    }

    /// Fetches the highest registered version of a schema id.
    pub fn latest(&self, schema_id: &str) -> RegistryResult<StoredSchema> {
        let version = self
            .versions(schema_id)?
            .pop()
            .ok_or_else(|| RegistryError::NoVersions(schema_id.to_string()))?;
        self.fetch(schema_id, version)
    }
}

impl SchemaRegistry for FileRegistry {
    fn fetch(&self, schema_id: &str, schema_version: u32) -> RegistryResult<StoredSchema> {
        let path = self.schema_path(schema_id, schema_version)?;

        if !path.exists() {
            return Err(RegistryError::NotFound {
                schema_id: schema_id.to_string(),
                schema_version,
            });
        }

        let definition = Self::read_definition(&path)?;
        Ok(StoredSchema::new(schema_id, definition, schema_version))
    }
}

/// In-memory registry with the same immutability rules as [`FileRegistry`].
#[derive(Default)]
pub struct MemoryRegistry {
    schemas: RwLock<HashMap<(String, u32), StoredSchema>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a schema and returns its version.
    pub fn register(&self, schema: StoredSchema) -> RegistryResult<u32> {
        check_schema_id(&schema.schema_id)?;

        let mut schemas = self.schemas.write().map_err(|_| RegistryError::poisoned())?;
        let key = (schema.schema_id.clone(), schema.schema_version);

        if let Some(existing) = schemas.get(&key) {
            if existing.definition == schema.definition {
                return Ok(schema.schema_version);
            }
            return Err(RegistryError::Immutable {
                schema_id: schema.schema_id,
                schema_version: schema.schema_version,
            });
        }

        let version = schema.schema_version;
        schemas.insert(key, schema);
        Ok(version)
    }

    /// Returns the number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SchemaRegistry for MemoryRegistry {
    fn fetch(&self, schema_id: &str, schema_version: u32) -> RegistryResult<StoredSchema> {
        let schemas = self.schemas.read().map_err(|_| RegistryError::poisoned())?;
        schemas
            .get(&(schema_id.to_string(), schema_version))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                schema_id: schema_id.to_string(),
                schema_version,
            })
    }
}
