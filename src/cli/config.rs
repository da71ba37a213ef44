//! Configuration file
//!
//! ```json
//! { "registry_dir": ".registry", "strict_numbers": true, "log_filter": "warn" }
//! ```
//!
//! Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::schema::FileRegistry;
use crate::shape::ValidationOptions;

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema registry directory (default ".registry")
    #[serde(default = "default_registry_dir")]
    pub registry_dir: String,

    /// Reject numeric strings for numeric types (default true)
    #[serde(default = "default_strict_numbers")]
    pub strict_numbers: bool,

    /// Tracing filter directive, overridden by AVROGATE_LOG (default "warn")
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_registry_dir() -> String {
    FileRegistry::DEFAULT_DIR.to_string()
}
fn default_strict_numbers() -> bool {
    true
}
fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_dir: default_registry_dir(),
            strict_numbers: default_strict_numbers(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.registry_dir.trim().is_empty() {
            return Err(CliError::config_error("registry_dir must not be empty"));
        }

        if self.log_filter.trim().is_empty() {
            return Err(CliError::config_error("log_filter must not be empty"));
        }

        Ok(())
    }

    /// Get the registry directory as a Path
    pub fn registry_path(&self) -> PathBuf {
        PathBuf::from(&self.registry_dir)
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            strict_numbers: self.strict_numbers,
        }
    }
}
