//! CLI command implementations
//!
//! Each command loads the config, installs logging, performs one
//! operation, and writes a single JSON response to stdout.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tracing::info;

use crate::codec::AvroCodec;
use crate::observability::init_tracing;
use crate::pipeline::{PipelineError, ValidateAndSerialize};
use crate::schema::{FileRegistry, StoredSchema};
use crate::shape::ShapeCompiler;

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command. Failures
/// are reported on stdout as an error response before being returned.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command).map_err(|e| {
        // stdout may already be gone; the caller still reports on stderr
        let _ = write_error(e.code_str(), e.message());
        e
    })
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Register {
            config,
            id,
            schema_version,
            schema,
        } => register(&config, &id, schema_version, &schema),
        Command::Validate {
            config,
            id,
            schema_version,
        } => validate(&config, &id, schema_version),
        Command::Encode {
            config,
            id,
            schema_version,
        } => encode(&config, &id, schema_version),
    }
}

/// Create the registry directory
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    write_response(init_registry(&config)?)
}

/// Store a schema definition file under (id, version)
pub fn register(
    config_path: &Path,
    schema_id: &str,
    schema_version: u32,
    schema_path: &Path,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let content = fs::read_to_string(schema_path).map_err(|e| {
        CliError::io_error(format!("Failed to read schema {:?}: {}", schema_path, e))
    })?;
    let definition: Value = serde_json::from_str(&content)?;

    write_response(register_schema(&config, schema_id, schema_version, definition)?)
}

/// Validate a stdin document and print its canonical form
pub fn validate(config_path: &Path, schema_id: &str, schema_version: u32) -> CliResult<()> {
    let config = load_config(config_path)?;
    let raw = read_request()?;
    write_response(validate_document(&config, schema_id, schema_version, &raw)?)
}

/// Validate and encode a stdin document
pub fn encode(config_path: &Path, schema_id: &str, schema_version: u32) -> CliResult<()> {
    let config = load_config(config_path)?;
    let raw = read_request()?;
    write_response(encode_document(&config, schema_id, schema_version, &raw)?)
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    init_tracing(&config.log_filter);
    Ok(config)
}

fn open_registry(config: &Config) -> CliResult<FileRegistry> {
    let dir = config.registry_path();
    if !dir.is_dir() {
        return Err(CliError::not_initialized());
    }
    Ok(FileRegistry::open(dir)?)
}

fn pipeline(config: &Config) -> CliResult<ValidateAndSerialize<FileRegistry, AvroCodec>> {
    Ok(ValidateAndSerialize::new(open_registry(config)?, AvroCodec::new())
        .with_options(config.validation_options()))
}

fn init_registry(config: &Config) -> CliResult<Value> {
    let dir = config.registry_path();
    let created = !dir.exists();
    let registry = FileRegistry::open(&dir)?;

    info!(registry_dir = %registry.schema_dir().display(), created, "registry initialized");
    Ok(json!({
        "initialized": true,
        "created": created,
        "registry_dir": config.registry_dir,
    }))
}

/// Registers a definition after checking that it compiles.
fn register_schema(
    config: &Config,
    schema_id: &str,
    schema_version: u32,
    definition: Value,
) -> CliResult<Value> {
    let registry = open_registry(config)?;

    ShapeCompiler::new().compile(&definition).map_err(|e| {
        PipelineError::SchemaValidation(e.with_schema(schema_id, schema_version))
    })?;

    let stored = StoredSchema::new(schema_id, definition, schema_version);
    registry.register(&stored)?;

    Ok(json!({
        "schema_id": stored.schema_id,
        "schema_version": stored.schema_version,
        "fingerprint": stored.fingerprint(),
    }))
}

fn validate_document(
    config: &Config,
    schema_id: &str,
    schema_version: u32,
    raw: &Value,
) -> CliResult<Value> {
    let datum = pipeline(config)?.validate(raw, schema_id, schema_version)?;
    Ok(datum.to_json())
}

fn encode_document(
    config: &Config,
    schema_id: &str,
    schema_version: u32,
    raw: &Value,
) -> CliResult<Value> {
    let bytes = pipeline(config)?.execute(raw, schema_id, schema_version)?;
    Ok(json!({
        "bytes": STANDARD.encode(&bytes),
        "length": bytes.len(),
    }))
}
