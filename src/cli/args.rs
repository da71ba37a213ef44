//! CLI argument definitions using clap
//!
//! Commands:
//! - avrogate init --config <path>
//! - avrogate register --config <path> --id <id> --schema-version <n> --schema <file>
//! - avrogate validate --config <path> --id <id> --schema-version <n>
//! - avrogate encode --config <path> --id <id> --schema-version <n>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// avrogate - validate JSON documents against registered Avro schemas and encode them
#[derive(Parser, Debug)]
#[command(name = "avrogate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the schema registry directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./avrogate.json")]
        config: PathBuf,
    },

    /// Register a schema definition under an id and version
    Register {
        /// Path to configuration file
        #[arg(long, default_value = "./avrogate.json")]
        config: PathBuf,

        /// Schema identifier
        #[arg(long)]
        id: String,

        /// Schema version
        #[arg(long = "schema-version")]
        schema_version: u32,

        /// File holding the schema definition JSON
        #[arg(long)]
        schema: PathBuf,
    },

    /// Validate one JSON document from stdin and print its canonical form
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./avrogate.json")]
        config: PathBuf,

        /// Schema identifier
        #[arg(long)]
        id: String,

        /// Schema version
        #[arg(long = "schema-version")]
        schema_version: u32,
    },

    /// Validate one JSON document from stdin and print its Avro encoding
    Encode {
        /// Path to configuration file
        #[arg(long, default_value = "./avrogate.json")]
        config: PathBuf,

        /// Schema identifier
        #[arg(long)]
        id: String,

        /// Schema version
        #[arg(long = "schema-version")]
        schema_version: u32,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_args() {
        let cli = Cli::try_parse_from([
            "avrogate", "encode", "--id", "temperature", "--schema-version", "2",
        ])
        .unwrap();

        match cli.command {
            Command::Encode {
                config,
                id,
                schema_version,
            } => {
                assert_eq!(config, PathBuf::from("./avrogate.json"));
                assert_eq!(id, "temperature");
                assert_eq!(schema_version, 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_version_must_be_integer() {
        assert!(Cli::try_parse_from([
            "avrogate", "validate", "--id", "temperature", "--schema-version", "latest",
        ])
        .is_err());
    }
}
