//! CLI module for avrogate
//!
//! Provides command-line interface for:
//! - init: Create the registry directory
//! - register: Store a schema definition
//! - validate: Print the canonical form of a stdin document
//! - encode: Print the Avro encoding of a stdin document

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{encode, init, register, run, run_command, validate};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
