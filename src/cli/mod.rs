//! CLI module for jsondb
//!
//! Provides a command-line interface over a single table file of JSON
//! values:
//! - list / count: read the table
//! - append: add a record, with an optional uniqueness check on one field
//! - update / delete: address a record by index

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{append, count, delete, execute, list, run, run_command, update, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_record, read_request, write_error, write_response};
