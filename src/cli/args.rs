//! CLI argument definitions using clap
//!
//! Commands:
//! - jsondb --file <path> list
//! - jsondb --file <path> count
//! - jsondb --file <path> append [JSON] [--unique <field>]
//! - jsondb --file <path> update <index> [JSON]
//! - jsondb --file <path> delete <index>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// jsondb - a single-file JSON record table
#[derive(Parser, Debug)]
#[command(name = "jsondb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the table file (created if missing)
    #[arg(long, short = 'f', default_value = "./db.json")]
    pub file: PathBuf,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print every record in order
    List,

    /// Print the number of records
    Count,

    /// Append a record (read from stdin when JSON is omitted)
    Append {
        /// Record as a JSON value
        record: Option<String>,

        /// Reject the record if an existing record has the same value for this field
        #[arg(long)]
        unique: Option<String>,
    },

    /// Replace the record at INDEX (read from stdin when JSON is omitted)
    Update {
        /// Zero-based position of the record
        index: usize,

        /// Replacement record as a JSON value
        record: Option<String>,
    },

    /// Remove the record at INDEX, shifting later records down
    Delete {
        /// Zero-based position of the record
        index: usize,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
