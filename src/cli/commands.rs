//! CLI command implementations
//!
//! Each invocation connects to the table file, initializes the store, runs
//! one operation and closes the store again.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::store::{RecordStore, StoreConfig};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{parse_record, read_request, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store behavior (optional, all fields defaulted)
    #[serde(default)]
    pub store: StoreConfig,

    /// Minimum log severity (optional, default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Configuration used when no file is given
    pub fn defaults() -> Self {
        Self {
            store: StoreConfig::default(),
            log_level: default_log_level(),
        }
    }

    fn validate(&self) -> CliResult<()> {
        self.severity().map(|_| ())
    }

    /// Parsed log level
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse::<Severity>()
            .map_err(CliError::config_error)
    }
}

/// Parse arguments, run the command and print its response
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli)
}

/// Run a parsed command and print its response
pub fn run_command(cli: Cli) -> CliResult<()> {
    let data = execute(&cli)?;
    write_response(data)
}

/// Run a parsed command and return its response data
pub fn execute(cli: &Cli) -> CliResult<Value> {
    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            Logger::set_min_severity(config.severity()?);
            log_event_with_fields(
                Event::ConfigLoaded,
                &[("path", path.display().to_string().as_str())],
            );
            config
        }
        None => {
            let config = Config::defaults();
            Logger::set_min_severity(config.severity()?);
            config
        }
    };

    let store: RecordStore<Value> = RecordStore::connect_with_config(&cli.file, config.store)?;
    store.init()?;

    let result = dispatch(&store, &cli.command);
    let closed = store.close();

    // An operation error takes precedence over a close error.
    let data = result?;
    closed?;
    Ok(data)
}

fn dispatch(store: &RecordStore<Value>, command: &Command) -> CliResult<Value> {
    match command {
        Command::List => list(store),
        Command::Count => count(store),
        Command::Append { record, unique } => {
            append(store, record_input(record.as_deref())?, unique.as_deref())
        }
        Command::Update { index, record } => {
            update(store, *index, record_input(record.as_deref())?)
        }
        Command::Delete { index } => delete(store, *index),
    }
}

fn record_input(arg: Option<&str>) -> CliResult<Value> {
    match arg {
        Some(raw) => parse_record(raw),
        None => read_request(),
    }
}

/// Every record in table order
pub fn list(store: &RecordStore<Value>) -> CliResult<Value> {
    Ok(Value::Array(store.read_all()?))
}

/// Number of records
pub fn count(store: &RecordStore<Value>) -> CliResult<Value> {
    Ok(json!({ "count": store.len()? }))
}

/// Append a record, optionally rejecting duplicates on `unique`.
///
/// The duplicate check is a read followed by an append; it is only
/// race-free when this process is the table's sole writer.
pub fn append(store: &RecordStore<Value>, record: Value, unique: Option<&str>) -> CliResult<Value> {
    if let Some(field) = unique {
        let key = record.get(field).cloned().ok_or_else(|| {
            CliError::invalid_input(format!("Record has no field '{}'", field))
        })?;

        let existing = store.read_all()?;
        if existing.iter().any(|r| r.get(field) == Some(&key)) {
            return Err(CliError::conflict(field, &key));
        }
    }

    store.append(record)?;
    Ok(json!({ "index": store.len()? - 1 }))
}

/// Replace the record at `index`
pub fn update(store: &RecordStore<Value>, index: usize, record: Value) -> CliResult<Value> {
    store.update(index, record)?;
    Ok(json!({ "index": index }))
}

/// Remove the record at `index`
pub fn delete(store: &RecordStore<Value>, index: usize) -> CliResult<Value> {
    store.delete(index)?;
    Ok(json!({ "index": index, "count": store.len()? }))
}
