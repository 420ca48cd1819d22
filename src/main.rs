//! jsondb CLI entry point
//!
//! Parses arguments, runs one command against the table file, prints a
//! JSON response and exits non-zero on failure. All logic lives in the CLI
//! module.

use jsondb::cli;

fn main() {
    if let Err(e) = cli::run() {
        if cli::write_error(e.code_str(), e.message()).is_err() {
            eprintln!("{}", e);
        }
        std::process::exit(1);
    }
}
