//! Single-table JSON record store
//!
//! A table is an ordered sequence of records of one type, persisted as a
//! single compact JSON array in one file.
//!
//! # Design Principles
//!
//! - Whole-document rewrite on every mutation (truncate, write, sync)
//! - One request queue, one worker: at most one operation in flight
//! - Index is the only addressing scheme
//! - Errors are returned, never retried, never logged
//!
//! # Invariants
//!
//! - After a successful operation the cached table equals the decoded file
//! - A failed append/update/delete may leave the cache ahead of the file;
//!   `reload` resynchronizes
//! - A crash between truncate and write can leave the file empty

mod config;
mod errors;
mod record_store;
mod table_file;
mod worker;

pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use record_store::{RecordStore, StoreState};
pub use table_file::TableFile;
