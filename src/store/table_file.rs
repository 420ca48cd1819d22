//! Table file: the single durable backing store of a record table
//!
//! The file holds exactly one compact JSON array. Every mutation replaces
//! the whole document:
//!
//! 1. Encode the full table
//! 2. Seek to start, truncate to zero
//! 3. Write the encoded document
//! 4. `sync_data` (when `sync_writes` is on)
//!
//! A crash between steps 2 and 3 can leave the file empty or truncated.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::config::StoreConfig;
use super::errors::{StoreError, StoreResult};

/// Exclusive owner of the open table file.
#[derive(Debug)]
pub struct TableFile {
    /// Path the file was opened from
    path: PathBuf,
    /// Underlying file handle, read + write
    file: File,
    /// Rewrite behavior
    config: StoreConfig,
}

impl TableFile {
    /// Opens or creates the table file for read and write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be created or opened.
    pub fn open(path: &Path, config: StoreConfig) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                StoreError::io(format!("Failed to open table file: {}", path.display()), e)
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            config,
        })
    }

    /// Returns the path to the table file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the whole table from the start of the file.
    ///
    /// An empty or whitespace-only file decodes to an empty table.
    pub fn read_table<T: DeserializeOwned>(&mut self) -> StoreResult<Vec<T>> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| StoreError::io("Failed to seek table file", e))?;

        let mut data = Vec::new();
        self.file
            .read_to_end(&mut data)
            .map_err(|e| StoreError::io("Failed to read table file", e))?;

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&data).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Replaces the file contents with the encoded table.
    ///
    /// Encoding happens before the file is touched, so a record that fails
    /// to serialize leaves the previous document intact.
    ///
    /// Returns the number of bytes written.
    pub fn rewrite<T: Serialize>(&mut self, table: &[T]) -> StoreResult<u64> {
        let mut encoded = serde_json::to_vec(table).map_err(StoreError::Serialization)?;
        if self.config.trailing_newline {
            encoded.push(b'\n');
        }

        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| StoreError::io("Failed to seek table file", e))?;
        self.file
            .set_len(0)
            .map_err(|e| StoreError::io("Failed to truncate table file", e))?;
        self.file
            .write_all(&encoded)
            .map_err(|e| StoreError::io("Failed to write table file", e))?;

        if self.config.sync_writes {
            self.file
                .sync_data()
                .map_err(|e| StoreError::io("fsync failed after table rewrite", e))?;
        }

        Ok(encoded.len() as u64)
    }

    /// Flushes everything to disk and closes the handle.
    pub fn close(self) -> StoreResult<()> {
        self.file
            .sync_all()
            .map_err(|e| StoreError::io("Failed to flush table file on close", e))
    }
}
