//! Record store configuration

use serde::{Deserialize, Serialize};

/// Per-store configuration.
///
/// All fields are optional when deserialized; missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Flush file data to disk after every rewrite (default: true)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    /// Terminate the document with a newline (default: true)
    #[serde(default = "default_trailing_newline")]
    pub trailing_newline: bool,
}

fn default_sync_writes() -> bool {
    true
}

fn default_trailing_newline() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sync_writes: default_sync_writes(),
            trailing_newline: default_trailing_newline(),
        }
    }
}

impl StoreConfig {
    /// Config that skips the per-rewrite data sync.
    ///
    /// Rewrites still reach the OS, they are just not forced to disk.
    pub fn unsynced() -> Self {
        Self {
            sync_writes: false,
            ..Default::default()
        }
    }
}
