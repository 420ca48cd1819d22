//! Observable events for jsondb
//!
//! Events are explicit and typed. Lifecycle transitions are INFO,
//! per-operation events are TRACE.

use std::fmt;

use super::logger::Severity;

/// Observable events in a record store's life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration file loaded
    ConfigLoaded,
    /// Table file opened or created
    StoreOpened,
    /// Table loaded and worker started
    StoreInitialized,
    /// Table reloaded from file
    StoreReloaded,
    /// Worker stopped and file closed
    StoreClosed,
    /// Whole document rewritten
    TableRewritten,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreInitialized => "STORE_INITIALIZED",
            Event::StoreReloaded => "STORE_RELOADED",
            Event::StoreClosed => "STORE_CLOSED",
            Event::TableRewritten => "TABLE_REWRITTEN",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::TableRewritten => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
