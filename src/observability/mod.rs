//! Observability for jsondb
//!
//! This module provides:
//! - Structured logging (JSON, one line per event, on stderr)
//! - Per-store operation counters
//! - Typed lifecycle events
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on store behavior
//! 3. Errors returned to callers are never logged by the store
//!
//! # Usage
//!
//! ```ignore
//! use jsondb::observability::{log_event_with_fields, Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! Logger::log(Severity::Info, "CUSTOM_EVENT", &[("rows", "42")]);
//! log_event_with_fields(Event::StoreOpened, &[("path", "users.json")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, StoreMetrics};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::StoreOpened, &[("path", "/tmp/test.json")]);
    }
}
