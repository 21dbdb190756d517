//! Observability for replica-rebuild
//!
//! Structured JSON log lines for every command, stage and workflow
//! transition. Human-facing output (banners, SQL, manual steps) is printed
//! separately by the CLI and stage modules.
//!
//! ```ignore
//! use replica_rebuild::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::SqlWritten, &[("path", "/tmp/configure_replication.sql")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{format_line, Logger, Severity};
pub use scope::ObservationScope;

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
