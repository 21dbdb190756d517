//! Structured JSON logger
//!
//! - One log line = one event
//! - Deterministic key ordering: event, severity, ts, then fields by key
//! - Synchronous, no buffering
//! - TRACE suppressed unless verbose
//! - Optional append-only file sink next to stdout/stderr

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use chrono::{SecondsFormat, Utc};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Rendered commands and other detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Destructive or unusual actions
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, process exits
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn goes_to_stderr(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Process-wide logger settings, installed once by the CLI.
pub struct LogSink {
    verbose: bool,
    run_id: String,
    file: Option<Mutex<File>>,
}

impl LogSink {
    /// Open the sink. The log file, if any, is opened for appending.
    pub fn new(verbose: bool, run_id: &str, log_file: Option<&Path>) -> io::Result<Self> {
        let file = match log_file {
            Some(path) => Some(Mutex::new(
                OpenOptions::new().create(true).append(true).open(path)?,
            )),
            None => None,
        };

        Ok(Self {
            verbose,
            run_id: run_id.to_string(),
            file,
        })
    }
}

static SINK: OnceLock<LogSink> = OnceLock::new();

/// A structured logger that outputs JSON lines
pub struct Logger;

impl Logger {
    /// Install process-wide settings.
    ///
    /// Only the first call takes effect. Returns an error if the log file
    /// cannot be opened for appending.
    pub fn init(verbose: bool, run_id: &str, log_file: Option<&Path>) -> io::Result<()> {
        let _ = SINK.set(LogSink::new(verbose, run_id, log_file)?);
        Ok(())
    }

    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        Self::log_to_writers(
            SINK.get(),
            severity,
            event,
            fields,
            &mut io::stdout(),
            &mut io::stderr(),
        );
    }

    /// Route one line: TRACE is dropped unless verbose, ERROR and above go
    /// to `err`, everything else to `out`, and every line to the file sink.
    fn log_to_writers<O: Write, E: Write>(
        sink: Option<&LogSink>,
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        out: &mut O,
        err: &mut E,
    ) {
        if severity == Severity::Trace && !sink.map(|s| s.verbose).unwrap_or(false) {
            return;
        }

        let mut all_fields: Vec<(&str, &str)> = fields.to_vec();
        if let Some(sink) = sink {
            all_fields.push(("run_id", sink.run_id.as_str()));
        }

        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let line = format_line(severity, event, &ts, &all_fields);

        // Write each line in one call
        if severity.goes_to_stderr() {
            let _ = err.write_all(line.as_bytes());
            let _ = err.flush();
        } else {
            let _ = out.write_all(line.as_bytes());
            let _ = out.flush();
        }

        if let Some(file) = sink.and_then(|s| s.file.as_ref()) {
            if let Ok(mut f) = file.lock() {
                let _ = f.write_all(line.as_bytes());
            }
        }
    }

    /// Log at TRACE level
    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    /// Log at FATAL level
    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
    }
}

/// Build one JSON log line, newline-terminated.
///
/// Built by hand so key order stays fixed.
pub fn format_line(severity: Severity, event: &str, ts: &str, fields: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(256);

    output.push_str("{\"event\":\"");
    escape_json_string(&mut output, event);
    output.push_str("\",\"severity\":\"");
    output.push_str(severity.as_str());
    output.push_str("\",\"ts\":\"");
    escape_json_string(&mut output, ts);
    output.push('"');

    let mut sorted_fields: Vec<_> = fields.iter().collect();
    sorted_fields.sort_by_key(|(k, _)| *k);

    for (key, value) in sorted_fields {
        output.push_str(",\"");
        escape_json_string(&mut output, key);
        output.push_str("\":\"");
        escape_json_string(&mut output, value);
        output.push('"');
    }

    output.push_str("}\n");
    output
}

fn escape_json_string(output: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => {
                output.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => output.push(c),
        }
    }
}

/// Capture routed output as (stdout, stderr) for testing
#[cfg(test)]
pub fn capture_log(
    sink: Option<&LogSink>,
    severity: Severity,
    event: &str,
    fields: &[(&str, &str)],
) -> (String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    Logger::log_to_writers(sink, severity, event, fields, &mut out, &mut err);
    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TS: &str = "2026-01-01T00:00:00.000Z";

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_errors_route_to_stderr() {
        assert!(!Severity::Warn.goes_to_stderr());
        assert!(Severity::Error.goes_to_stderr());
        assert!(Severity::Fatal.goes_to_stderr());
    }

    #[test]
    fn test_log_json_format() {
        let output = format_line(Severity::Info, "STAGE_BEGIN", TS, &[]);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "STAGE_BEGIN");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["ts"], TS);
    }

    #[test]
    fn test_log_deterministic_ordering() {
        let output1 = format_line(
            Severity::Info,
            "TEST",
            TS,
            &[("zebra", "1"), ("apple", "2"), ("mango", "3")],
        );
        let output2 = format_line(
            Severity::Info,
            "TEST",
            TS,
            &[("apple", "2"), ("mango", "3"), ("zebra", "1")],
        );
        assert_eq!(output1, output2);

        let apple_pos = output1.find("apple").unwrap();
        let mango_pos = output1.find("mango").unwrap();
        let zebra_pos = output1.find("zebra").unwrap();
        assert!(apple_pos < mango_pos);
        assert!(mango_pos < zebra_pos);

        let event_pos = output1.find("\"event\"").unwrap();
        let ts_pos = output1.find("\"ts\"").unwrap();
        assert!(event_pos < ts_pos);
        assert!(ts_pos < apple_pos);
    }

    #[test]
    fn test_log_escapes_captured_stderr() {
        let output = format_line(
            Severity::Error,
            "COMMAND_FAILED",
            TS,
            &[("stderr", "Failed to stop \"mysqld@mysql1\"\n\tunit not loaded")],
        );

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            parsed["stderr"],
            "Failed to stop \"mysqld@mysql1\"\n\tunit not loaded"
        );
        assert_eq!(output.chars().filter(|c| *c == '\n').count(), 1);
    }

    #[test]
    fn test_trace_dropped_unless_verbose() {
        let quiet = LogSink::new(false, "run-1", None).unwrap();
        let verbose = LogSink::new(true, "run-1", None).unwrap();
        let fields = [("command", "sudo mkdir -p /u01/data")];

        assert_eq!(
            capture_log(Some(&quiet), Severity::Trace, "COMMAND_LINE", &fields),
            (String::new(), String::new())
        );
        assert_eq!(
            capture_log(None, Severity::Trace, "COMMAND_LINE", &fields),
            (String::new(), String::new())
        );

        let (out, err) = capture_log(Some(&verbose), Severity::Trace, "COMMAND_LINE", &fields);
        assert!(out.contains("\"event\":\"COMMAND_LINE\""));
        assert!(err.is_empty());
    }

    #[test]
    fn test_errors_written_to_stderr_only() {
        let sink = LogSink::new(false, "run-1", None).unwrap();

        let (out, err) = capture_log(Some(&sink), Severity::Error, "COMMAND_FAILED", &[]);
        assert!(out.is_empty());
        assert!(err.contains("COMMAND_FAILED"));

        let (out, err) = capture_log(Some(&sink), Severity::Warn, "DESTRUCTIVE_WARNING", &[]);
        assert!(out.contains("DESTRUCTIVE_WARNING"));
        assert!(err.is_empty());
    }

    #[test]
    fn test_file_sink_receives_every_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.log");
        let sink = LogSink::new(true, "run-1", Some(&path)).unwrap();

        capture_log(Some(&sink), Severity::Info, "RUN_START", &[]);
        capture_log(Some(&sink), Severity::Trace, "COMMAND_LINE", &[]);
        capture_log(Some(&sink), Severity::Fatal, "WORKFLOW_FAILED", &[]);

        let content = std::fs::read_to_string(&path).unwrap();
        let events: Vec<String> = content
            .lines()
            .map(|l| {
                let v: serde_json::Value = serde_json::from_str(l).unwrap();
                v["event"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(events, vec!["RUN_START", "COMMAND_LINE", "WORKFLOW_FAILED"]);
    }

    #[test]
    fn test_quiet_file_sink_skips_trace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.log");
        let sink = LogSink::new(false, "run-1", Some(&path)).unwrap();

        capture_log(Some(&sink), Severity::Trace, "COMMAND_LINE", &[]);
        capture_log(Some(&sink), Severity::Info, "COMMAND_OK", &[]);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("COMMAND_OK"));
    }

    #[test]
    fn test_run_id_on_every_line() {
        let sink = LogSink::new(false, "5f0c1e2a-run", None).unwrap();

        for (severity, event) in [
            (Severity::Info, "RUN_START"),
            (Severity::Warn, "COMMAND_FAILED"),
            (Severity::Error, "COMMAND_FAILED"),
        ] {
            let (out, err) = capture_log(Some(&sink), severity, event, &[("stage", "3")]);
            let line = if out.is_empty() { err } else { out };
            let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert_eq!(parsed["run_id"], "5f0c1e2a-run");
            assert_eq!(parsed["stage"], "3");
        }
    }

    #[test]
    fn test_unwritable_log_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("run.log");
        assert!(LogSink::new(false, "run-1", Some(&path)).is_err());
    }
}
