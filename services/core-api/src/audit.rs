//! Append-only audit trail.
//!
//! One line per event: `<timestamp> - <LEVEL> - <message>`. Lines are never
//! read back by the service.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Queries longer than this are cut in brain-action lines.
pub const QUERY_PREVIEW_CHARS: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AuditLevel {
    Info,
    Warning,
    Error,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::Info => "INFO",
            AuditLevel::Warning => "WARNING",
            AuditLevel::Error => "ERROR",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub event_type: String,
    pub level: AuditLevel,
    /// Rendered in insertion order.
    pub details: Vec<(String, JsonValue)>,
}

impl AuditEvent {
    pub fn new(event_type: impl Into<String>, level: AuditLevel) -> Self {
        Self {
            event_type: event_type.into(),
            level,
            details: vec![],
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    pub fn detail(&self, key: &str) -> Option<&JsonValue> {
        self.details.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn dataset_upload(filename: &str, size: u64, checksum: &str, path: &Path) -> Self {
        Self::new("dataset_upload", AuditLevel::Info)
            .with("file", filename)
            .with("size", size)
            .with("sha256", checksum)
            .with("path", path.display().to_string())
    }

    pub fn dataset_rejected(filename: &str, size: usize, reason: &str) -> Self {
        Self::new("dataset_rejected", AuditLevel::Warning)
            .with("file", filename)
            .with("size", size)
            .with("reason", reason)
    }

    /// The upload was valid but could not be written to the dataset store.
    pub fn dataset_store_failed(filename: &str, size: u64, reason: &str) -> Self {
        Self::new("dataset_store_failed", AuditLevel::Error)
            .with("file", filename)
            .with("size", size)
            .with("reason", reason)
    }

    pub fn repo_sync(commit_sha: &str) -> Self {
        Self::new("repo_sync", AuditLevel::Info).with("commit", commit_sha)
    }

    pub fn repo_sync_failed(reason: &str) -> Self {
        Self::new("repo_sync_failed", AuditLevel::Error).with("reason", reason)
    }

    /// Access decision taken on behalf of an agent query.
    pub fn brain_action(user_id: &str, segment: &str, query: &str, success: bool) -> Self {
        let status = if success { "GRANTED" } else { "DENIED" };
        let preview: String = query.chars().take(QUERY_PREVIEW_CHARS).collect();

        let level = if success { AuditLevel::Info } else { AuditLevel::Warning };
        Self::new("brain_action", level)
            .with("user", user_id)
            .with("dept", segment)
            .with("status", status)
            .with("query", preview)
    }

    /// `EVENT: <type> | KEY: value | ...`, flattened to a single line.
    pub fn message(&self) -> String {
        let mut out = format!("EVENT: {}", self.event_type);
        for (key, value) in &self.details {
            let value = match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            out.push_str(&format!(" | {}: {}", key.to_ascii_uppercase(), value));
        }
        out.replace(['\r', '\n'], " ")
    }
}

pub fn format_line(event: &AuditEvent, at: DateTime<Utc>) -> String {
    format!(
        "{} - {} - {}\n",
        at.format("%Y-%m-%d %H:%M:%S,%3f"),
        event.level.as_str(),
        event.message()
    )
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> io::Result<()>;
}

/// Opened once at startup in append mode; every event is one `write_all`.
/// `record` blocks, so async callers go through `AppState::record`.
pub struct FileAuditSink {
    path: PathBuf,
    file: File,
}

impl FileAuditSink {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &AuditEvent) -> io::Result<()> {
        let line = format_line(event, Utc::now());
        (&self.file).write_all(line.as_bytes())
    }
}

/// Keeps events in memory (for testing).
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) -> io::Result<()> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_brain_action_granted() {
        let ev = AuditEvent::brain_action("user123", "sales", "test query", true);
        let msg = ev.message();
        assert!(msg.contains("USER: user123"));
        assert!(msg.contains("DEPT: sales"));
        assert!(msg.contains("STATUS: GRANTED"));
        assert_eq!(ev.level, AuditLevel::Info);
    }

    #[test]
    fn test_brain_action_denied() {
        let ev = AuditEvent::brain_action("user456", "finance", "test query", false);
        let msg = ev.message();
        assert!(msg.contains("user456"));
        assert!(msg.contains("finance"));
        assert!(msg.contains("DENIED"));
    }

    #[test]
    fn test_brain_action_truncates_query() {
        let long_query = "a".repeat(100);
        let ev = AuditEvent::brain_action("user789", "ops", &long_query, true);
        let msg = ev.message();
        assert!(msg.contains(&long_query[..50]));
        assert!(!msg.contains(&long_query[..51]));
    }

    #[test]
    fn test_line_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        let ev = AuditEvent::dataset_upload("sales.csv", 12, "abc123", Path::new("/data/sales/v1.csv"));
        assert_eq!(
            format_line(&ev, at),
            "2024-03-01 12:30:05,000 - INFO - EVENT: dataset_upload | FILE: sales.csv | SIZE: 12 | SHA256: abc123 | PATH: /data/sales/v1.csv\n"
        );
    }

    #[test]
    fn test_store_failure_is_error_level() {
        let ev = AuditEvent::dataset_store_failed("sales.csv", 20, "Failed to write /data/sales/v1.csv");
        assert_eq!(ev.level, AuditLevel::Error);
        assert_eq!(
            ev.message(),
            "EVENT: dataset_store_failed | FILE: sales.csv | SIZE: 20 | REASON: Failed to write /data/sales/v1.csv"
        );
    }

    #[test]
    fn test_message_stays_on_one_line() {
        let ev = AuditEvent::repo_sync_failed("fatal: bad\nrevision\r\n");
        assert!(!ev.message().contains('\n'));
        assert!(!ev.message().contains('\r'));
    }

    #[test]
    fn test_file_sink_appends() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs/audit.log");

        let sink = FileAuditSink::open(&path).unwrap();
        sink.record(&AuditEvent::repo_sync("deadbeef")).unwrap();
        sink.record(&AuditEvent::dataset_rejected("x.txt", 3, "Only .csv files are accepted")).unwrap();
        drop(sink);

        // reopening keeps earlier lines
        let sink = FileAuditSink::open(&path).unwrap();
        sink.record(&AuditEvent::brain_action("u", "ops", "q", false)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(" - INFO - EVENT: repo_sync | COMMIT: deadbeef"));
        assert!(lines[1].contains(" - WARNING - EVENT: dataset_rejected"));
        assert!(lines[2].contains("STATUS: DENIED"));
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemoryAuditSink::new();
        sink.record(&AuditEvent::repo_sync("abc")).unwrap();
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detail("commit"), Some(&JsonValue::from("abc")));
    }
}
