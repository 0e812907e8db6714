//! JSONL file writer for audit events.
//!
//! Each [`AuditEvent`] is serialized as a single JSON line with a `type`
//! field and `timestamp`, appended to the file via a buffered writer.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use warden_application::{AuditEvent, AuditLogger};

/// JSONL audit logger that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every record
/// and on `Drop`.
pub struct JsonlAuditLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlAuditLogger {
    /// Open (or create) the log at `path` for appending.
    ///
    /// Creates parent directories as needed. Returns `None` if the file
    /// cannot be opened; auditing is then skipped rather than failing the
    /// run.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create audit log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open audit log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn to_record(event: AuditEvent) -> serde_json::Value {
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    match event.payload {
        serde_json::Value::Object(mut map) => {
            map.insert("type".to_string(), event.event_type.into());
            map.insert("timestamp".to_string(), timestamp.into());
            serde_json::Value::Object(map)
        }
        other => serde_json::json!({
            "type": event.event_type,
            "timestamp": timestamp,
            "data": other,
        }),
    }
}

impl AuditLogger for JsonlAuditLogger {
    fn log(&self, event: AuditEvent) {
        let Ok(line) = serde_json::to_string(&to_record(event)) else {
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Failed to write audit record to {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for JsonlAuditLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_domain::{
        ConfirmationDecision, ConfirmationRequest, ConfirmationRequestId, InvocationState,
        PolicyAction, RiskLevel, ToolResult,
    };

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_lifecycle_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();

        let request = ConfirmationRequest::new("write_file", RiskLevel::High)
            .with_locations(vec!["config.toml".to_string()])
            .with_id(ConfirmationRequestId::new(7));
        let call_id = Some("call_1");
        logger.log(AuditEvent::policy_decision(
            "write_file",
            call_id,
            PolicyAction::Ask,
            Some("rule #2"),
        ));
        logger.log(AuditEvent::confirmation_requested(&request, call_id));
        logger.log(AuditEvent::confirmation_resolved(
            &request,
            call_id,
            ConfirmationDecision::Approved,
        ));
        logger.log(AuditEvent::tool_completed(
            &ToolResult::success("write_file", "ok"),
            call_id,
            InvocationState::Succeeded,
            12,
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 4);
        for record in &records {
            assert!(record["timestamp"].as_str().unwrap().ends_with('Z'));
            assert_eq!(record["call_id"], "call_1");
        }
        assert_eq!(records[0]["type"], "policy_decision");
        assert_eq!(records[0]["tool"], "write_file");
        assert_eq!(records[0]["action"], "ask");
        assert_eq!(records[1]["type"], "confirmation_requested");
        assert_eq!(records[1]["risk"], "high");
        assert_eq!(records[1]["request_id"], 7);
        assert_eq!(records[2]["type"], "confirmation_resolved");
        assert_eq!(records[2]["request_id"], 7);
        assert_eq!(records[3]["type"], "tool_completed");
    }

    #[test]
    fn test_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");

        for _ in 0..2 {
            let logger = JsonlAuditLogger::new(&path).unwrap();
            logger.log(AuditEvent::new("ping", serde_json::json!({})));
        }

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_non_object_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();

        logger.log(AuditEvent::new("note", serde_json::json!("just a string")));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records[0]["type"], "note");
        assert_eq!(records[0]["data"], "just a string");
    }
}
