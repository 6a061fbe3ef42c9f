//! Audit logging for lock activity.
//!
//! The manager records every completed lock transition to an append-only
//! NDJSON log (one JSON object per line), so operators can reconstruct who
//! held which datastore and when. Events are written through [`AuditLog`],
//! an explicitly constructed value owned by the manager; nothing here is
//! process-global.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: the transition (lock, unlock, lock_denied, lock_cleared,
//!   session_closed)
//! - `actor`: the process identity (`user@HOST`)
//! - `session`: the client session id, when the event concerns one
//! - `datastore`: the affected datastore, when the event concerns one
//! - `details`: freeform object with action-specific details

use crate::datastore::Datastore;
use crate::error::{LockError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Lock transitions that are logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// A session took a datastore lock.
    Lock,
    /// A session released its datastore lock.
    Unlock,
    /// The backend refused a lock or unlock.
    LockDenied,
    /// A lock was cleared administratively.
    LockCleared,
    /// A session terminated and its holds were force-cleared.
    SessionClosed,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Lock => write!(f, "lock"),
            EventAction::Unlock => write!(f, "unlock"),
            EventAction::LockDenied => write!(f, "lock_denied"),
            EventAction::LockCleared => write!(f, "lock_cleared"),
            EventAction::SessionClosed => write!(f, "session_closed"),
        }
    }
}

/// An event record for the audit log.
///
/// Events are serialized as single-line JSON objects and appended to the
/// audit file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The transition that was recorded.
    pub action: EventAction,

    /// The process identity that recorded the event (e.g. `user@HOST`).
    pub actor: String,

    /// Id of the client session the event concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<u32>,

    /// The affected datastore, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datastore: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event with the given action.
    ///
    /// The timestamp is set to the current time, and the actor is determined
    /// from the environment (USER@HOSTNAME).
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            session: None,
            datastore: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the session id for this event.
    pub fn with_session(mut self, session_id: u32) -> Self {
        self.session = Some(session_id);
        self
    }

    /// Set the datastore for this event.
    pub fn with_datastore(mut self, datastore: Datastore) -> Self {
        self.datastore = Some(datastore.as_str().to_string());
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| LockError::Audit(format!("failed to serialize event to JSON: {}", e)))
    }
}

/// Get the actor string for event metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append-only NDJSON writer for lock audit events.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Create an audit log writing to `path`. The file and its parent
    /// directory are created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path events are appended to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event as a single JSON line.
    ///
    /// Each append results in one line with a trailing newline, synced to
    /// disk before returning.
    pub fn append(&self, event: &Event) -> Result<()> {
        let json_line = event.to_ndjson_line()?;

        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                LockError::Audit(format!(
                    "failed to create audit directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                LockError::Audit(format!(
                    "failed to open audit log '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        writeln!(file, "{}", json_line).map_err(|e| {
            LockError::Audit(format!(
                "failed to write event to '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        file.sync_all().map_err(|e| {
            LockError::Audit(format!(
                "failed to sync audit log '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_event_creation() {
        let event = Event::new(EventAction::Lock);

        assert_eq!(event.action, EventAction::Lock);
        assert!(!event.actor.is_empty());
        assert!(event.session.is_none());
        assert!(event.datastore.is_none());
        // Timestamp should be recent (within last minute)
        let age = Utc::now().signed_duration_since(event.ts);
        assert!(age.num_minutes() < 1);
    }

    #[test]
    fn test_event_builders() {
        let event = Event::new(EventAction::Unlock)
            .with_session(42)
            .with_datastore(Datastore::Candidate)
            .with_details(json!({"discarded": true}));

        assert_eq!(event.session, Some(42));
        assert_eq!(event.datastore.as_deref(), Some("candidate"));
        assert_eq!(event.details["discarded"], true);
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::new(EventAction::Lock)
            .with_session(7)
            .with_datastore(Datastore::Running);

        let json_line = event.to_ndjson_line().unwrap();

        // Should be valid JSON and a single line
        let parsed: Event = serde_json::from_str(&json_line).unwrap();
        assert_eq!(parsed.action, EventAction::Lock);
        assert_eq!(parsed.session, Some(7));
        assert!(!json_line.contains('\n'));
    }

    #[test]
    fn test_event_action_serializes_snake_case() {
        let event = Event::new(EventAction::LockDenied);
        let json_line = event.to_ndjson_line().unwrap();
        assert!(json_line.contains("\"lock_denied\""));

        let event = Event::new(EventAction::SessionClosed);
        let json_line = event.to_ndjson_line().unwrap();
        assert!(json_line.contains("\"session_closed\""));
    }

    #[test]
    fn test_event_omits_absent_fields() {
        let event = Event::new(EventAction::Lock);
        let json_line = event.to_ndjson_line().unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json_line).unwrap();
        assert!(parsed.get("session").is_none());
        assert!(parsed.get("datastore").is_none());
    }

    #[test]
    fn test_append_creates_file_and_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("audit").join("locks.ndjson");
        let log = AuditLog::new(&path);

        assert!(!path.exists());

        let event = Event::new(EventAction::Lock).with_datastore(Datastore::Running);
        log.append(&event).unwrap();

        assert!(path.exists());
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);

        let parsed: Event = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.action, EventAction::Lock);
    }

    #[test]
    fn test_append_accumulates_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("locks.ndjson");
        let log = AuditLog::new(&path);

        log.append(&Event::new(EventAction::Lock).with_session(1))
            .unwrap();
        log.append(&Event::new(EventAction::Unlock).with_session(1))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Event = serde_json::from_str(lines[0]).unwrap();
        let second: Event = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first.action, EventAction::Lock);
        assert_eq!(second.action, EventAction::Unlock);

        // Content should end with newline
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_event_action_display() {
        assert_eq!(format!("{}", EventAction::Lock), "lock");
        assert_eq!(format!("{}", EventAction::Unlock), "unlock");
        assert_eq!(format!("{}", EventAction::LockDenied), "lock_denied");
        assert_eq!(format!("{}", EventAction::LockCleared), "lock_cleared");
        assert_eq!(format!("{}", EventAction::SessionClosed), "session_closed");
    }

    #[test]
    fn test_get_actor_string() {
        let actor = get_actor_string();
        assert!(actor.contains('@'));
        assert!(!actor.is_empty());
    }
}
