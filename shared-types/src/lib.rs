//! Shared types between the notesync engine and frontend clients
//!
//! These types cross the process boundary:
//! - the engine (ractor actors behind an axum API)
//! - web frontends consuming the HTTP/WebSocket facade
//!
//! Serializable with serde for JSON over WebSocket/HTTP; exported to
//! TypeScript with ts-rs for the web UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Core Types
// ============================================================================

/// Key of the entity (contact, account, ...) whose note field is being edited
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export)]
pub struct EntityKey(pub String);

impl EntityKey {
    /// Fresh random key, used by tests and fixtures
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full document snapshot as stored and as pushed by the realtime channel.
///
/// The subscription always delivers the whole document, including echoes of
/// writes this client made itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct NoteDocument {
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

impl NoteDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            updated_at: Utc::now(),
        }
    }

    /// Empty document, used when the store has no entry for an entity yet
    pub fn empty() -> Self {
        Self::new("")
    }
}

/// Partial write against a note document.
///
/// Applied with merge semantics: fields outside this patch are untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct NotePatch {
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

impl NotePatch {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            updated_at: Utc::now(),
        }
    }
}

// ============================================================================
// Save Status
// ============================================================================

/// Phase of the per-entity save state machine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SyncPhase {
    /// Buffer matches the last confirmed remote value
    Idle,
    /// User has edited; a debounced write is armed
    Editing,
    /// A write is in flight
    Saving,
    /// Most recent write confirmed
    Saved,
    /// Most recent write failed; buffer was rolled back
    Failed,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Editing => "editing",
            SyncPhase::Saving => "saving",
            SyncPhase::Saved => "saved",
            SyncPhase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable status derived from the state machine, rendered by the UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct StatusLine {
    pub phase: SyncPhase,
    /// Short label for the status chip (e.g. "Saving...", "Saved 12:04")
    pub label: String,
    /// Set while phase is Saved
    pub saved_at: Option<DateTime<Utc>>,
    /// False when the realtime channel has dropped; saves still work
    pub realtime: bool,
    /// Failure detail for Failed, channel error for degraded realtime
    pub detail: Option<String>,
}

// ============================================================================
// Render Events (engine -> UI surface)
// ============================================================================

/// Events the engine pushes to the UI surface over the WebSocket.
///
/// `Text` is only emitted when the engine itself rewrites the buffer (applied
/// remote snapshot, rollback after a failed write) - never as an echo of the
/// user's own keystrokes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum RenderEvent {
    Text {
        entity: EntityKey,
        text: String,
    },
    Status {
        entity: EntityKey,
        status: StatusLine,
    },
    Error {
        message: String,
    },
}

/// Point-in-time view of a session, served by `GET /session/state`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct SessionSnapshot {
    pub entity: EntityKey,
    pub text: String,
    pub focused: bool,
    pub dirty: bool,
    pub phase: SyncPhase,
    pub last_known_good: String,
    pub realtime: bool,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key_random_is_unique() {
        let a = EntityKey::random();
        let b = EntityKey::random();
        assert_ne!(a, b);
        assert_eq!(a.0.len(), 36); // UUID length
    }

    #[test]
    fn test_note_document_round_trip() {
        let doc = NoteDocument::new("call back tuesday");
        let json = serde_json::to_string(&doc).unwrap();
        let back: NoteDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn test_sync_phase_serialization() {
        let json = serde_json::to_string(&SyncPhase::Saving).unwrap();
        assert_eq!(json, "\"saving\"");
        let back: SyncPhase = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(back, SyncPhase::Failed);
    }

    #[test]
    fn test_render_event_tagging() {
        let event = RenderEvent::Text {
            entity: EntityKey::from("contact-42"),
            text: "hello".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"text\""));
        assert!(json.contains("contact-42"));
    }

    #[test]
    fn test_status_line_round_trip() {
        let status = StatusLine {
            phase: SyncPhase::Saved,
            label: "Saved".to_string(),
            saved_at: Some(chrono::Utc::now()),
            realtime: true,
            detail: None,
        };
        let json = serde_json::to_string(&status).unwrap();
        let back: StatusLine = serde_json::from_str(&json).unwrap();
        assert_eq!(status, back);
    }
}
