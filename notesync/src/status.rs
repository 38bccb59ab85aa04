//! StatusReporter - derived status for the UI surface
//!
//! Pure formatting over the session state machine: no transitions happen
//! here, only the label the status chip shows and the bookkeeping needed to
//! render it (saved-at timestamp, realtime degradation, failure detail).

use chrono::{DateTime, Utc};
use shared_types::{StatusLine, SyncPhase};

#[derive(Debug, Clone, Default)]
pub struct StatusReporter {
    saved_at: Option<DateTime<Utc>>,
    detail: Option<String>,
    realtime_lost: bool,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_saved(&mut self, at: DateTime<Utc>) {
        self.saved_at = Some(at);
        self.detail = None;
    }

    pub fn mark_failed(&mut self, detail: impl Into<String>) {
        self.detail = Some(detail.into());
    }

    /// The realtime channel dropped; saves keep working but snapshots stop
    pub fn mark_realtime_lost(&mut self, detail: impl Into<String>) {
        self.realtime_lost = true;
        self.detail = Some(detail.into());
    }

    pub fn realtime(&self) -> bool {
        !self.realtime_lost
    }

    /// Render the status line for the given phase
    pub fn line(&self, phase: &SyncPhase) -> StatusLine {
        let label = match phase {
            SyncPhase::Idle => {
                if self.realtime_lost {
                    "Up to date (realtime disabled)".to_string()
                } else {
                    "Up to date".to_string()
                }
            }
            SyncPhase::Editing => "Editing...".to_string(),
            SyncPhase::Saving => "Saving...".to_string(),
            SyncPhase::Saved => match self.saved_at {
                Some(at) => format!("Saved {}", at.format("%H:%M")),
                None => "Saved".to_string(),
            },
            SyncPhase::Failed => "Save failed".to_string(),
        };

        StatusLine {
            phase: phase.clone(),
            label,
            saved_at: if *phase == SyncPhase::Saved {
                self.saved_at
            } else {
                None
            },
            realtime: !self.realtime_lost,
            detail: self.detail.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_label() {
        let reporter = StatusReporter::new();
        let line = reporter.line(&SyncPhase::Idle);
        assert_eq!(line.label, "Up to date");
        assert!(line.realtime);
        assert!(line.saved_at.is_none());
    }

    #[test]
    fn test_saved_label_carries_timestamp() {
        let mut reporter = StatusReporter::new();
        let at = Utc::now();
        reporter.mark_saved(at);

        let line = reporter.line(&SyncPhase::Saved);
        assert!(line.label.starts_with("Saved "));
        assert_eq!(line.saved_at, Some(at));
    }

    #[test]
    fn test_failed_label_keeps_detail() {
        let mut reporter = StatusReporter::new();
        reporter.mark_failed("store rejected write");

        let line = reporter.line(&SyncPhase::Failed);
        assert_eq!(line.label, "Save failed");
        assert_eq!(line.detail.as_deref(), Some("store rejected write"));
    }

    #[test]
    fn test_realtime_lost_degrades_but_keeps_saving() {
        let mut reporter = StatusReporter::new();
        reporter.mark_realtime_lost("channel closed");

        let idle = reporter.line(&SyncPhase::Idle);
        assert!(!idle.realtime);
        assert_eq!(idle.label, "Up to date (realtime disabled)");

        // Saving is still reported normally
        let saving = reporter.line(&SyncPhase::Saving);
        assert_eq!(saving.label, "Saving...");
        assert!(!saving.realtime);
    }
}
