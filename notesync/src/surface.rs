//! EditorSurface - the seam between the engine and whatever renders it
//!
//! The engine never reaches into UI globals; it is handed a surface at
//! construction and pushes re-renders through it. `render_text` is only
//! called when the engine itself rewrites the buffer (applied snapshot,
//! rollback) - user keystrokes are never echoed back.

use std::sync::Mutex;

use shared_types::{EntityKey, RenderEvent, StatusLine};
use tokio::sync::broadcast;

pub trait EditorSurface: Send + Sync {
    fn render_text(&self, entity: &EntityKey, text: &str);
    fn render_status(&self, entity: &EntityKey, status: &StatusLine);
}

// ============================================================================
// Broadcast surface (feeds the WebSocket facade)
// ============================================================================

/// Surface that fans render events out over a broadcast channel.
///
/// WebSocket connections subscribe to the channel; a send with no receivers
/// is not an error, it just means no frontend is currently attached.
pub struct BroadcastSurface {
    tx: broadcast::Sender<RenderEvent>,
}

impl BroadcastSurface {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn sender(&self) -> broadcast::Sender<RenderEvent> {
        self.tx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RenderEvent> {
        self.tx.subscribe()
    }
}

impl EditorSurface for BroadcastSurface {
    fn render_text(&self, entity: &EntityKey, text: &str) {
        let _ = self.tx.send(RenderEvent::Text {
            entity: entity.clone(),
            text: text.to_string(),
        });
    }

    fn render_status(&self, entity: &EntityKey, status: &StatusLine) {
        let _ = self.tx.send(RenderEvent::Status {
            entity: entity.clone(),
            status: status.clone(),
        });
    }
}

// ============================================================================
// Recording surface (tests)
// ============================================================================

/// Surface that records every render call, used by the scenario tests
#[derive(Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().expect("surface lock poisoned").clone()
    }

    /// Text renders in order, most recent last
    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RenderEvent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Status renders in order, most recent last
    pub fn statuses(&self) -> Vec<StatusLine> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RenderEvent::Status { status, .. } => Some(status),
                _ => None,
            })
            .collect()
    }
}

impl EditorSurface for RecordingSurface {
    fn render_text(&self, entity: &EntityKey, text: &str) {
        self.events
            .lock()
            .expect("surface lock poisoned")
            .push(RenderEvent::Text {
                entity: entity.clone(),
                text: text.to_string(),
            });
    }

    fn render_status(&self, entity: &EntityKey, status: &StatusLine) {
        self.events
            .lock()
            .expect("surface lock poisoned")
            .push(RenderEvent::Status {
                entity: entity.clone(),
                status: status.clone(),
            });
    }
}

/// Surface that drops everything, for headless embedding
#[derive(Debug, Default)]
pub struct NullSurface;

impl EditorSurface for NullSurface {
    fn render_text(&self, _entity: &EntityKey, _text: &str) {}
    fn render_status(&self, _entity: &EntityKey, _status: &StatusLine) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::SyncPhase;

    #[test]
    fn test_recording_surface_orders_events() {
        let surface = RecordingSurface::new();
        let entity = EntityKey::from("contact-1");

        surface.render_text(&entity, "a");
        surface.render_text(&entity, "b");

        assert_eq!(surface.texts(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_broadcast_surface_delivers_to_subscriber() {
        let surface = BroadcastSurface::new(16);
        let mut rx = surface.subscribe();
        let entity = EntityKey::from("contact-1");

        let status = StatusLine {
            phase: SyncPhase::Saving,
            label: "Saving...".to_string(),
            saved_at: None,
            realtime: true,
            detail: None,
        };
        surface.render_status(&entity, &status);

        match rx.recv().await.unwrap() {
            RenderEvent::Status { status: got, .. } => assert_eq!(got, status),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_broadcast_surface_without_receivers_is_fine() {
        let surface = BroadcastSurface::new(16);
        surface.render_text(&EntityKey::from("x"), "no one is listening");
    }
}
