//! SessionActor - per-entity reconciliation state machine
//!
//! One actor per open entity. Everything that can touch the edit buffer -
//! keystrokes, debounce timers firing, write resolutions, pushed snapshots -
//! arrives as a message, so the mailbox serializes the whole pipeline and no
//! locking is needed. What *is* needed is staleness detection: write
//! resolutions carry the generation they were scheduled under, snapshots
//! carry the entity they belong to, and anything that no longer matches is
//! dropped.
//!
//! State machine: Idle -> Editing -> Saving -> Saved | Failed, with remote
//! snapshots folding the session back to Idle whenever the buffer is neither
//! focused nor dirty. A failed write rolls the buffer back to the last
//! known-good value; there is no automatic retry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use shared_types::{EntityKey, NoteDocument, NotePatch, SessionSnapshot, SyncPhase};

use crate::buffer::EditBuffer;
use crate::debounce::DebouncedPersister;
use crate::status::StatusReporter;
use crate::store::{DocumentStore, StoreError};
use crate::surface::EditorSurface;

// ============================================================================
// Messages
// ============================================================================

pub enum SessionMsg {
    /// User replaced the visible text; re-arms the debounced write
    Edit { text: String },

    /// Input surface gained focus; snapshots are suppressed until blur
    Focus,

    /// Input surface lost focus; applies a suppressed snapshot if the buffer
    /// is clean
    Blur,

    /// Explicit save: cancel the timer and write the current buffer now
    FlushNow,

    /// A debounce timer elapsed for the given scheduled-write generation
    DebounceFired { generation: u64 },

    /// An in-flight write finished, for better or worse
    WriteResolved {
        generation: u64,
        text: String,
        result: Result<(), StoreError>,
    },

    /// Full-document snapshot pushed by the realtime channel
    Snapshot { entity: EntityKey, doc: NoteDocument },

    /// The realtime channel dropped; the session degrades to write-only
    RealtimeLost { entity: EntityKey, reason: String },

    /// Point-in-time view for the API and tests
    GetState { reply: RpcReplyPort<SessionSnapshot> },
}

impl std::fmt::Debug for SessionMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMsg::Edit { .. } => write!(f, "Edit"),
            SessionMsg::Focus => write!(f, "Focus"),
            SessionMsg::Blur => write!(f, "Blur"),
            SessionMsg::FlushNow => write!(f, "FlushNow"),
            SessionMsg::DebounceFired { generation } => {
                write!(f, "DebounceFired({generation})")
            }
            SessionMsg::WriteResolved { generation, .. } => {
                write!(f, "WriteResolved({generation})")
            }
            SessionMsg::Snapshot { entity, .. } => write!(f, "Snapshot({entity})"),
            SessionMsg::RealtimeLost { entity, .. } => write!(f, "RealtimeLost({entity})"),
            SessionMsg::GetState { .. } => write!(f, "GetState"),
        }
    }
}

// ============================================================================
// Actor
// ============================================================================

/// Arguments for spawning a SessionActor
pub struct SessionArguments {
    pub entity: EntityKey,
    /// Document loaded at open time (empty when the key was never written)
    pub initial: NoteDocument,
    pub store: Arc<dyn DocumentStore>,
    pub surface: Arc<dyn EditorSurface>,
    pub debounce: Duration,
}

pub struct SessionState {
    entity: EntityKey,
    buffer: EditBuffer,
    /// Most recent text confirmed by a successful write or an applied
    /// snapshot; the rollback target
    last_known_good: String,
    persister: DebouncedPersister,
    /// Text of the most recently scheduled write, until it resolves
    pending_text: Option<String>,
    /// Latest snapshot withheld while the buffer was focused or dirty;
    /// applied at blur if the buffer is clean, dropped once a later write
    /// confirms, otherwise superseded by the next snapshot
    suppressed: Option<NoteDocument>,
    phase: SyncPhase,
    reporter: StatusReporter,
    store: Arc<dyn DocumentStore>,
    surface: Arc<dyn EditorSurface>,
}

#[derive(Debug, Default)]
pub struct SessionActor;

#[async_trait]
impl Actor for SessionActor {
    type Msg = SessionMsg;
    type State = SessionState;
    type Arguments = SessionArguments;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: SessionArguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(entity = %args.entity, "session starting");

        Ok(SessionState {
            entity: args.entity,
            buffer: EditBuffer::from_remote(args.initial.text.clone()),
            last_known_good: args.initial.text,
            persister: DebouncedPersister::new(args.debounce),
            pending_text: None,
            suppressed: None,
            phase: SyncPhase::Idle,
            reporter: StatusReporter::new(),
            store: args.store,
            surface: args.surface,
        })
    }

    async fn post_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        // Initial render so a freshly attached surface shows the loaded doc
        state.surface.render_text(&state.entity, state.buffer.text());
        self.push_status(state);
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SessionMsg::Edit { text } => self.handle_edit(myself, text, state),
            SessionMsg::Focus => {
                state.buffer.set_focused(true);
            }
            SessionMsg::Blur => self.handle_blur(state),
            SessionMsg::FlushNow => self.handle_flush(myself, state),
            SessionMsg::DebounceFired { generation } => {
                self.handle_debounce_fired(myself, generation, state)
            }
            SessionMsg::WriteResolved {
                generation,
                text,
                result,
            } => self.handle_write_resolved(generation, text, result, state),
            SessionMsg::Snapshot { entity, doc } => self.handle_snapshot(entity, doc, state),
            SessionMsg::RealtimeLost { entity, reason } => {
                self.handle_realtime_lost(entity, reason, state)
            }
            SessionMsg::GetState { reply } => {
                let _ = reply.send(SessionSnapshot {
                    entity: state.entity.clone(),
                    text: state.buffer.text().to_string(),
                    focused: state.buffer.focused(),
                    dirty: state.buffer.dirty(),
                    phase: state.phase.clone(),
                    last_known_good: state.last_known_good.clone(),
                    realtime: state.reporter.realtime(),
                });
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.persister.cancel();
        tracing::debug!(entity = %state.entity, "session stopped");
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

impl SessionActor {
    fn handle_edit(&self, myself: ActorRef<SessionMsg>, text: String, state: &mut SessionState) {
        state.buffer.set_text(text);

        let timer_target = myself.clone();
        let generation = state.persister.arm(move |generation| {
            let _ = timer_target.cast(SessionMsg::DebounceFired { generation });
        });
        state.pending_text = Some(state.buffer.text().to_string());

        tracing::debug!(entity = %state.entity, generation, "edit buffered");
        self.set_phase(state, SyncPhase::Editing);
    }

    fn handle_blur(&self, state: &mut SessionState) {
        state.buffer.set_focused(false);

        if state.buffer.dirty() {
            // Unsaved local edits win; the suppressed snapshot stays parked
            return;
        }
        if let Some(doc) = state.suppressed.take() {
            tracing::debug!(entity = %state.entity, "applying snapshot suppressed during focus");
            self.apply_snapshot(state, doc);
        }
    }

    fn handle_flush(&self, myself: ActorRef<SessionMsg>, state: &mut SessionState) {
        let generation = state.persister.flush();
        let text = state.buffer.text().to_string();
        state.pending_text = Some(text.clone());

        tracing::debug!(entity = %state.entity, generation, "explicit flush");
        self.set_phase(state, SyncPhase::Saving);
        self.spawn_write(myself, state, generation, text);
    }

    fn handle_debounce_fired(
        &self,
        myself: ActorRef<SessionMsg>,
        generation: u64,
        state: &mut SessionState,
    ) {
        // Aborting a timer is best-effort; a fire racing its own cancellation
        // shows up here with an old generation
        if generation != state.persister.latest() {
            tracing::debug!(
                entity = %state.entity,
                generation,
                latest = state.persister.latest(),
                "stale debounce fire ignored"
            );
            return;
        }

        let text = state.buffer.text().to_string();
        self.set_phase(state, SyncPhase::Saving);
        self.spawn_write(myself, state, generation, text);
    }

    fn handle_write_resolved(
        &self,
        generation: u64,
        text: String,
        result: Result<(), StoreError>,
        state: &mut SessionState,
    ) {
        if generation != state.persister.latest() {
            // A newer write has been scheduled since; this resolution must
            // not revive superseded text. A stale success that persisted
            // exactly the text still awaiting confirmation counts as that
            // confirmation, nothing more.
            match result {
                Ok(()) if state.pending_text.as_deref() == Some(text.as_str()) => {
                    tracing::debug!(
                        entity = %state.entity,
                        generation,
                        "stale write confirmed the pending text"
                    );
                    state.last_known_good = text;
                }
                Ok(()) => {
                    tracing::debug!(entity = %state.entity, generation, "stale write resolution ignored");
                }
                Err(error) => {
                    tracing::debug!(
                        entity = %state.entity,
                        generation,
                        error = %error,
                        "stale write failure ignored"
                    );
                }
            }
            return;
        }

        state.pending_text = None;

        match result {
            Ok(()) => {
                tracing::debug!(entity = %state.entity, generation, "write confirmed");
                state.last_known_good = text;
                state.buffer.mark_clean();
                // A snapshot parked before this write resolved is older than
                // it; applying it later would revive superseded text
                state.suppressed = None;
                state.reporter.mark_saved(Utc::now());
                state.phase = SyncPhase::Saved;
                self.push_status(state);
            }
            Err(error) => {
                tracing::warn!(
                    entity = %state.entity,
                    generation,
                    error = %error,
                    "write failed; rolling buffer back"
                );
                state.buffer.rollback(state.last_known_good.clone());
                state.reporter.mark_failed(error.to_string());
                state.phase = SyncPhase::Failed;
                state.surface.render_text(&state.entity, state.buffer.text());
                self.push_status(state);
            }
        }
    }

    fn handle_snapshot(&self, entity: EntityKey, doc: NoteDocument, state: &mut SessionState) {
        if entity != state.entity {
            // Late delivery from a subscription that was already torn down
            tracing::debug!(
                snapshot_entity = %entity,
                session_entity = %state.entity,
                "cross-entity snapshot discarded"
            );
            return;
        }

        if state.buffer.focused() || state.buffer.dirty() {
            // Not queued: only the most recent withheld snapshot is kept
            tracing::debug!(entity = %state.entity, "snapshot suppressed");
            state.suppressed = Some(doc);
            return;
        }

        self.apply_snapshot(state, doc);
    }

    fn handle_realtime_lost(&self, entity: EntityKey, reason: String, state: &mut SessionState) {
        if entity != state.entity {
            return;
        }
        tracing::warn!(entity = %state.entity, reason = %reason, "realtime channel lost; saves continue");
        state.reporter.mark_realtime_lost(reason);
        self.push_status(state);
    }

    // ------------------------------------------------------------------------

    fn apply_snapshot(&self, state: &mut SessionState, doc: NoteDocument) {
        let changed = state.buffer.text() != doc.text;
        state.last_known_good = doc.text.clone();
        state.buffer.apply_remote(doc.text);
        state.suppressed = None;

        if changed {
            state.surface.render_text(&state.entity, state.buffer.text());
        }
        self.set_phase(state, SyncPhase::Idle);
    }

    fn spawn_write(
        &self,
        myself: ActorRef<SessionMsg>,
        state: &SessionState,
        generation: u64,
        text: String,
    ) {
        let store = state.store.clone();
        let entity = state.entity.clone();

        tokio::spawn(async move {
            let result = store.set_merge(&entity, NotePatch::new(text.clone())).await;
            // The session may already be gone (entity switched); that is fine
            let _ = myself.cast(SessionMsg::WriteResolved {
                generation,
                text,
                result,
            });
        });
    }

    fn set_phase(&self, state: &mut SessionState, phase: SyncPhase) {
        if state.phase != phase {
            state.phase = phase;
            self.push_status(state);
        }
    }

    fn push_status(&self, state: &SessionState) {
        let line = state.reporter.line(&state.phase);
        state.surface.render_status(&state.entity, &line);
    }
}
