//! SessionManager - one live session and subscription at a time
//!
//! Owns the open-entity lifecycle: opening an entity tears the previous
//! session down first - unsubscribe before anything else, so a snapshot for
//! the old entity can never leak into the new buffer - then loads the
//! document, spawns a fresh SessionActor, and wires the realtime stream to
//! its mailbox. In-flight work for a closed session lands in a stopped
//! mailbox and is dropped.

use std::sync::Arc;

use ractor::{Actor, ActorRef};
use shared_types::{EntityKey, NoteDocument, SessionSnapshot};
use tokio::sync::Mutex;

use crate::actors::session::{SessionActor, SessionArguments, SessionMsg};
use crate::config::SyncConfig;
use crate::error::SessionError;
use crate::store::{DocumentStore, StoreEvent, SubscriptionHandle};
use crate::surface::EditorSurface;

struct ActiveSession {
    entity: EntityKey,
    actor: ActorRef<SessionMsg>,
    subscription: Box<dyn SubscriptionHandle>,
}

pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    surface: Arc<dyn EditorSurface>,
    config: SyncConfig,
    active: Mutex<Option<ActiveSession>>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        surface: Arc<dyn EditorSurface>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            surface,
            config,
            active: Mutex::new(None),
        }
    }

    /// Open a session for `entity`, tearing down any existing session first.
    /// Reopening the currently open entity restarts its session.
    pub async fn open(&self, entity: EntityKey) -> Result<(), SessionError> {
        let mut active = self.active.lock().await;

        // Unsubscribe before creating the new subscription; this ordering is
        // what keeps old-entity snapshots out of the new buffer
        if let Some(previous) = active.take() {
            tracing::info!(entity = %previous.entity, "closing session before reopen");
            previous.subscription.unsubscribe();
            previous.actor.stop(None);
        }

        let initial = self
            .store
            .get(&entity)
            .await?
            .unwrap_or_else(NoteDocument::empty);

        let (actor, _join) = Actor::spawn(
            None,
            SessionActor,
            SessionArguments {
                entity: entity.clone(),
                initial,
                store: self.store.clone(),
                surface: self.surface.clone(),
                debounce: self.config.debounce,
            },
        )
        .await
        .map_err(|e| SessionError::Mailbox(e.to_string()))?;

        let snapshot_target = actor.clone();
        let subscription = self.store.subscribe(
            &entity,
            Box::new(move |event| match event {
                StoreEvent::Snapshot(entity, doc) => {
                    let _ = snapshot_target.cast(SessionMsg::Snapshot { entity, doc });
                }
                StoreEvent::Lost(entity, reason) => {
                    let _ = snapshot_target.cast(SessionMsg::RealtimeLost { entity, reason });
                }
            }),
        );
        let subscription = match subscription {
            Ok(subscription) => subscription,
            Err(error) => {
                actor.stop(None);
                return Err(error.into());
            }
        };

        tracing::info!(entity = %entity, "session opened");
        *active = Some(ActiveSession {
            entity,
            actor,
            subscription,
        });
        Ok(())
    }

    /// Close the open session. No-op when nothing is open.
    pub async fn close(&self) -> bool {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(session) => {
                session.subscription.unsubscribe();
                session.actor.stop(None);
                tracing::info!(entity = %session.entity, "session closed");
                true
            }
            None => false,
        }
    }

    pub async fn edit(&self, text: String) -> Result<(), SessionError> {
        self.cast(SessionMsg::Edit { text }).await
    }

    pub async fn focus(&self) -> Result<(), SessionError> {
        self.cast(SessionMsg::Focus).await
    }

    pub async fn blur(&self) -> Result<(), SessionError> {
        self.cast(SessionMsg::Blur).await
    }

    /// Explicit save of the current buffer, skipping the debounce wait
    pub async fn flush(&self) -> Result<(), SessionError> {
        self.cast(SessionMsg::FlushNow).await
    }

    /// Clear the note: empty the buffer and persist immediately
    pub async fn clear(&self) -> Result<(), SessionError> {
        let active = self.active.lock().await;
        let session = active.as_ref().ok_or(SessionError::NoSession)?;
        session
            .actor
            .cast(SessionMsg::Edit {
                text: String::new(),
            })
            .map_err(|e| SessionError::Mailbox(e.to_string()))?;
        session
            .actor
            .cast(SessionMsg::FlushNow)
            .map_err(|e| SessionError::Mailbox(e.to_string()))
    }

    /// Point-in-time view of the open session
    pub async fn state(&self) -> Result<SessionSnapshot, SessionError> {
        let actor = {
            let active = self.active.lock().await;
            active
                .as_ref()
                .map(|session| session.actor.clone())
                .ok_or(SessionError::NoSession)?
        };

        ractor::call!(actor, |reply| SessionMsg::GetState { reply })
            .map_err(|e| SessionError::Mailbox(e.to_string()))
    }

    pub async fn open_entity(&self) -> Option<EntityKey> {
        let active = self.active.lock().await;
        active.as_ref().map(|session| session.entity.clone())
    }

    async fn cast(&self, message: SessionMsg) -> Result<(), SessionError> {
        let active = self.active.lock().await;
        let session = active.as_ref().ok_or(SessionError::NoSession)?;
        session
            .actor
            .cast(message)
            .map_err(|e| SessionError::Mailbox(e.to_string()))
    }
}
