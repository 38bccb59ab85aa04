//! DocumentStore - the persistence seam
//!
//! The engine talks to whatever holds the note documents through this trait:
//! get-by-key, merge-write-by-key, and a subscribe-by-key realtime stream
//! that delivers the full document on every change, including this client's
//! own writes. Production adapters (a hosted document database) live outside
//! this repository; `MemoryStore` is the reference backend and test double.

use async_trait::async_trait;
use shared_types::{EntityKey, NoteDocument, NotePatch};

pub mod memory;

pub use memory::MemoryStore;

/// Errors a write or subscribe can fail with
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Event delivered to a subscription sink
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// Full document snapshot after a change
    Snapshot(EntityKey, NoteDocument),
    /// The realtime channel dropped; no further snapshots will arrive
    Lost(EntityKey, String),
}

/// Callback slot for one subscription. Invoked from store-owned tasks, so it
/// must hand off rather than block.
pub type StoreEventSink = Box<dyn Fn(StoreEvent) + Send + Sync>;

/// Handle for one live realtime subscription.
///
/// `unsubscribe` is synchronous but best-effort: the store may still deliver
/// a snapshot for a brief period afterwards, which is why every delivered
/// event carries its entity key for the receiver to match against.
pub trait SubscriptionHandle: Send + Sync {
    fn entity(&self) -> &EntityKey;
    fn unsubscribe(&self);
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the current document, `None` when the key has never been written
    async fn get(&self, key: &EntityKey) -> Result<Option<NoteDocument>, StoreError>;

    /// Merge-write: fields outside the patch are untouched; `updated_at` is
    /// stamped by the store at apply time
    async fn set_merge(&self, key: &EntityKey, patch: NotePatch) -> Result<(), StoreError>;

    /// Open a realtime stream for one key, routing every emitted snapshot to
    /// the sink until the returned handle is unsubscribed
    fn subscribe(
        &self,
        key: &EntityKey,
        sink: StoreEventSink,
    ) -> Result<Box<dyn SubscriptionHandle>, StoreError>;
}
