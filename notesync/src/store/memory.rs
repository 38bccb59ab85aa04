//! In-memory DocumentStore backend
//!
//! Reference implementation of the store seam: a map of documents with a
//! per-key broadcast channel standing in for the realtime push transport.
//! Also the test double - writes can be given artificial latency or made to
//! fail, which is how the scenario tests exercise rollback and stale-write
//! ordering.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use shared_types::{EntityKey, NoteDocument, NotePatch};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{DocumentStore, StoreError, StoreEvent, StoreEventSink, SubscriptionHandle};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<EntityKey, NoteDocument>>,
    channels: Mutex<HashMap<EntityKey, broadcast::Sender<NoteDocument>>>,
    write_log: Mutex<Vec<(EntityKey, String)>>,
    write_delays: Mutex<VecDeque<Duration>>,
    write_failures: Mutex<VecDeque<StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document directly, without going through the write path or
    /// notifying subscribers. Test and fixture setup only.
    pub fn seed(&self, key: &EntityKey, text: impl Into<String>) {
        self.docs
            .lock()
            .expect("docs lock poisoned")
            .insert(key.clone(), NoteDocument::new(text));
    }

    /// Every write issued against the store, in call order
    pub fn write_log(&self) -> Vec<(EntityKey, String)> {
        self.write_log.lock().expect("log lock poisoned").clone()
    }

    pub fn write_count(&self) -> usize {
        self.write_log.lock().expect("log lock poisoned").len()
    }

    /// Queue an artificial latency; consumed by writes in call order
    pub fn inject_write_delay(&self, delay: Duration) {
        self.write_delays
            .lock()
            .expect("delays lock poisoned")
            .push_back(delay);
    }

    /// Queue a failure; consumed by writes in call order, after any delay
    pub fn inject_write_failure(&self, error: StoreError) {
        self.write_failures
            .lock()
            .expect("failures lock poisoned")
            .push_back(error);
    }

    /// Drop the realtime channel for a key. Live subscribers observe a
    /// closed stream and report `StoreEvent::Lost`.
    pub fn kill_realtime(&self, key: &EntityKey) {
        self.channels
            .lock()
            .expect("channels lock poisoned")
            .remove(key);
    }

    /// Number of live subscribers for a key
    pub fn subscriber_count(&self, key: &EntityKey) -> usize {
        self.channels
            .lock()
            .expect("channels lock poisoned")
            .get(key)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    fn sender_for(&self, key: &EntityKey) -> broadcast::Sender<NoteDocument> {
        self.channels
            .lock()
            .expect("channels lock poisoned")
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &EntityKey) -> Result<Option<NoteDocument>, StoreError> {
        Ok(self.docs.lock().expect("docs lock poisoned").get(key).cloned())
    }

    async fn set_merge(&self, key: &EntityKey, patch: NotePatch) -> Result<(), StoreError> {
        self.write_log
            .lock()
            .expect("log lock poisoned")
            .push((key.clone(), patch.text.clone()));

        let delay = self
            .write_delays
            .lock()
            .expect("delays lock poisoned")
            .pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .write_failures
            .lock()
            .expect("failures lock poisoned")
            .pop_front();
        if let Some(error) = failure {
            return Err(error);
        }

        let snapshot = {
            let mut docs = self.docs.lock().expect("docs lock poisoned");
            let doc = docs
                .entry(key.clone())
                .or_insert_with(NoteDocument::empty);
            doc.text = patch.text;
            doc.updated_at = Utc::now();
            doc.clone()
        };

        // Push the full document to subscribers, own writes included
        let _ = self.sender_for(key).send(snapshot);

        Ok(())
    }

    fn subscribe(
        &self,
        key: &EntityKey,
        sink: StoreEventSink,
    ) -> Result<Box<dyn SubscriptionHandle>, StoreError> {
        let mut rx = self.sender_for(key).subscribe();
        let entity = key.clone();

        let task_entity = entity.clone();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(doc) => sink(StoreEvent::Snapshot(task_entity.clone(), doc)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Full-snapshot semantics: the next snapshot resyncs us
                        tracing::debug!(
                            entity = %task_entity,
                            skipped,
                            "snapshot stream lagged"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        sink(StoreEvent::Lost(
                            task_entity.clone(),
                            "realtime channel closed".to_string(),
                        ));
                        break;
                    }
                }
            }
        });

        Ok(Box::new(MemorySubscription { entity, task }))
    }
}

struct MemorySubscription {
    entity: EntityKey,
    task: JoinHandle<()>,
}

impl SubscriptionHandle for MemorySubscription {
    fn entity(&self) -> &EntityKey {
        &self.entity
    }

    fn unsubscribe(&self) {
        self.task.abort();
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryStore::new();
        let doc = store.get(&EntityKey::from("nope")).await.unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_set_merge_then_get() {
        let store = MemoryStore::new();
        let key = EntityKey::from("contact-1");

        store.set_merge(&key, NotePatch::new("hello")).await.unwrap();

        let doc = store.get(&key).await.unwrap().unwrap();
        assert_eq!(doc.text, "hello");
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_delivers_snapshots() {
        let store = MemoryStore::new();
        let key = EntityKey::from("contact-1");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = store
            .subscribe(
                &key,
                Box::new(move |event| {
                    let _ = tx.send(event);
                }),
            )
            .unwrap();

        store.set_merge(&key, NotePatch::new("first")).await.unwrap();

        match rx.recv().await.unwrap() {
            StoreEvent::Snapshot(entity, doc) => {
                assert_eq!(entity, key);
                assert_eq!(doc.text, "first");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        handle.unsubscribe();
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let store = MemoryStore::new();
        let key = EntityKey::from("contact-1");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = store
            .subscribe(
                &key,
                Box::new(move |event| {
                    let _ = tx.send(event);
                }),
            )
            .unwrap();
        handle.unsubscribe();

        // Give the forwarding task time to wind down
        tokio::time::sleep(Duration::from_millis(50)).await;

        store.set_merge(&key, NotePatch::new("late")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_in_order() {
        let store = MemoryStore::new();
        let key = EntityKey::from("contact-1");

        store.inject_write_failure(StoreError::Rejected("validation".to_string()));

        let first = store.set_merge(&key, NotePatch::new("a")).await;
        assert!(matches!(first, Err(StoreError::Rejected(_))));

        let second = store.set_merge(&key, NotePatch::new("b")).await;
        assert!(second.is_ok());
        assert_eq!(store.get(&key).await.unwrap().unwrap().text, "b");
    }

    #[tokio::test]
    async fn test_kill_realtime_reports_lost() {
        let store = Arc::new(MemoryStore::new());
        let key = EntityKey::from("contact-1");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _handle = store
            .subscribe(
                &key,
                Box::new(move |event| {
                    let _ = tx.send(event);
                }),
            )
            .unwrap();

        store.kill_realtime(&key);

        match tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap()
        {
            StoreEvent::Lost(entity, _) => assert_eq!(entity, key),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
