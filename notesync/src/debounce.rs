//! DebouncedPersister - write scheduling with coalescing
//!
//! Rapid edits collapse into one write: every edit re-arms a single quiet-
//! period timer (aborting the previous one), so intermediate states are never
//! persisted. Each scheduled write - timer-armed or immediate flush - claims
//! a fresh generation number; the session actor uses the generation to tell a
//! current write resolution from a stale one.

use std::time::Duration;

use tokio::task::JoinHandle;

pub struct DebouncedPersister {
    interval: Duration,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl DebouncedPersister {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            timer: None,
        }
    }

    /// Generation of the most recently scheduled write. A resolution tagged
    /// with anything older is stale.
    pub fn latest(&self) -> u64 {
        self.generation
    }

    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Arm (or re-arm) the quiet-period timer. Cancels any unfired timer,
    /// claims a new generation, and invokes `fire` with it once the interval
    /// elapses without another arm.
    pub fn arm<F>(&mut self, fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let interval = self.interval;

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            fire(generation);
        }));

        generation
    }

    /// Cancel any pending timer and claim a generation for an immediate
    /// write. The caller issues the write itself.
    pub fn flush(&mut self) -> u64 {
        self.cancel();
        self.generation += 1;
        self.generation
    }

    /// Cancel the pending timer, if any. Safe to call when nothing is armed.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for DebouncedPersister {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_rearm_coalesces_to_latest_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut persister = DebouncedPersister::new(Duration::from_millis(50));

        for _ in 0..4 {
            let tx = tx.clone();
            persister.arm(move |generation| {
                let _ = tx.send(generation);
            });
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        // Only the last armed timer fires
        let fired = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fired, 4);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_prevents_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut persister = DebouncedPersister::new(Duration::from_millis(30));

        persister.arm(move |generation| {
            let _ = tx.send(generation);
        });
        persister.cancel();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
        assert!(!persister.is_armed());
    }

    #[tokio::test]
    async fn test_flush_claims_generation_without_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut persister = DebouncedPersister::new(Duration::from_millis(30));

        persister.arm(move |generation| {
            let _ = tx.send(generation);
        });
        let generation = persister.flush();

        assert_eq!(generation, 2);
        assert_eq!(persister.latest(), 2);
        assert!(!persister.is_armed());

        // The armed timer was cancelled by the flush
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }
}
