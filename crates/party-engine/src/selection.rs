//! Time-bounded store for in-progress multi-step selections.
//!
//! The command/menu front end walks users through several steps (pick a
//! title, pick a season, pick a quality) before a session starts. The
//! in-progress state for each user lives here, keyed by user id, with
//! an explicit `get`/`put`/`expire` contract and timer-based eviction —
//! not in ambient per-process maps.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    ttl: Duration,
}

/// Expiring key→value store for pending UI selections.
///
/// Clones share the same underlying map. Reads past the TTL behave as
/// if the entry were already evicted, so correctness does not depend on
/// sweeper timing.
pub struct SelectionStore<V> {
    inner: Arc<Mutex<Inner<V>>>,
}

impl<V> Clone for SelectionStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> SelectionStore<V> {
    /// Create a store whose entries live for `ttl` after their last
    /// `put`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                ttl,
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a value, replacing any previous one and refreshing its
    /// expiry.
    pub fn put(&self, key: impl Into<String>, value: V) {
        let mut inner = self.lock();
        let expires_at = Instant::now() + inner.ttl;
        inner.entries.insert(key.into(), Entry { value, expires_at });
    }

    /// Remove and return the value for `key`, expired or not.
    pub fn expire(&self, key: &str) -> Option<V> {
        self.lock().entries.remove(key).map(|entry| entry.value)
    }

    /// Number of live (non-expired) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .entries
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    /// Whether the store holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry past its TTL. Returns the eviction count.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.expires_at > now);
        before - inner.entries.len()
    }
}

impl<V: Clone> SelectionStore<V> {
    /// Fetch the value for `key`, or `None` if absent or expired.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let inner = self.lock();
        inner
            .entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }
}

impl<V: Send + 'static> SelectionStore<V> {
    /// Spawn a background task that sweeps expired entries every
    /// `interval` until `cancel` fires.
    pub fn spawn_sweeper(
        &self,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = store.sweep();
                        if evicted > 0 {
                            debug!(
                                target: "party.selection",
                                evicted,
                                "Swept expired selections"
                            );
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_get_respects_ttl() {
        let store: SelectionStore<String> = SelectionStore::new(Duration::from_secs(300));
        store.put("user-1", "pending-pick".to_string());
        assert_eq!(store.get("user-1").as_deref(), Some("pending-pick"));

        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(store.get("user-1"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_refreshes_expiry() {
        let store: SelectionStore<u32> = SelectionStore::new(Duration::from_secs(300));
        store.put("user-1", 1);
        tokio::time::advance(Duration::from_secs(200)).await;
        store.put("user-1", 2);
        tokio::time::advance(Duration::from_secs(200)).await;
        assert_eq!(store.get("user-1"), Some(2));
    }

    #[tokio::test]
    async fn test_expire_removes_immediately() {
        let store: SelectionStore<u32> = SelectionStore::new(Duration::from_secs(300));
        store.put("user-1", 7);
        assert_eq!(store.expire("user-1"), Some(7));
        assert_eq!(store.get("user-1"), None);
        assert_eq!(store.expire("user-1"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_only_expired() {
        let store: SelectionStore<u32> = SelectionStore::new(Duration::from_secs(300));
        store.put("old", 1);
        tokio::time::advance(Duration::from_secs(200)).await;
        store.put("fresh", 2);
        tokio::time::advance(Duration::from_secs(150)).await;

        assert_eq!(store.sweep(), 1);
        assert_eq!(store.get("old"), None);
        assert_eq!(store.get("fresh"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_runs_until_cancelled() {
        let store: SelectionStore<u32> = SelectionStore::new(Duration::from_secs(10));
        let cancel = CancellationToken::new();
        let sweeper = store.spawn_sweeper(Duration::from_secs(5), cancel.clone());

        store.put("user-1", 1);
        tokio::time::advance(Duration::from_secs(16)).await;
        tokio::task::yield_now().await;
        assert!(store.is_empty());

        cancel.cancel();
        sweeper.await.unwrap();
    }
}
