//! Revoked token store.
//!
//! Holds the `jti` of every logged-out token until that token would have
//! expired anyway. Lives for the process lifetime only; a restart forgets
//! revocations, which is bounded by the token lifetimes.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Thread-safe set of revoked token ids.
///
/// Maps `jti` to the token's `exp` so expired entries can be purged.
pub struct RevocationStore {
    revoked: DashMap<String, i64>,
}

impl RevocationStore {
    pub fn new() -> Self {
        Self {
            revoked: DashMap::new(),
        }
    }

    /// Revoke a token id. Returns `false` if it was already revoked.
    pub fn revoke(&self, jti: &str, exp: i64) -> bool {
        self.revoked.insert(jti.to_string(), exp).is_none()
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }

    /// Drop entries whose token expired before `now` (unix seconds).
    /// Returns the number removed.
    pub fn purge_expired(&self, now: i64) -> usize {
        let before = self.revoked.len();
        self.revoked.retain(|_, exp| *exp >= now);
        before.saturating_sub(self.revoked.len())
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }

    /// Periodically purge expired entries until `shutdown` flips to `true`
    /// or its sender is dropped.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let purged = self.purge_expired(chrono::Utc::now().timestamp());
                        if purged > 0 {
                            tracing::debug!(purged, remaining = self.len(), "Purged expired revocations");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("Revocation sweeper stopped");
        })
    }
}

impl Default for RevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_revoke_and_check() {
        let store = RevocationStore::new();
        assert!(!store.is_revoked("jti-1"));
        assert!(store.revoke("jti-1", 100));
        assert!(store.is_revoked("jti-1"));
        assert!(!store.is_revoked("jti-2"));
    }

    #[test]
    fn test_revoke_twice() {
        let store = RevocationStore::new();
        assert!(store.revoke("jti-1", 100));
        assert!(!store.revoke("jti-1", 100));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_purge_expired() {
        let store = RevocationStore::new();
        store.revoke("old", 100);
        store.revoke("live", 300);

        assert_eq!(store.purge_expired(200), 1);
        assert!(!store.is_revoked("old"));
        assert!(store.is_revoked("live"));
    }

    #[test]
    fn test_concurrent_revoke() {
        let store = Arc::new(RevocationStore::new());

        let mut handles = vec![];
        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store.revoke(&format!("jti-{}", i), 1000);
                store.revoke("shared", 1000);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 11);
        assert!(store.is_revoked("shared"));
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let store = Arc::new(RevocationStore::new());
        store.revoke("expired", 0);

        let (tx, rx) = watch::channel(false);
        let handle = store
            .clone()
            .spawn_sweeper(Duration::from_millis(10), rx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.is_empty());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
