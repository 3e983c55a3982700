//! Per-path async mutual exclusion.
//!
//! Entries live in a map owned by the store instance and are dropped when
//! the last holder or waiter for a path goes away.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

type LockMap = HashMap<PathBuf, Arc<AsyncMutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct PathLocks {
    entries: Arc<Mutex<LockMap>>,
}

/// Exclusive access to one path; released on drop.
#[derive(Debug)]
pub struct PathGuard {
    key: PathBuf,
    lock: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
    entries: Arc<Mutex<LockMap>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other holder owns `path`, then take it.
    pub async fn acquire(&self, path: &Path) -> PathGuard {
        let key = resolve_key(path);
        let lock = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(
                entries
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        let guard = Arc::clone(&lock).lock_owned().await;
        trace!(path = %key.display(), "path lock acquired");
        PathGuard {
            key,
            lock,
            guard: Some(guard),
            entries: Arc::clone(&self.entries),
        }
    }

    /// Run `op` while holding the lock for `path`.
    pub async fn with_lock<F, Fut, T>(&self, path: &Path, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.acquire(path).await;
        op().await
    }

    /// Number of paths currently locked or awaited.
    pub fn active(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        // Map + this guard are the only owners: nobody is waiting.
        let idle = entries
            .get(&self.key)
            .is_some_and(|entry| Arc::ptr_eq(entry, &self.lock) && Arc::strong_count(entry) == 2);
        if idle {
            entries.remove(&self.key);
        }
        trace!(path = %self.key.display(), "path lock released");
    }
}

fn resolve_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn serializes_operations_on_one_path() {
        let locks = PathLocks::new();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let in_flight = Arc::clone(&in_flight);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                locks
                    .with_lock(Path::new("/tmp/notegraph-lock-test.txt"), || async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn different_paths_do_not_block() {
        let locks = PathLocks::new();
        let first = locks.acquire(Path::new("/tmp/a.txt")).await;
        let second = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(Path::new("/tmp/b.txt")),
        )
        .await
        .expect("second path should not wait");
        assert_eq!(locks.active(), 2);
        drop(first);
        drop(second);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn entry_released_after_error() {
        let locks = PathLocks::new();
        let result: Result<(), &str> = locks
            .with_lock(Path::new("relative/file.txt"), || async { Err("boom") })
            .await;
        assert!(result.is_err());
        assert_eq!(locks.active(), 0);
    }
}
