//! Per-document serialization.
//!
//! Resolving a revision is a read-decide-move sequence against one archive
//! directory. Two workers doing that for the same drawing at the same time
//! could both conclude they are the latest revision, so every resolution runs
//! under a lock keyed by `(directory, document)`. Different documents, or the
//! same document headed for different directories, never contend.

use crate::path::normalize_key;
use archivist_naming::DocumentKey;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Unused locks are swept once the table grows past this many entries.
const PRUNE_THRESHOLD: usize = 1024;

type Key = (PathBuf, DocumentKey);

/// Table of document locks, created on first use.
#[derive(Debug, Default)]
pub struct DocumentLocks {
    locks: Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>,
}
impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn locks(&self) -> MutexGuard<'_, HashMap<Key, Arc<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The lock for `document` in `dir`. Calling this twice with equivalent
    /// paths returns the same lock.
    pub fn lock_for(&self, dir: &Path, document: &DocumentKey) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks();
        if locks.len() >= PRUNE_THRESHOLD {
            // Only the table holds a reference, so nobody is holding or
            // waiting on it, and nobody can grab it while we hold the table.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry((normalize_key(dir), document.clone())).or_default().clone()
    }

    /// Waits for and takes the lock for `document` in `dir`. The lock is
    /// released when the guard is dropped.
    pub async fn acquire(&self, dir: &Path, document: &DocumentKey) -> OwnedMutexGuard<()> {
        let lock = self.lock_for(dir, document);
        if let Ok(guard) = Arc::clone(&lock).try_lock_owned() {
            return guard;
        }
        tracing::debug!(dir = %dir.display(), %document, "Waiting for document lock");
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivist_naming::ParsedName;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn key(name: &str) -> DocumentKey {
        ParsedName::parse(name).unwrap().document_key()
    }

    #[test]
    fn test_same_lock_for_equivalent_keys() {
        let locks = DocumentLocks::new();
        let a = locks.lock_for(Path::new("/archive/costruttivi/Am"), &key("DAM123456R01S01M.tif"));
        let b = locks.lock_for(Path::new("/archive/costruttivi/./Am/"), &key("DAM123456R02S02I.tif"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_distinct_locks() {
        let locks = DocumentLocks::new();
        let a = locks.lock_for(Path::new("/archive/costruttivi/Am"), &key("DAM123456R01S01M.tif"));
        let b = locks.lock_for(Path::new("/archive/costruttivi/Am"), &key("DAM654321R01S01M.tif"));
        let c = locks.lock_for(Path::new("/archive/costruttivi/Bm"), &key("DAM123456R01S01M.tif"));
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 3);
    }

    #[test]
    fn test_prunes_idle_locks() {
        let locks = DocumentLocks::new();
        let held = locks.lock_for(Path::new("/held"), &key("DAM000000R01S01M.tif"));
        for i in 1..PRUNE_THRESHOLD {
            locks.lock_for(Path::new("/idle"), &key(&format!("DAM{:06}R01S01M.tif", i)));
        }
        assert_eq!(locks.len(), PRUNE_THRESHOLD);
        // Next insert sweeps everything nobody references.
        locks.lock_for(Path::new("/new"), &key("DAM999999R01S01M.tif"));
        assert_eq!(locks.len(), 2);
        let again = locks.lock_for(Path::new("/held"), &key("DAM000000R01S01M.tif"));
        assert!(Arc::ptr_eq(&held, &again));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_serializes_same_document() {
        let locks = Arc::new(DocumentLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let (locks, inside, peak) = (Arc::clone(&locks), Arc::clone(&inside), Arc::clone(&peak));
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(Path::new("/archive/Am"), &key("DAM123456R01S01M.tif")).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
