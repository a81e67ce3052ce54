//! In-memory directory listings.
//!
//! Archive directories live on a network share and some hold tens of
//! thousands of drawings; enumerating one is by far the slowest thing a pass
//! does. [`ListingCache`] enumerates each directory at most once per pass and
//! is then kept in step with the moves the process itself makes through
//! [`add`](ListingCache::add) and [`remove`](ListingCache::remove).
//!
//! Nobody else is expected to write to archive subdirectories while a pass is
//! running. If someone does, the pass works from a stale listing until the
//! next one; the exact-name check in the resolver stats the real file system
//! so a stale listing can't cause an overwrite.

use crate::error::{ErrorKind, Result};
use crate::path::normalize_key;
use archivist_naming::has_recognized_extension;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::fs;
use tokio::sync::OnceCell;

/// Snapshot of the drawing files believed to exist in one directory.
#[derive(Debug, Default)]
pub struct Listing {
    names: Mutex<BTreeSet<String>>,
}
impl Listing {
    fn new(names: BTreeSet<String>) -> Self {
        Self { names: Mutex::new(names) }
    }

    fn names(&self) -> MutexGuard<'_, BTreeSet<String>> {
        // Nothing panics while holding this lock; and if it somehow did, the
        // set itself is still a valid set.
        self.names.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().contains(name)
    }

    /// Names for which `predicate` holds, in sorted order.
    pub fn filter(&self, predicate: impl Fn(&str) -> bool) -> Vec<String> {
        self.names().iter().filter(|name| predicate(name)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

type Slot = Arc<OnceCell<Arc<Listing>>>;

/// Lazily populated, per-directory listing cache.
///
/// One instance is meant to live for exactly one archive pass and be shared
/// (by reference) between the workers of that pass.
#[derive(Debug, Default)]
pub struct ListingCache {
    directories: Mutex<HashMap<PathBuf, Slot>>,
    enumerations: AtomicUsize,
}
impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn directories(&self) -> MutexGuard<'_, HashMap<PathBuf, Slot>> {
        self.directories.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the listing for `dir`, enumerating it if this is the first time
    /// it has been asked for.
    ///
    /// Concurrent callers for the same directory share one enumeration: the
    /// map lock only hands out the directory's slot, and the slot's
    /// [`OnceCell`] lets exactly one caller run the enumeration while the
    /// others wait for its result. A failed enumeration leaves the slot empty
    /// so a later call can try again.
    ///
    /// A directory that doesn't exist yet lists as empty.
    pub async fn ensure(&self, dir: &Path) -> Result<Arc<Listing>> {
        let slot = self.directories().entry(normalize_key(dir)).or_default().clone();
        let listing = slot
            .get_or_try_init(|| async {
                let names = enumerate(dir).await?;
                self.enumerations.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(dir = %dir.display(), files = names.len(), "Enumerated directory");
                Ok::<_, crate::error::Error>(Arc::new(Listing::new(names)))
            })
            .await?;
        Ok(Arc::clone(listing))
    }

    /// The listing for `dir` if it has already been enumerated. Never does I/O.
    pub fn cached(&self, dir: &Path) -> Option<Arc<Listing>> {
        self.directories().get(&normalize_key(dir)).and_then(|slot| slot.get().cloned())
    }

    /// Forgets `name` in `dir`'s listing. No-op if the directory was never
    /// enumerated or the name isn't there.
    pub fn remove(&self, dir: &Path, name: &str) {
        if let Some(listing) = self.cached(dir) {
            listing.names().remove(name);
        }
    }

    /// Records `name` in `dir`'s listing, but only if the directory has
    /// already been enumerated: adding to an unknown directory would create a
    /// listing that claims to be complete when it isn't.
    pub fn add(&self, dir: &Path, name: &str) {
        if let Some(listing) = self.cached(dir) {
            listing.names().insert(name.to_string());
        }
    }

    /// How many real directory enumerations this cache has performed.
    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::Relaxed)
    }
}

pub(crate) async fn enumerate(dir: &Path) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
        Err(e) => exn::bail!(ErrorKind::from_io(e, dir)),
    };
    while let Some(entry) = entries.next_entry().await.map_err(|e| ErrorKind::from_io(e, dir))? {
        // Non-UTF-8 names can never match the drawing grammar anyway.
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !has_recognized_extension(&name) {
            continue;
        }
        // DirEntry::file_type is free on most platforms (comes with readdir).
        match entry.file_type().await {
            Ok(kind) if kind.is_dir() => continue,
            _ => {},
        }
        names.insert(name);
    }
    Ok(names)
}
