//! Shared, size-bounded response body cache.
//!
//! Entries sit newest-at-front in a `VecDeque`. Eviction scans for the
//! smallest timestamp; ties go to the entry closest to the back. Many
//! `get` calls run in parallel under `RwLock::read`, `put` is exclusive.
//! `get` returns an owned clone of the body, not a borrow, so the read
//! lock is released before the caller writes the bytes out.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::MAX_CACHE_SIZE;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// A single cached response body.
pub struct CacheEntry {
    key: String,
    body: Bytes,
    size: usize,
    /// Last-use timestamp, one-second resolution. Updated by readers
    /// holding only the shared read guard; racy under concurrent
    /// readers, advisory for eviction ordering only.
    timestamp: AtomicU64,
}

impl CacheEntry {
    fn new(key: String, body: Bytes, size: usize) -> Self {
        Self {
            key,
            body,
            size,
            timestamp: AtomicU64::new(now_secs()),
        }
    }
}

/// The shared cache store. Wrap in `Arc<CacheStore>` and clone the `Arc`,
/// not the store.
pub struct CacheStore {
    entries: RwLock<VecDeque<CacheEntry>>,
    total_size: AtomicUsize,
}

impl CacheStore {
    /// One-time initialization: an empty cache.
    pub fn init() -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            total_size: AtomicUsize::new(0),
        }
    }

    /// Looks up `key`. On a hit, refreshes the entry's timestamp and
    /// returns an owned clone of the body plus its size; `None` on a
    /// miss. Never fails otherwise.
    pub async fn get(&self, key: &str) -> Option<(Bytes, usize)> {
        let entries = self.entries.read().await;
        for entry in entries.iter() {
            if entry.key == key {
                entry.timestamp.store(now_secs(), Ordering::Relaxed);
                tracing::debug!(key, "cache hit");
                return Some((entry.body.clone(), entry.size));
            }
        }
        tracing::debug!(key, "cache miss");
        None
    }

    /// Admits `body` under `key`, taking ownership of both. A prior entry
    /// for `key` is replaced; its size is refunded before the new size is
    /// added, so the replacement is never double-counted. Evicts the
    /// smallest-timestamp entry, repeatedly, until the size bound holds.
    ///
    /// Callers must not pass bodies larger than `MAX_OBJECT_SIZE`; the
    /// store does not re-check this itself.
    pub async fn put(&self, key: String, body: Bytes, size: usize) {
        let mut entries = self.entries.write().await;

        if let Some(pos) = entries.iter().position(|e| e.key == key) {
            let replaced = entries.remove(pos).expect("position just found");
            self.total_size.fetch_sub(replaced.size, Ordering::Relaxed);
        }

        self.total_size.fetch_add(size, Ordering::Relaxed);

        while self.total_size.load(Ordering::Relaxed) > MAX_CACHE_SIZE && !entries.is_empty() {
            Self::evict(&mut entries, &self.total_size);
        }

        tracing::debug!(key, size, "cache admit");
        entries.push_front(CacheEntry::new(key, body, size));
    }

    /// Evicts the entry with the smallest timestamp. Scans front-to-back
    /// with `timestamp <= victim.timestamp`, so among equal timestamps
    /// the back-most (earliest inserted) entry wins.
    fn evict(entries: &mut VecDeque<CacheEntry>, total_size: &AtomicUsize) {
        let mut victim = 0;
        let mut victim_ts = entries[0].timestamp.load(Ordering::Relaxed);
        for (i, entry) in entries.iter().enumerate() {
            let ts = entry.timestamp.load(Ordering::Relaxed);
            if ts <= victim_ts {
                victim = i;
                victim_ts = ts;
            }
        }
        let evicted = entries.remove(victim).expect("victim index in range");
        total_size.fetch_sub(evicted.size, Ordering::Relaxed);
        tracing::info!(key = evicted.key, timestamp = victim_ts, "cache evict");
    }

    /// Current total size across all resident entries.
    pub fn total_size(&self) -> usize {
        self.total_size.load(Ordering::Relaxed)
    }

    /// Number of resident entries. Test/diagnostic use.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::init()
    }
}
