//! Caching layer storage: an in-process key/value store with per-entry expiry.
//!
//! The [`CacheStore`] trait is what the caching and invalidation layers talk to.
//! [`MemoryCache`] is the bundled implementation.
//!
//! Values are opaque to the store: they are stored as [`CacheValue`]
//! (`Arc<dyn Any + Send + Sync>`) and only the caching layer knows which response type
//! to downcast them to.
//!
//! ## Expiry
//!
//! An entry inserted with a TTL is treated as absent once the TTL has elapsed, whether
//! or not anything removed it. Expired entries are evicted eagerly on access and in
//! bulk by [`MemoryCache::purge_expired`]. Time is read from [`tokio::time::Instant`],
//! so a paused test clock controls expiry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// Opaque cached value.
pub type CacheValue = Arc<dyn Any + Send + Sync>;

/// Errors produced by a [`CacheStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// A thread panicked while holding the store lock.
    #[error("cache lock poisoned")]
    Poisoned,

    /// The backing store could not be reached.
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Key/value storage with optional per-entry expiry.
///
/// # Contract
///
/// - All methods may be called concurrently from many dispatches.
/// - Operations on the same key are linearizable: once `remove` has returned, no
///   `get` observes the removed value.
/// - `get` never returns an expired entry.
/// - `remove` on a missing key is a no-op.
pub trait CacheStore: Send + Sync {
    /// Returns the live value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError>;

    /// Inserts or overwrites the entry for `key`. With `ttl = None` it never expires.
    fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Deletes the entry for `key` if present.
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

// A single stored value with its bookkeeping timestamps.
struct CacheEntry {
    value: CacheValue,
    inserted_at: Instant,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-memory [`CacheStore`] guarded by a single mutex.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use rmediator::cache::{CacheStore, MemoryCache};
///
/// let cache = MemoryCache::new();
/// cache.set("answer", Arc::new(42_u32), None).unwrap();
///
/// let value = cache.get("answer").unwrap().unwrap();
/// assert_eq!(value.downcast_ref::<u32>(), Some(&42));
/// ```
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CacheEntry>>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Number of stored entries, including expired entries not yet evicted.
    ///
    /// Returns `0` if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns `true` if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if a live entry exists for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }

    /// When the live entry for `key` was inserted.
    pub fn inserted_at(&self, key: &str) -> Option<Instant> {
        let now = Instant::now();
        let entries = self.lock().ok()?;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.inserted_at)
    }

    /// Drops every entry.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.lock()?.clear();
        Ok(())
    }

    /// Evicts every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - entries.len())
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;

        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => return Ok(Some(Arc::clone(&entry.value))),
            Some(_) => {}
        }

        entries.remove(key);
        Ok(None)
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> Result<(), CacheError> {
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            inserted_at: now,
            // A TTL too large to represent never elapses.
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
        };
        self.lock()?.insert(key.to_owned(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
