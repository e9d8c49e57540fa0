//! Thread-safe keyed table for per-session state.
//!
//! A generic map backed by `DashMap` for concurrent access. The share
//! backend keys it by session identifier to cache one repository context per
//! connected client.
//!
//! # Entry Lifecycle
//!
//! 1. **Get-or-insert**: The first request of a session creates its entry
//! 2. **Remove**: The entry is dropped when the session ends

use dashmap::DashMap;
use std::hash::Hash;

/// Thread-safe keyed table.
///
/// # Example
///
/// ```
/// use repodrive_mount::HandleTable;
/// use std::sync::Arc;
///
/// let table: HandleTable<u64, Arc<String>> = HandleTable::new();
///
/// let first = table.get_or_insert_with(1, || Arc::new("alice".to_string()));
/// let again = table.get_or_insert_with(1, || Arc::new("ignored".to_string()));
///
/// assert!(Arc::ptr_eq(&first, &again));
/// assert_eq!(table.len(), 1);
///
/// assert_eq!(table.remove(&1).as_deref().map(String::as_str), Some("alice"));
/// assert!(table.is_empty());
/// ```
#[derive(Debug)]
pub struct HandleTable<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, V>,
}

impl<K, V> HandleTable<K, V>
where
    K: Eq + Hash,
{
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Remove an entry by key and return it.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> HandleTable<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Return the value under `key`, creating it with `init` if absent.
    ///
    /// Creation happens under the shard lock: concurrent callers for the same
    /// key all observe the single value that won. Values are expected to be
    /// cheap to clone (typically an `Arc`), so no shard guard escapes the
    /// table.
    pub fn get_or_insert_with<F>(&self, key: K, init: F) -> V
    where
        F: FnOnce() -> V,
    {
        self.entries.entry(key).or_insert_with(init).value().clone()
    }
}

impl<K, V> Default for HandleTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
