//! Per-key mutual exclusion.
//!
//! The update protocol (read, compare, snapshot, write content, write metadata, reindex)
//! spans several filesystem operations and the history version number is derived from
//! the files on disk. Two writers on the same page must therefore never interleave.
//! Writers on different pages do not contend.

use crate::codec::StorageKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct KeyLocks {
    slots: Mutex<HashMap<StorageKey, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex guarding `key`. Hold its guard for the whole write protocol.
    pub fn slot(&self, key: &StorageKey) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock();
        // Drop slots nobody else holds so the map does not grow with every page ever touched.
        slots.retain(|k, slot| k == key || Arc::strong_count(slot) > 1);
        slots.entry(key.clone()).or_default().clone()
    }

    /// Slots for two distinct keys, smallest key first. Locking them in the returned
    /// order keeps concurrent renames from deadlocking.
    pub fn ordered(&self, a: &StorageKey, b: &StorageKey) -> [Arc<Mutex<()>>; 2] {
        debug_assert!(a != b, "ordered() needs two distinct keys");
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        [self.slot(lo), self.slot(hi)]
    }
}
