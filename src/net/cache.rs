//! Page cache
//!
//! Maps a page index to the result set fetched for it. Entries are written
//! once and live as long as the cache: no TTL, no size bound, no
//! invalidation. Readers are expected to check [`PageCache::has`] before
//! fetching; two readers racing on the same uncached page may both fetch,
//! and the first write wins.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared page store. Clones are handles to the same storage.
pub struct PageCache<T> {
    pages: Arc<RwLock<HashMap<u32, Arc<Vec<T>>>>>,
}

impl<T> Clone for PageCache<T> {
    fn clone(&self) -> Self {
        Self {
            pages: Arc::clone(&self.pages),
        }
    }
}

impl<T> Default for PageCache<T> {
    fn default() -> Self {
        Self {
            pages: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T> PageCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page: u32) -> Option<Arc<Vec<T>>> {
        self.pages.read().get(&page).cloned()
    }

    pub fn has(&self, page: u32) -> bool {
        self.pages.read().contains_key(&page)
    }

    /// Store a page unless it is already present. Returns whether it was stored.
    pub fn set(&self, page: u32, data: Arc<Vec<T>>) -> bool {
        let mut pages = self.pages.write();
        if pages.contains_key(&page) {
            return false;
        }
        pages.insert(page, data);
        true
    }

    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.read().is_empty()
    }

    /// Cached page indices, ascending
    pub fn pages(&self) -> Vec<u32> {
        let mut keys: Vec<u32> = self.pages.read().keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

impl<T> fmt::Debug for PageCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCache")
            .field("pages", &self.pages())
            .finish()
    }
}
