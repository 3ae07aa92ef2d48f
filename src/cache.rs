use crate::relations::RelationPage;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Thread-safe LRU cache of relation pages keyed by request URL
///
/// Repeated searches (re-opening the combobox, paging back over the same
/// query) are served without another round trip.
pub struct RelationPageCache {
    cache: Mutex<LruCache<String, RelationPage>>,
}

impl RelationPageCache {
    /// Create a new page cache
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of pages; values below 1 are raised to 1
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, key: &str) -> Option<RelationPage> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    pub fn put(&self, key: String, page: RelationPage) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, page);
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
