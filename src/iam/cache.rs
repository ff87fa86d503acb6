//! LRU cache of role permission lists
//!
//! A role's permissions are fetched at most once per resolver; repeated
//! lookups (the same role bound several times, or several permission checks)
//! are served from here.

use lru::LruCache;
use std::num::NonZeroUsize;

/// Cached permission lookup result; `None` records a role that was skipped
type Entry = Option<Vec<String>>;

/// LRU cache keyed by role identifier
pub struct RoleCache {
    cache: LruCache<String, Entry>,
}

impl RoleCache {
    /// Create a cache holding up to `capacity` roles (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        RoleCache {
            cache: LruCache::new(capacity),
        }
    }

    /// Get cached permissions for a role
    pub fn get(&mut self, role: &str) -> Option<&Entry> {
        self.cache.get(role)
    }

    /// Record the permissions fetched for a role
    pub fn put(&mut self, role: &str, permissions: Entry) {
        self.cache.put(role.to_string(), permissions);
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Get cache size
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
