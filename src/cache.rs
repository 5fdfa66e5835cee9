//! In-process cache for product listing pages.
//!
//! Each listing page is cached under an explicit key derived from its query
//! parameters, so different paginations never collide. Entries expire after
//! [`LISTING_TTL`], and the import reconciler clears the whole cache after a
//! successful commit so readers never see a pre-import page once the run has
//! been acknowledged.

use crate::models::ProductPage;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// How long a cached listing page stays fresh without explicit invalidation.
pub const LISTING_TTL: Duration = Duration::from_secs(60);

/// Cache key for one listing page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub page: i64,
    pub per_page: i64,
}

struct CachedPage {
    payload: ProductPage,
    inserted_at: Instant,
}

/// Thread-safe TTL cache over listing pages.
///
/// DashMap allows concurrent reads from request handlers while the
/// reconciler invalidates entries.
pub struct ListingCache {
    entries: DashMap<ListingKey, CachedPage>,
    ttl: Duration,
    // Bumped on every invalidation so a page read from storage before an
    // invalidation cannot be inserted after it (see `insert_at`).
    generation: AtomicU64,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::with_ttl(LISTING_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// Current invalidation generation. Capture this before reading from
    /// storage and pass it to [`ListingCache::insert_at`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Fetch a fresh page, dropping the entry if it has expired.
    pub fn get(&self, key: &ListingKey) -> Option<ProductPage> {
        {
            let entry = self.entries.get(key)?;
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.payload.clone());
            }
            // Guard must be released before the remove below.
        }
        self.entries.remove(key);
        None
    }

    pub fn insert(&self, key: ListingKey, payload: ProductPage) {
        self.entries.insert(
            key,
            CachedPage {
                payload,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Insert a page that was read from storage while `generation` was
    /// current. Dropped silently if an invalidation happened in between, so
    /// a slow read racing an import cannot re-cache pre-import data.
    pub fn insert_at(&self, key: ListingKey, payload: ProductPage, generation: u64) {
        if self.generation.load(Ordering::Acquire) != generation {
            return;
        }
        self.insert(key, payload);
    }

    /// Remove a single cached page.
    pub fn invalidate(&self, key: &ListingKey) {
        self.generation.fetch_add(1, Ordering::Release);
        self.entries.remove(key);
    }

    /// Remove every cached page. Called after a successful reconciliation,
    /// since a full refresh can change any page of the listing.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::Release);
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ListingCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(total: i64) -> ProductPage {
        ProductPage {
            data: Vec::new(),
            page: 1,
            per_page: 10,
            total,
        }
    }

    fn key() -> ListingKey {
        ListingKey {
            page: 1,
            per_page: 10,
        }
    }

    #[test]
    fn returns_fresh_entries() {
        let cache = ListingCache::new();
        cache.insert(key(), page(3));

        let hit = cache.get(&key()).expect("entry should be fresh");
        assert_eq!(hit.total, 3);
    }

    #[test]
    fn expires_stale_entries() {
        let cache = ListingCache::with_ttl(Duration::from_millis(0));
        cache.insert(key(), page(3));

        assert!(cache.get(&key()).is_none());
        assert!(cache.is_empty(), "expired entry should be evicted on read");
    }

    #[test]
    fn keys_are_parameter_scoped() {
        let cache = ListingCache::new();
        cache.insert(key(), page(1));
        cache.insert(
            ListingKey {
                page: 2,
                per_page: 10,
            },
            page(2),
        );

        assert_eq!(cache.get(&key()).map(|p| p.total), Some(1));
        assert_eq!(
            cache
                .get(&ListingKey {
                    page: 2,
                    per_page: 10,
                })
                .map(|p| p.total),
            Some(2)
        );
        assert!(
            cache
                .get(&ListingKey {
                    page: 1,
                    per_page: 25,
                })
                .is_none()
        );
    }

    #[test]
    fn invalidate_all_clears_every_page() {
        let cache = ListingCache::new();
        cache.insert(key(), page(1));
        cache.insert(
            ListingKey {
                page: 2,
                per_page: 10,
            },
            page(2),
        );

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn stale_read_cannot_repopulate_after_invalidation() {
        let cache = ListingCache::new();

        // A read started before the invalidation carries the old generation
        // and must be discarded.
        let stale_generation = cache.generation();
        cache.invalidate_all();
        cache.insert_at(key(), page(1), stale_generation);
        assert!(cache.get(&key()).is_none());

        // A read started afterwards lands normally.
        let current = cache.generation();
        cache.insert_at(key(), page(2), current);
        assert_eq!(cache.get(&key()).map(|p| p.total), Some(2));
    }

    #[test]
    fn single_key_invalidation_also_fences_stale_reads() {
        let cache = ListingCache::new();
        let stale_generation = cache.generation();

        cache.invalidate(&key());
        cache.insert_at(key(), page(1), stale_generation);
        assert!(cache.get(&key()).is_none());
    }

    #[test]
    fn invalidate_removes_single_key() {
        let cache = ListingCache::new();
        cache.insert(key(), page(1));
        cache.insert(
            ListingKey {
                page: 2,
                per_page: 10,
            },
            page(2),
        );

        cache.invalidate(&key());
        assert!(cache.get(&key()).is_none());
        assert_eq!(cache.len(), 1);
    }
}
