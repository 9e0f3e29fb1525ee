use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use shelf_core::{Article, OwnerId, StatusFilter};
use shelf_logging::shelf_debug;

/// Search entries kept per owner before the oldest batch is dropped.
const MAX_SEARCH_ENTRIES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Status(StatusFilter),
    /// Lowercased search needle.
    Search(String),
}

#[derive(Debug, Default)]
struct OwnerEntry {
    generation: u64,
    listings: HashMap<CacheKey, Vec<Article>>,
}

/// Listing and search results per `(owner, key)`.
///
/// Every invalidation bumps the owner's generation. A result computed under
/// an older generation is refused on insert, so a read that raced a
/// mutation can never repopulate the cache with pre-mutation data.
#[derive(Debug, Default)]
pub struct ListingCache {
    owners: Mutex<HashMap<OwnerId, OwnerEntry>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: &OwnerId, key: &CacheKey) -> Option<Vec<Article>> {
        let owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        let hit = owners
            .get(owner)
            .and_then(|entry| entry.listings.get(key))
            .cloned();
        shelf_debug!(
            "cache {} owner={} key={:?}",
            if hit.is_some() { "hit" } else { "miss" },
            owner,
            key
        );
        hit
    }

    /// Generation to pass back to [`ListingCache::insert`].
    pub fn generation(&self, owner: &OwnerId) -> u64 {
        let owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        owners.get(owner).map_or(0, |entry| entry.generation)
    }

    /// Stores `articles` unless the owner was invalidated since `generation`
    /// was read. Returns whether the entry was stored.
    pub fn insert(
        &self,
        owner: &OwnerId,
        key: CacheKey,
        generation: u64,
        articles: Vec<Article>,
    ) -> bool {
        let mut owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = owners.entry(owner.clone()).or_default();
        if entry.generation != generation {
            shelf_debug!("cache refused stale entry owner={} key={:?}", owner, key);
            return false;
        }
        if matches!(key, CacheKey::Search(_)) {
            let searches = entry
                .listings
                .keys()
                .filter(|key| matches!(key, CacheKey::Search(_)))
                .count();
            if searches >= MAX_SEARCH_ENTRIES {
                entry
                    .listings
                    .retain(|key, _| !matches!(key, CacheKey::Search(_)));
            }
        }
        entry.listings.insert(key, articles);
        true
    }

    pub fn invalidate(&self, owner: &OwnerId) {
        let mut owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = owners.entry(owner.clone()).or_default();
        entry.generation += 1;
        entry.listings.clear();
        shelf_debug!("cache invalidated owner={} generation={}", owner, entry.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::ArticleStatus;

    fn owner(id: &str) -> OwnerId {
        OwnerId::new(id)
    }

    #[test]
    fn invalidation_is_scoped_to_owner() {
        let cache = ListingCache::new();
        let key = CacheKey::Status(StatusFilter::All);
        assert!(cache.insert(&owner("a"), key.clone(), 0, Vec::new()));
        assert!(cache.insert(&owner("b"), key.clone(), 0, Vec::new()));

        cache.invalidate(&owner("a"));

        assert_eq!(cache.get(&owner("a"), &key), None);
        assert_eq!(cache.get(&owner("b"), &key), Some(Vec::new()));
    }

    #[test]
    fn read_that_raced_a_mutation_is_refused() {
        let cache = ListingCache::new();
        let key = CacheKey::Status(StatusFilter::Only(ArticleStatus::Completed));
        let before = cache.generation(&owner("a"));

        cache.invalidate(&owner("a"));

        assert!(!cache.insert(&owner("a"), key.clone(), before, Vec::new()));
        assert_eq!(cache.get(&owner("a"), &key), None);
        let now = cache.generation(&owner("a"));
        assert!(cache.insert(&owner("a"), key.clone(), now, Vec::new()));
    }

    #[test]
    fn search_entries_are_bounded() {
        let cache = ListingCache::new();
        let listing = CacheKey::Status(StatusFilter::All);
        cache.insert(&owner("a"), listing.clone(), 0, Vec::new());
        for i in 0..=MAX_SEARCH_ENTRIES {
            cache.insert(&owner("a"), CacheKey::Search(format!("q{i}")), 0, Vec::new());
        }
        assert!(cache.get(&owner("a"), &CacheKey::Search("q0".into())).is_none());
        assert!(cache
            .get(&owner("a"), &CacheKey::Search(format!("q{MAX_SEARCH_ENTRIES}")))
            .is_some());
        assert!(cache.get(&owner("a"), &listing).is_some());
    }
}
