//! Skip-cache: nucleation clusters known to fail hard, per filter.
//!
//! A cluster that produces `FailHardStop` for a rupture will do so for every
//! rupture that extends it, so filters record those clusters here and skip
//! them when the cache is passed back in for a superset rupture.

use std::collections::{HashMap, HashSet};

use super::FilterId;
use crate::model::Cluster;

/// Per-rupture side table of clusters each filter may skip.
#[derive(Debug, Clone, Default)]
pub struct SkipCache {
    skips: HashMap<FilterId, HashSet<Cluster>>,
}

impl SkipCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache for a rupture that extends the one `parent` was built for.
    pub fn inherit(parent: &SkipCache) -> Self {
        parent.clone()
    }

    pub fn contains(&self, filter: FilterId, cluster: &Cluster) -> bool {
        self.skips
            .get(&filter)
            .is_some_and(|set| set.contains(cluster))
    }

    pub fn insert(&mut self, filter: FilterId, cluster: Cluster) {
        self.skips.entry(filter).or_default().insert(cluster);
    }

    /// Number of skipped clusters recorded for `filter`.
    pub fn len(&self, filter: FilterId) -> usize {
        self.skips.get(&filter).map_or(0, HashSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.skips.values().all(HashSet::is_empty)
    }
}

/// Skip caches for the ruptures of one evaluation session, keyed by ids the
/// caller assigns. A cache is only ever seeded from the cache of the rupture
/// the caller names as its parent, so ruptures that merely share a section
/// set never see each other's entries.
#[derive(Debug, Default)]
pub struct SkipSession {
    caches: HashMap<usize, SkipCache>,
}

impl SkipSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache for rupture `id`, created on first use. A new cache is seeded
    /// from `parent`'s cache when `parent` has one. The caller must only name
    /// a parent that `id` extends (see `Rupture::extends`).
    pub fn cache_for(&mut self, id: usize, parent: Option<usize>) -> &mut SkipCache {
        if !self.caches.contains_key(&id) {
            let seeded = parent
                .and_then(|p| self.caches.get(&p))
                .map(SkipCache::inherit)
                .unwrap_or_default();
            self.caches.insert(id, seeded);
        }
        self.caches.entry(id).or_default()
    }

    /// Drops the cache for rupture `id` once nothing will extend it.
    pub fn release(&mut self, id: usize) -> Option<SkipCache> {
        self.caches.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Section;

    fn cluster(parent: u32, ids: &[u32]) -> Cluster {
        Cluster::new(ids.iter().map(|&id| Section::new(id, parent)).collect()).unwrap()
    }

    #[test]
    fn entries_are_per_filter() {
        let a = cluster(0, &[0, 1]);
        let mut cache = SkipCache::new();
        assert!(cache.is_empty());
        cache.insert(FilterId(1), a.clone());
        assert!(cache.contains(FilterId(1), &a));
        assert!(!cache.contains(FilterId(2), &a));
        assert_eq!(cache.len(FilterId(1)), 1);
        assert_eq!(cache.len(FilterId(2)), 0);
    }

    #[test]
    fn session_seeds_child_from_parent() {
        let a = cluster(0, &[0, 1]);
        let b = cluster(1, &[2]);

        let mut session = SkipSession::new();
        session.cache_for(0, None).insert(FilterId(7), a.clone());
        let inherited = session.cache_for(1, Some(0));
        assert!(inherited.contains(FilterId(7), &a));
        inherited.insert(FilterId(7), b.clone());

        assert!(!session.cache_for(0, None).contains(FilterId(7), &b));
        assert_eq!(session.len(), 2);
        assert!(session.release(0).is_some());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn siblings_do_not_share_caches() {
        let a = cluster(0, &[0, 1]);
        let mut session = SkipSession::new();
        session.cache_for(0, None);
        session.cache_for(1, Some(0)).insert(FilterId(3), a.clone());
        // a second child of 0 starts from 0's cache, not from its sibling's
        assert!(!session.cache_for(2, Some(0)).contains(FilterId(3), &a));
        // an unknown parent seeds nothing
        assert!(session.cache_for(3, Some(9)).is_empty());
    }
}
