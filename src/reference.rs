// Reference data cache and identifier resolver
// Holds the three lookup lists (categories, destinations, durations) and answers slug <-> id
// questions against whatever has been loaded so far.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::payload::ReferenceItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Categories,
    Destinations,
    Durations,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 3] = [
        ReferenceKind::Categories,
        ReferenceKind::Destinations,
        ReferenceKind::Durations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Categories => "categories",
            ReferenceKind::Destinations => "destinations",
            ReferenceKind::Durations => "durations",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Why a filter value could not be turned into a canonical selection. None of these are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{kind} not loaded yet, '{key}' left pending")]
    NotLoaded { kind: ReferenceKind, key: String },

    #[error("unresolved {kind} reference '{key}'")]
    UnresolvedReference { kind: ReferenceKind, key: String },

    #[error("malformed '{param}' parameter: '{value}'")]
    MalformedInput { param: String, value: String },
}

// One loaded lookup list, indexed both ways
#[derive(Debug, Default)]
pub struct ReferenceList {
    items: Vec<ReferenceItem>,
    by_slug: HashMap<String, usize>,
    by_id: HashMap<i64, usize>,
}

impl ReferenceList {
    pub fn new(items: Vec<ReferenceItem>) -> Self {
        let mut by_slug = HashMap::with_capacity(items.len());
        let mut by_id = HashMap::with_capacity(items.len());

        // First occurrence wins if the backend ever sends duplicate keys
        for (index, item) in items.iter().enumerate() {
            by_slug.entry(item.slug.clone()).or_insert(index);
            by_id.entry(item.id).or_insert(index);
        }

        Self {
            items,
            by_slug,
            by_id,
        }
    }

    pub fn items(&self) -> &[ReferenceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&ReferenceItem> {
        self.by_slug.get(slug).map(|&i| &self.items[i])
    }

    pub fn get_by_id(&self, id: i64) -> Option<&ReferenceItem> {
        self.by_id.get(&id).map(|&i| &self.items[i])
    }
}

#[derive(Debug, Default)]
pub struct CatalogStats {
    pub hit_count: AtomicUsize,
    pub miss_count: AtomicUsize,
    pub pending_count: AtomicUsize,
    pub load_count: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatalogStatsReport {
    pub hit_count: usize,
    pub miss_count: usize,
    pub pending_count: usize,
    pub load_count: usize,
}

// Lookup seam used by the filter state. Returning None means "unresolved, retry later".
pub trait IdentifierResolver {
    fn resolve_id_from_slug(&self, kind: ReferenceKind, slug: &str) -> Option<i64>;

    fn resolve_slug_from_id(&self, kind: ReferenceKind, id: i64) -> Option<String>;

    fn is_loaded(&self, kind: ReferenceKind) -> bool;
}

#[derive(Debug, Default)]
pub struct ReferenceCatalog {
    lists: DashMap<ReferenceKind, Arc<ReferenceList>>,
    stats: CatalogStats,
}

impl ReferenceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    // Replaces the list for `kind`; returns how many records were stored
    pub fn store(&self, kind: ReferenceKind, items: Vec<ReferenceItem>) -> usize {
        let list = ReferenceList::new(items);
        let count = list.len();
        self.lists.insert(kind, Arc::new(list));
        self.stats.load_count.fetch_add(1, Ordering::SeqCst);
        debug!(kind = %kind, count, "reference list stored");
        count
    }

    pub fn list(&self, kind: ReferenceKind) -> Option<Arc<ReferenceList>> {
        self.lists.get(&kind).map(|entry| Arc::clone(entry.value()))
    }

    pub fn lookup_id(&self, kind: ReferenceKind, slug: &str) -> Result<i64, ResolveError> {
        let Some(list) = self.list(kind) else {
            self.stats.pending_count.fetch_add(1, Ordering::SeqCst);
            return Err(ResolveError::NotLoaded {
                kind,
                key: slug.to_string(),
            });
        };

        match list.get_by_slug(slug) {
            Some(item) => {
                self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
                Ok(item.id)
            }
            None => {
                self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
                Err(ResolveError::UnresolvedReference {
                    kind,
                    key: slug.to_string(),
                })
            }
        }
    }

    pub fn lookup_slug(&self, kind: ReferenceKind, id: i64) -> Result<String, ResolveError> {
        let Some(list) = self.list(kind) else {
            self.stats.pending_count.fetch_add(1, Ordering::SeqCst);
            return Err(ResolveError::NotLoaded {
                kind,
                key: id.to_string(),
            });
        };

        match list.get_by_id(id) {
            Some(item) => {
                self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
                Ok(item.slug.clone())
            }
            None => {
                self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
                Err(ResolveError::UnresolvedReference {
                    kind,
                    key: id.to_string(),
                })
            }
        }
    }

    pub fn stats(&self) -> CatalogStatsReport {
        CatalogStatsReport {
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            pending_count: self.stats.pending_count.load(Ordering::SeqCst),
            load_count: self.stats.load_count.load(Ordering::SeqCst),
        }
    }
}

impl IdentifierResolver for ReferenceCatalog {
    fn resolve_id_from_slug(&self, kind: ReferenceKind, slug: &str) -> Option<i64> {
        self.lookup_id(kind, slug)
            .map_err(|e| debug!(error = %e, "slug lookup"))
            .ok()
    }

    fn resolve_slug_from_id(&self, kind: ReferenceKind, id: i64) -> Option<String> {
        self.lookup_slug(kind, id)
            .map_err(|e| debug!(error = %e, "id lookup"))
            .ok()
    }

    fn is_loaded(&self, kind: ReferenceKind) -> bool {
        self.lists.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destinations() -> Vec<ReferenceItem> {
        vec![
            ReferenceItem::new(7, "cairo", "Cairo"),
            ReferenceItem::new(9, "luxor", "Luxor"),
            ReferenceItem::new(11, "aswan", "Aswan"),
        ]
    }

    #[test]
    fn test_unloaded_collection_is_pending_not_error() {
        let catalog = ReferenceCatalog::new();

        assert!(!catalog.is_loaded(ReferenceKind::Destinations));
        assert_eq!(
            catalog.resolve_id_from_slug(ReferenceKind::Destinations, "cairo"),
            None
        );
        assert_eq!(
            catalog.lookup_id(ReferenceKind::Destinations, "cairo"),
            Err(ResolveError::NotLoaded {
                kind: ReferenceKind::Destinations,
                key: "cairo".to_string()
            })
        );
        assert_eq!(catalog.stats().pending_count, 2);
    }

    #[test]
    fn test_slug_id_round_trip_for_every_loaded_item() {
        let catalog = ReferenceCatalog::new();
        catalog.store(ReferenceKind::Destinations, destinations());

        for item in destinations() {
            let id = catalog
                .resolve_id_from_slug(ReferenceKind::Destinations, &item.slug)
                .unwrap();
            assert_eq!(id, item.id);
            assert_eq!(
                catalog.resolve_slug_from_id(ReferenceKind::Destinations, id),
                Some(item.slug.clone())
            );
        }
    }

    #[test]
    fn test_collections_are_independent() {
        let catalog = ReferenceCatalog::new();
        catalog.store(ReferenceKind::Destinations, destinations());
        catalog.store(
            ReferenceKind::Durations,
            vec![ReferenceItem::new(7, "one-week", "One week")],
        );

        assert_eq!(
            catalog.resolve_slug_from_id(ReferenceKind::Durations, 7),
            Some("one-week".to_string())
        );
        assert_eq!(
            catalog.resolve_slug_from_id(ReferenceKind::Destinations, 7),
            Some("cairo".to_string())
        );
        assert_eq!(
            catalog.resolve_id_from_slug(ReferenceKind::Categories, "cairo"),
            None
        );
    }

    #[test]
    fn test_unknown_key_counts_as_miss() {
        let catalog = ReferenceCatalog::new();
        catalog.store(ReferenceKind::Destinations, destinations());

        assert_eq!(
            catalog.lookup_id(ReferenceKind::Destinations, "paris"),
            Err(ResolveError::UnresolvedReference {
                kind: ReferenceKind::Destinations,
                key: "paris".to_string()
            })
        );
        assert_eq!(catalog.resolve_slug_from_id(ReferenceKind::Destinations, 404), None);

        let stats = catalog.stats();
        assert_eq!(stats.miss_count, 2);
        assert_eq!(stats.load_count, 1);
    }

    #[test]
    fn test_duplicate_keys_keep_first_record() {
        let list = ReferenceList::new(vec![
            ReferenceItem::new(1, "beach", "Beach"),
            ReferenceItem::new(2, "beach", "Beach again"),
        ]);

        assert_eq!(list.get_by_slug("beach").map(|i| i.id), Some(1));
        assert_eq!(list.get_by_id(2).map(|i| i.title.as_str()), Some("Beach again"));
        assert_eq!(list.len(), 2);
    }
}
