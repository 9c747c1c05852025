use crate::error::{Result, SearchError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Per-issue metrics consumed by the hybrid scorer. All fields of one
/// entry come from the same snapshot; partial views never exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueMetrics {
    pub issue_id: String,
    pub pagerank: f64,
    pub status: String,
    pub priority: i64,
    /// Active issues directly depending on this one via `blocks`.
    pub blocker_count: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Capability set the cache pulls metrics through. The engine wires
/// this to the analyzer; tests substitute fixtures.
pub trait MetricsLoader: Send + Sync {
    fn load_metrics(&self) -> Result<HashMap<String, IssueMetrics>>;
    fn compute_data_hash(&self) -> Result<String>;
}

#[derive(Default)]
struct MetricsView {
    metrics: HashMap<String, IssueMetrics>,
    max_blocker_count: usize,
    data_hash: String,
}

/// Snapshot-consistent metrics cache with O(1) lookups.
///
/// `refresh` is single-flight: concurrent callers serialise on the
/// refresh mutex while readers keep seeing the previous view until the
/// new one is swapped in whole.
pub struct MetricsCache {
    loader: Box<dyn MetricsLoader>,
    view: RwLock<Arc<MetricsView>>,
    refresh_lock: Mutex<()>,
}

impl MetricsCache {
    pub fn new(loader: Box<dyn MetricsLoader>) -> Self {
        Self {
            loader,
            view: RwLock::new(Arc::new(MetricsView::default())),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Reload metrics if the snapshot hash changed. Returns whether a
    /// reload happened.
    pub fn refresh(&self) -> Result<bool> {
        let _guard = self.refresh_lock.lock().expect("refresh lock poisoned");

        let fresh_hash = self.loader.compute_data_hash()?;
        if fresh_hash == self.current_view().data_hash {
            return Ok(false);
        }

        log::debug!("Metrics cache stale, reloading for hash {fresh_hash}");
        let metrics = self.loader.load_metrics()?;
        let max_blocker_count = metrics.values().map(|m| m.blocker_count).max().unwrap_or(0);

        let view = Arc::new(MetricsView {
            metrics,
            max_blocker_count,
            data_hash: fresh_hash,
        });
        *self.view.write().expect("view lock poisoned") = view;
        Ok(true)
    }

    pub fn get(&self, issue_id: &str) -> Option<IssueMetrics> {
        self.current_view().metrics.get(issue_id).cloned()
    }

    pub fn get_batch(&self, issue_ids: &[String]) -> HashMap<String, IssueMetrics> {
        let view = self.current_view();
        issue_ids
            .iter()
            .filter_map(|id| view.metrics.get(id).map(|m| (id.clone(), m.clone())))
            .collect()
    }

    /// Denominator for impact normalisation; tracks the loaded view.
    pub fn max_blocker_count(&self) -> usize {
        self.current_view().max_blocker_count
    }

    /// Digest of the currently loaded view; empty before first refresh.
    pub fn data_hash(&self) -> String {
        self.current_view().data_hash.clone()
    }

    /// Fail unless the loaded view matches `expected_hash`. Scoring
    /// against a view from a different snapshot silently skews every
    /// structural component, so callers check this after a refresh.
    pub fn ensure_fresh(&self, expected_hash: &str) -> Result<()> {
        let loaded = self.current_view().data_hash.clone();
        if loaded != expected_hash {
            return Err(SearchError::MetricsStale(format!(
                "cache holds {loaded:?}, expected {expected_hash:?}"
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.current_view().metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current_view().metrics.is_empty()
    }

    fn current_view(&self) -> Arc<MetricsView> {
        self.view.read().expect("view lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixtureLoader {
        metrics: HashMap<String, IssueMetrics>,
        hash: String,
    }

    impl FixtureLoader {
        fn new(entries: &[(&str, usize)], hash: &str) -> Self {
            let metrics = entries
                .iter()
                .map(|&(id, blockers)| {
                    (
                        id.to_string(),
                        IssueMetrics {
                            issue_id: id.to_string(),
                            pagerank: 0.25,
                            status: "open".to_string(),
                            priority: 1,
                            blocker_count: blockers,
                            updated_at: None,
                        },
                    )
                })
                .collect();
            Self {
                metrics,
                hash: hash.to_string(),
            }
        }
    }

    impl MetricsLoader for FixtureLoader {
        fn load_metrics(&self) -> Result<HashMap<String, IssueMetrics>> {
            Ok(self.metrics.clone())
        }

        fn compute_data_hash(&self) -> Result<String> {
            Ok(self.hash.clone())
        }
    }

    #[test]
    fn refresh_loads_once_per_hash() {
        let cache = MetricsCache::new(Box::new(FixtureLoader::new(&[("A", 2), ("B", 5)], "h1")));
        assert!(cache.refresh().unwrap());
        assert!(!cache.refresh().unwrap(), "same hash must be a no-op");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.max_blocker_count(), 5);
        assert_eq!(cache.data_hash(), "h1");
    }

    #[test]
    fn get_and_batch_lookups() {
        let cache = MetricsCache::new(Box::new(FixtureLoader::new(&[("A", 1), ("B", 0)], "h")));
        cache.refresh().unwrap();

        assert_eq!(cache.get("A").unwrap().blocker_count, 1);
        assert!(cache.get("missing").is_none());

        let batch = cache.get_batch(&["A".to_string(), "missing".to_string()]);
        assert_eq!(batch.len(), 1);
        assert!(batch.contains_key("A"));
    }

    #[test]
    fn ensure_fresh_tracks_loaded_hash() {
        let cache = MetricsCache::new(Box::new(FixtureLoader::new(&[("A", 1)], "h1")));

        // Nothing loaded yet: any expectation is stale.
        assert!(matches!(
            cache.ensure_fresh("h1"),
            Err(SearchError::MetricsStale(_))
        ));

        cache.refresh().unwrap();
        cache.ensure_fresh("h1").unwrap();
        assert!(matches!(
            cache.ensure_fresh("h2"),
            Err(SearchError::MetricsStale(_))
        ));
    }

    #[test]
    fn empty_before_first_refresh() {
        let cache = MetricsCache::new(Box::new(FixtureLoader::new(&[], "h")));
        assert!(cache.is_empty());
        assert_eq!(cache.data_hash(), "");
        assert_eq!(cache.max_blocker_count(), 0);
    }
}
