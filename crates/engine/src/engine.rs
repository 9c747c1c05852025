use crate::error::Result;
use beads_graph::{AnalysisConfig, AnalysisMode, Analyzer, GraphStats};
use beads_model::{Issue, Snapshot};
use beads_search::{IssueMetrics, MetricsCache, MetricsLoader};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

/// Process-wide engines keyed by project root. Tests that need
/// isolation construct their own [`Engine`] instead.
static ENGINES: Lazy<Mutex<HashMap<PathBuf, Arc<Engine>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Project root resolution: `BEADS_DIR` or the current directory.
pub fn project_root_from_env() -> PathBuf {
    std::env::var("BEADS_DIR")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Default)]
struct LoaderSlot {
    data_hash: String,
    metrics: HashMap<String, IssueMetrics>,
}

/// Feeds the metrics cache from the most recent analysis. The engine
/// fills the slot before asking the cache to refresh, so the cache's
/// hash check decides whether a reload is needed.
struct AnalysisMetricsLoader {
    slot: Arc<RwLock<LoaderSlot>>,
}

impl MetricsLoader for AnalysisMetricsLoader {
    fn load_metrics(&self) -> beads_search::Result<HashMap<String, IssueMetrics>> {
        Ok(self.slot.read().expect("slot lock poisoned").metrics.clone())
    }

    fn compute_data_hash(&self) -> beads_search::Result<String> {
        Ok(self
            .slot
            .read()
            .expect("slot lock poisoned")
            .data_hash
            .clone())
    }
}

struct AnalysisState {
    data_hash: String,
    stats: Arc<GraphStats>,
    blocker_counts: Arc<HashMap<String, usize>>,
}

/// Everything a report builder needs for one snapshot.
pub(crate) struct Prepared {
    pub snapshot: Snapshot,
    pub stats: Arc<GraphStats>,
    pub blocker_counts: Arc<HashMap<String, usize>>,
}

/// Process-lived analysis engine for one project root. Owns the
/// analyzer result cache, the metrics cache, and (lazily) the vector
/// index; everything rebuilds when the snapshot's `data_hash` changes.
pub struct Engine {
    project_root: PathBuf,
    analysis: Mutex<Option<AnalysisState>>,
    loader_slot: Arc<RwLock<LoaderSlot>>,
    metrics: Arc<MetricsCache>,
}

impl Engine {
    pub fn new(project_root: &Path) -> Self {
        let loader_slot = Arc::new(RwLock::new(LoaderSlot::default()));
        let metrics = Arc::new(MetricsCache::new(Box::new(AnalysisMetricsLoader {
            slot: loader_slot.clone(),
        })));
        Self {
            project_root: project_root.to_path_buf(),
            analysis: Mutex::new(None),
            loader_slot,
            metrics,
        }
    }

    /// Shared engine for `project_root`, created on first use.
    pub fn for_project(project_root: &Path) -> Arc<Engine> {
        let mut engines = ENGINES.lock().expect("engine registry poisoned");
        engines
            .entry(project_root.to_path_buf())
            .or_insert_with(|| Arc::new(Engine::new(project_root)))
            .clone()
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn metrics_cache(&self) -> Arc<MetricsCache> {
        self.metrics.clone()
    }

    /// Build the snapshot, run (or reuse) the analysis, and refresh
    /// the metrics cache if the data hash moved.
    ///
    /// Phase 1 runs inline; Phase 2 is scheduled on a worker and
    /// report builders that need centralities wait on the latch.
    pub(crate) fn prepare(&self, issues: Vec<Issue>) -> Result<Prepared> {
        let snapshot = Snapshot::new(issues)?;

        let mut analysis = self.analysis.lock().expect("analysis lock poisoned");
        let reuse = matches!(&*analysis, Some(state) if state.data_hash == snapshot.data_hash());
        if !reuse {
            let analyzer = Analyzer::new(&snapshot)?;
            let config = AnalysisConfig::for_size(snapshot.len());
            let stats = analyzer.analyze(config, AnalysisMode::Phase2Async);
            let blocker_counts = Arc::new(analyzer.blocker_counts());
            log::debug!(
                "Analyzed snapshot {} ({} nodes, {} edges)",
                snapshot.data_hash(),
                stats.node_count,
                stats.edge_count
            );
            *analysis = Some(AnalysisState {
                data_hash: snapshot.data_hash().to_string(),
                stats,
                blocker_counts,
            });
        }
        let state = analysis.as_ref().expect("analysis state just set");
        let prepared = Prepared {
            stats: state.stats.clone(),
            blocker_counts: state.blocker_counts.clone(),
            snapshot,
        };
        drop(analysis);

        self.refresh_metrics(&prepared)?;
        Ok(prepared)
    }

    fn refresh_metrics(&self, prepared: &Prepared) -> Result<()> {
        if self.metrics.data_hash() == prepared.snapshot.data_hash() {
            return Ok(());
        }

        // Metrics include PageRank, so the slot is filled once Phase 2
        // lands; the cache then swaps in the complete view atomically.
        let phase2 = prepared.stats.wait_for_phase2()?;
        let metrics: HashMap<String, IssueMetrics> = prepared
            .snapshot
            .issues()
            .iter()
            .map(|issue| {
                (
                    issue.id.clone(),
                    IssueMetrics {
                        issue_id: issue.id.clone(),
                        pagerank: phase2.pagerank.get(&issue.id).copied().unwrap_or(0.0),
                        status: issue.status.as_str().to_string(),
                        priority: issue.priority,
                        blocker_count: prepared
                            .blocker_counts
                            .get(&issue.id)
                            .copied()
                            .unwrap_or(0),
                        updated_at: issue.updated_at,
                    },
                )
            })
            .collect();

        {
            let mut slot = self.loader_slot.write().expect("slot lock poisoned");
            slot.data_hash = prepared.snapshot.data_hash().to_string();
            slot.metrics = metrics;
        }
        self.metrics.refresh()?;
        // A concurrent caller may have raced the slot to a different
        // snapshot; scoring must not proceed against that view.
        self.metrics.ensure_fresh(prepared.snapshot.data_hash())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_model::{Dependency, Issue};

    fn issue(id: &str, deps: &[&str]) -> Issue {
        let mut issue = Issue::new(id, id);
        issue.dependencies = deps.iter().map(|d| Dependency::blocks(id, d)).collect();
        issue
    }

    #[test]
    fn prepare_caches_analysis_by_hash() {
        let engine = Engine::new(Path::new("/tmp/does-not-matter"));
        let issues = vec![issue("A", &[]), issue("B", &["A"])];

        let first = engine.prepare(issues.clone()).unwrap();
        let second = engine.prepare(issues).unwrap();
        assert_eq!(first.snapshot.data_hash(), second.snapshot.data_hash());
        assert!(Arc::ptr_eq(&first.stats, &second.stats));
    }

    #[test]
    fn metrics_cache_follows_snapshot_hash() {
        let engine = Engine::new(Path::new("/tmp/does-not-matter"));
        engine
            .prepare(vec![issue("A", &[]), issue("B", &["A"])])
            .unwrap();
        let hash_one = engine.metrics_cache().data_hash();
        assert!(!hash_one.is_empty());
        assert_eq!(engine.metrics_cache().get("A").unwrap().blocker_count, 1);

        engine.prepare(vec![issue("A", &[])]).unwrap();
        let hash_two = engine.metrics_cache().data_hash();
        assert_ne!(hash_one, hash_two);
        assert_eq!(engine.metrics_cache().get("A").unwrap().blocker_count, 0);
    }

    #[test]
    fn registry_returns_same_engine_per_root() {
        let root = Path::new("/tmp/engine-registry-test");
        let first = Engine::for_project(root);
        let second = Engine::for_project(root);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
