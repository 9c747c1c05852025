use crate::centrality;
use crate::config::AnalysisConfig;
use crate::critical_path;
use crate::error::{GraphError, Result};
use crate::structure;
use crate::types::{CompactGraph, DependencyGraph};
use beads_model::Snapshot;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// How Phase 2 is scheduled relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Structural facts only; the Phase 2 latch never fires.
    Phase1Only,
    /// Compute Phase 2 inline before returning.
    Phase2Sync,
    /// Compute Phase 2 on a detached worker; readers poll the latch.
    Phase2Async,
}

/// Expensive centralities, published atomically once complete.
#[derive(Debug, Default, Clone)]
pub struct Phase2Metrics {
    pub pagerank: HashMap<String, f64>,
    pub betweenness: HashMap<String, f64>,
    pub eigenvector: HashMap<String, f64>,
    pub hubs: HashMap<String, f64>,
    pub authorities: HashMap<String, f64>,
    pub core_number: HashMap<String, usize>,
    /// Cut vertices of the undirected projection, ID ascending.
    pub articulation: Vec<String>,
    pub critical_path: HashMap<String, f64>,
    pub slack: HashMap<String, f64>,
    /// Representative cycles, each rotated to its smallest ID, sorted
    /// lexicographically.
    pub cycles: Vec<Vec<String>>,
}

enum LatchState {
    Pending,
    Ready(Arc<Phase2Metrics>),
    Unavailable(String),
}

/// One-shot publish point for Phase 2. Readers observe either
/// "pending" or the complete metrics, never a torn state.
struct Phase2Latch {
    state: Mutex<LatchState>,
    cond: Condvar,
}

impl Phase2Latch {
    fn new() -> Self {
        Self {
            state: Mutex::new(LatchState::Pending),
            cond: Condvar::new(),
        }
    }

    fn publish(&self, metrics: Phase2Metrics) {
        let mut state = self.state.lock().expect("latch poisoned");
        if matches!(*state, LatchState::Pending) {
            *state = LatchState::Ready(Arc::new(metrics));
            self.cond.notify_all();
        }
    }

    fn fail(&self, reason: String) {
        let mut state = self.state.lock().expect("latch poisoned");
        if matches!(*state, LatchState::Pending) {
            *state = LatchState::Unavailable(reason);
            self.cond.notify_all();
        }
    }

    fn get(&self) -> Option<Arc<Phase2Metrics>> {
        match &*self.state.lock().expect("latch poisoned") {
            LatchState::Ready(metrics) => Some(metrics.clone()),
            _ => None,
        }
    }

    fn is_ready(&self) -> bool {
        matches!(
            *self.state.lock().expect("latch poisoned"),
            LatchState::Ready(_)
        )
    }

    fn wait(&self) -> Result<Arc<Phase2Metrics>> {
        let mut state = self.state.lock().expect("latch poisoned");
        loop {
            match &*state {
                LatchState::Ready(metrics) => return Ok(metrics.clone()),
                LatchState::Unavailable(reason) => {
                    return Err(GraphError::Phase2Unavailable(reason.clone()))
                }
                LatchState::Pending => {
                    state = self.cond.wait(state).expect("latch poisoned");
                }
            }
        }
    }
}

/// Per-stage wall-clock durations from [`Analyzer::analyze_with_profile`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisProfile {
    pub stages: Vec<(&'static str, Duration)>,
    pub total: Duration,
}

impl AnalysisProfile {
    fn record(&mut self, name: &'static str, started: Instant) {
        self.stages.push((name, started.elapsed()));
    }
}

/// Result handle of one analysis run. Phase 1 fields are plain data;
/// Phase 2 is read through the latch.
pub struct GraphStats {
    pub data_hash: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub dropped_edges: usize,
    pub in_degree: HashMap<String, usize>,
    pub out_degree: HashMap<String, usize>,
    /// Nodes with no blocking edges in either direction, ID ascending.
    pub orphans: Vec<String>,
    /// Nodes no other issue depends on, ID ascending.
    pub leaves: Vec<String>,
    /// Non-trivial strongly connected components.
    pub sccs: Vec<Vec<String>>,
    pub has_cycles: bool,
    pub status_counts: BTreeMap<String, usize>,
    pub config: AnalysisConfig,
    latch: Arc<Phase2Latch>,
}

impl GraphStats {
    pub fn is_phase2_ready(&self) -> bool {
        self.latch.is_ready()
    }

    /// Complete Phase 2 metrics, or `None` while the worker is still
    /// running (or after it failed).
    pub fn phase2(&self) -> Option<Arc<Phase2Metrics>> {
        self.latch.get()
    }

    /// Block until Phase 2 publishes or fails.
    pub fn wait_for_phase2(&self) -> Result<Arc<Phase2Metrics>> {
        self.latch.wait()
    }

    pub fn pagerank_score(&self, id: &str) -> f64 {
        self.phase2_value(|m| m.pagerank.get(id).copied())
    }

    pub fn betweenness_score(&self, id: &str) -> f64 {
        self.phase2_value(|m| m.betweenness.get(id).copied())
    }

    pub fn eigenvector_score(&self, id: &str) -> f64 {
        self.phase2_value(|m| m.eigenvector.get(id).copied())
    }

    pub fn hub_score(&self, id: &str) -> f64 {
        self.phase2_value(|m| m.hubs.get(id).copied())
    }

    pub fn authority_score(&self, id: &str) -> f64 {
        self.phase2_value(|m| m.authorities.get(id).copied())
    }

    pub fn critical_path_score(&self, id: &str) -> f64 {
        self.phase2_value(|m| m.critical_path.get(id).copied())
    }

    pub fn slack_score(&self, id: &str) -> f64 {
        self.phase2_value(|m| m.slack.get(id).copied())
    }

    pub fn core_number(&self, id: &str) -> usize {
        self.latch
            .get()
            .and_then(|m| m.core_number.get(id).copied())
            .unwrap_or(0)
    }

    pub fn is_articulation(&self, id: &str) -> bool {
        self.latch
            .get()
            .map(|m| m.articulation.iter().any(|a| a == id))
            .unwrap_or(false)
    }

    fn phase2_value(&self, read: impl Fn(&Phase2Metrics) -> Option<f64>) -> f64 {
        self.latch
            .get()
            .and_then(|metrics| read(&metrics))
            .unwrap_or(0.0)
    }
}

/// Two-phase analyzer over one snapshot's dependency graph.
pub struct Analyzer {
    graph: DependencyGraph,
    data_hash: String,
    status_counts: BTreeMap<String, usize>,
    /// Active (non-closed) issue flags in compact node order.
    active: Vec<bool>,
}

impl Analyzer {
    /// Build the analytic graph. Fails on self-loops.
    pub fn new(snapshot: &Snapshot) -> Result<Self> {
        let graph = DependencyGraph::from_snapshot(snapshot)?;
        let active = graph
            .ids
            .iter()
            .map(|id| {
                snapshot
                    .get(id)
                    .map(|issue| issue.status.is_active())
                    .unwrap_or(false)
            })
            .collect();
        Ok(Self {
            graph,
            data_hash: snapshot.data_hash().to_string(),
            status_counts: snapshot.status_counts(),
            active,
        })
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Number of active issues directly depending on `id` via a
    /// blocking edge.
    pub fn blocker_count(&self, id: &str) -> usize {
        let compact = self.graph.compact();
        let Some(v) = self.graph.ids.iter().position(|i| i == id) else {
            return 0;
        };
        compact.inn[v].iter().filter(|&&u| self.active[u]).count()
    }

    /// Blocker counts for every node, keyed by issue ID.
    pub fn blocker_counts(&self) -> HashMap<String, usize> {
        let compact = self.graph.compact();
        self.graph
            .ids
            .iter()
            .enumerate()
            .map(|(v, id)| {
                let count = compact.inn[v].iter().filter(|&&u| self.active[u]).count();
                (id.clone(), count)
            })
            .collect()
    }

    pub fn analyze(&self, config: AnalysisConfig, mode: AnalysisMode) -> Arc<GraphStats> {
        self.run(config, mode, None)
    }

    /// Full synchronous analysis with per-stage timings.
    pub fn analyze_with_profile(
        &self,
        config: AnalysisConfig,
    ) -> (Arc<GraphStats>, AnalysisProfile) {
        let mut profile = AnalysisProfile::default();
        let total = Instant::now();
        let stats = self.run(config, AnalysisMode::Phase2Sync, Some(&mut profile));
        profile.total = total.elapsed();
        (stats, profile)
    }

    fn run(
        &self,
        config: AnalysisConfig,
        mode: AnalysisMode,
        mut profile: Option<&mut AnalysisProfile>,
    ) -> Arc<GraphStats> {
        let started = Instant::now();
        let compact = self.graph.compact();
        let ids = self.graph.ids.clone();

        let mut in_degree = HashMap::with_capacity(ids.len());
        let mut out_degree = HashMap::with_capacity(ids.len());
        let mut orphans = Vec::new();
        let mut leaves = Vec::new();
        for (v, id) in ids.iter().enumerate() {
            in_degree.insert(id.clone(), compact.inn[v].len());
            out_degree.insert(id.clone(), compact.out[v].len());
            if compact.inn[v].is_empty() && compact.out[v].is_empty() {
                orphans.push(id.clone());
            }
            if compact.inn[v].is_empty() {
                leaves.push(id.clone());
            }
        }

        let sccs_compact = strongly_connected_components(&self.graph);
        let sccs: Vec<Vec<String>> = sccs_compact
            .iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut names: Vec<String> = scc.iter().map(|&v| ids[v].clone()).collect();
                names.sort();
                names
            })
            .collect();
        let has_cycles = !sccs.is_empty();

        if let Some(p) = profile.as_deref_mut() {
            p.record("phase1", started);
        }

        let latch = Arc::new(Phase2Latch::new());
        let stats = Arc::new(GraphStats {
            data_hash: self.data_hash.clone(),
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            density: self.graph.density(),
            dropped_edges: self.graph.dropped_edges,
            in_degree,
            out_degree,
            orphans,
            leaves,
            sccs,
            has_cycles,
            status_counts: self.status_counts.clone(),
            config: config.clone(),
            latch: latch.clone(),
        });

        match mode {
            AnalysisMode::Phase1Only => {}
            AnalysisMode::Phase2Sync => {
                run_phase2(&latch, compact, ids, sccs_compact, config, profile);
            }
            AnalysisMode::Phase2Async => {
                let worker_latch = latch.clone();
                std::thread::spawn(move || {
                    run_phase2(&worker_latch, compact, ids, sccs_compact, config, None);
                });
            }
        }

        stats
    }
}

fn run_phase2(
    latch: &Phase2Latch,
    compact: CompactGraph,
    ids: Vec<String>,
    sccs: Vec<Vec<usize>>,
    config: AnalysisConfig,
    profile: Option<&mut AnalysisProfile>,
) {
    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        compute_phase2(&compact, &ids, &sccs, &config, profile)
    }));
    match outcome {
        Ok(metrics) => latch.publish(metrics),
        Err(_) => {
            log::warn!("Phase 2 worker panicked; centralities unavailable for this run");
            latch.fail("phase 2 worker panicked".to_string());
        }
    }
}

fn compute_phase2(
    compact: &CompactGraph,
    ids: &[String],
    sccs: &[Vec<usize>],
    config: &AnalysisConfig,
    profile: Option<&mut AnalysisProfile>,
) -> Phase2Metrics {
    // Profiled runs stay sequential so stage timings mean something;
    // otherwise independent stage groups share a bounded worker set.
    let workers = config.size_profile.max_workers();
    if workers <= 1 || profile.is_some() {
        return compute_phase2_sequential(compact, ids, sccs, config, profile);
    }
    compute_phase2_parallel(compact, ids, sccs, config, workers)
}

/// Stage groups with disjoint outputs, safe to compute concurrently.
fn compute_phase2_parallel(
    compact: &CompactGraph,
    ids: &[String],
    sccs: &[Vec<usize>],
    config: &AnalysisConfig,
    workers: usize,
) -> Phase2Metrics {
    type StageGroup<'a> = Box<dyn FnOnce() -> Phase2Metrics + Send + 'a>;

    let mut groups: Vec<StageGroup> = Vec::new();
    groups.push(Box::new(|| {
        let mut part = Phase2Metrics::default();
        if config.enable_pagerank {
            part.pagerank = to_map(ids, centrality::pagerank(compact));
        }
        if config.enable_eigenvector {
            part.eigenvector = to_map(ids, centrality::eigenvector(compact));
        }
        if config.enable_hits {
            let (hubs, authorities) = centrality::hits(compact);
            part.hubs = to_map(ids, hubs);
            part.authorities = to_map(ids, authorities);
        }
        part
    }));
    groups.push(Box::new(|| {
        let mut part = Phase2Metrics::default();
        if config.enable_betweenness {
            part.betweenness = to_map(ids, centrality::betweenness(compact));
        }
        part
    }));
    groups.push(Box::new(|| {
        let mut part = Phase2Metrics::default();
        let undirected = compact.undirected();
        if config.enable_core_number {
            part.core_number = ids
                .iter()
                .zip(structure::core_numbers(&undirected))
                .map(|(id, core)| (id.clone(), core))
                .collect();
        }
        if config.enable_articulation {
            part.articulation = ids
                .iter()
                .zip(structure::articulation_points(&undirected))
                .filter(|(_, cut)| *cut)
                .map(|(id, _)| id.clone())
                .collect();
            part.articulation.sort();
        }
        part
    }));
    groups.push(Box::new(|| {
        let mut part = Phase2Metrics::default();
        if config.enable_cycles {
            let mut cycles: Vec<Vec<String>> =
                structure::simple_cycles(compact, sccs, config.cycle_limit)
                    .into_iter()
                    .map(|cycle| cycle.into_iter().map(|v| ids[v].clone()).collect())
                    .collect();
            cycles.sort();
            cycles.truncate(config.cycle_limit);
            part.cycles = cycles;
        }
        if config.enable_critical_path {
            let cp = critical_path::critical_path(compact, sccs);
            part.critical_path = to_map(ids, cp.score);
            part.slack = to_map(ids, cp.slack);
        }
        part
    }));

    let queue = Mutex::new(groups.into_iter());
    let parts = Mutex::new(Vec::new());
    std::thread::scope(|scope| {
        for _ in 0..workers.min(4) {
            scope.spawn(|| loop {
                let Some(group) = queue.lock().expect("queue poisoned").next() else {
                    break;
                };
                let part = group();
                parts.lock().expect("parts poisoned").push(part);
            });
        }
    });

    let mut metrics = Phase2Metrics::default();
    for part in parts.into_inner().expect("parts poisoned") {
        merge_phase2(&mut metrics, part);
    }
    metrics
}

fn merge_phase2(into: &mut Phase2Metrics, part: Phase2Metrics) {
    if !part.pagerank.is_empty() {
        into.pagerank = part.pagerank;
    }
    if !part.betweenness.is_empty() {
        into.betweenness = part.betweenness;
    }
    if !part.eigenvector.is_empty() {
        into.eigenvector = part.eigenvector;
    }
    if !part.hubs.is_empty() {
        into.hubs = part.hubs;
    }
    if !part.authorities.is_empty() {
        into.authorities = part.authorities;
    }
    if !part.core_number.is_empty() {
        into.core_number = part.core_number;
    }
    if !part.articulation.is_empty() {
        into.articulation = part.articulation;
    }
    if !part.critical_path.is_empty() {
        into.critical_path = part.critical_path;
    }
    if !part.slack.is_empty() {
        into.slack = part.slack;
    }
    if !part.cycles.is_empty() {
        into.cycles = part.cycles;
    }
}

fn compute_phase2_sequential(
    compact: &CompactGraph,
    ids: &[String],
    sccs: &[Vec<usize>],
    config: &AnalysisConfig,
    mut profile: Option<&mut AnalysisProfile>,
) -> Phase2Metrics {
    let mut metrics = Phase2Metrics::default();
    let mut stage = |profile: &mut Option<&mut AnalysisProfile>,
                     name: &'static str,
                     started: Instant| {
        if let Some(p) = profile.as_deref_mut() {
            p.record(name, started);
        }
    };

    if config.enable_pagerank {
        let started = Instant::now();
        metrics.pagerank = to_map(ids, centrality::pagerank(compact));
        stage(&mut profile, "pagerank", started);
    }
    if config.enable_betweenness {
        let started = Instant::now();
        metrics.betweenness = to_map(ids, centrality::betweenness(compact));
        stage(&mut profile, "betweenness", started);
    }
    if config.enable_eigenvector {
        let started = Instant::now();
        metrics.eigenvector = to_map(ids, centrality::eigenvector(compact));
        stage(&mut profile, "eigenvector", started);
    }
    if config.enable_hits {
        let started = Instant::now();
        let (hubs, authorities) = centrality::hits(compact);
        metrics.hubs = to_map(ids, hubs);
        metrics.authorities = to_map(ids, authorities);
        stage(&mut profile, "hits", started);
    }

    let undirected = compact.undirected();
    if config.enable_core_number {
        let started = Instant::now();
        metrics.core_number = ids
            .iter()
            .zip(structure::core_numbers(&undirected))
            .map(|(id, core)| (id.clone(), core))
            .collect();
        stage(&mut profile, "core_number", started);
    }
    if config.enable_articulation {
        let started = Instant::now();
        metrics.articulation = ids
            .iter()
            .zip(structure::articulation_points(&undirected))
            .filter(|(_, cut)| *cut)
            .map(|(id, _)| id.clone())
            .collect();
        metrics.articulation.sort();
        stage(&mut profile, "articulation", started);
    }
    if config.enable_cycles {
        let started = Instant::now();
        let mut cycles: Vec<Vec<String>> = structure::simple_cycles(compact, sccs, config.cycle_limit)
            .into_iter()
            .map(|cycle| cycle.into_iter().map(|v| ids[v].clone()).collect())
            .collect();
        cycles.sort();
        cycles.truncate(config.cycle_limit);
        metrics.cycles = cycles;
        stage(&mut profile, "cycles", started);
    }
    if config.enable_critical_path {
        let started = Instant::now();
        let cp = critical_path::critical_path(compact, sccs);
        metrics.critical_path = to_map(ids, cp.score);
        metrics.slack = to_map(ids, cp.slack);
        stage(&mut profile, "critical_path", started);
    }

    metrics
}

fn to_map(ids: &[String], values: Vec<f64>) -> HashMap<String, f64> {
    ids.iter().cloned().zip(values).collect()
}

/// Tarjan SCC over the backing petgraph. Nodes were inserted in
/// ascending ID order, so `NodeIndex::index()` equals the compact
/// index. Members and components are sorted for deterministic output.
fn strongly_connected_components(graph: &DependencyGraph) -> Vec<Vec<usize>> {
    let mut components: Vec<Vec<usize>> = petgraph::algo::tarjan_scc(&graph.graph)
        .into_iter()
        .map(|scc| {
            let mut members: Vec<usize> = scc.into_iter().map(|idx| idx.index()).collect();
            members.sort_unstable();
            members
        })
        .collect();
    components.sort_by_key(|c| c[0]);
    components
}
