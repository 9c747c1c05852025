//! Ranked insight lists derived from a completed analysis.

use crate::analyzer::GraphStats;
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;

/// A single ranked entry: issue ID plus the metric value that ranked
/// it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightItem {
    pub id: String,
    pub value: f64,
}

/// Actionable summary of the graph analysis. Every list is ordered
/// value descending with ID-ascending tie-breaks, except
/// `articulation` and `orphans` which are plain ID-ascending sets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Insights {
    /// Top betweenness: traffic chokepoints.
    pub bottlenecks: Vec<InsightItem>,
    /// Top critical-path positions: schedule anchors.
    pub keystones: Vec<InsightItem>,
    /// Top eigenvector centrality.
    pub influencers: Vec<InsightItem>,
    /// Strong dependency aggregators.
    pub hubs: Vec<InsightItem>,
    /// Strong prerequisite providers.
    pub authorities: Vec<InsightItem>,
    /// Highest k-core membership.
    pub cores: Vec<InsightItem>,
    /// Cut vertices whose removal disconnects the graph.
    pub articulation: Vec<String>,
    /// Highest slack: parallelisable work.
    pub slack: Vec<InsightItem>,
    /// Isolated issues with no dependency edges at all.
    pub orphans: Vec<String>,
    pub cycles: Vec<Vec<String>>,
    pub cluster_density: f64,
}

impl GraphStats {
    /// Build insights from the completed Phase 2 metrics. Blocks until
    /// the latch fires; fails if the Phase 2 worker failed.
    ///
    /// `limit <= 0` keeps every item.
    pub fn generate_insights(&self, limit: i64) -> Result<Insights> {
        let metrics = self.wait_for_phase2()?;
        let limit = if limit <= 0 {
            usize::MAX
        } else {
            limit as usize
        };

        Ok(Insights {
            bottlenecks: top_items(&metrics.betweenness, limit),
            keystones: top_items(&metrics.critical_path, limit),
            influencers: top_items(&metrics.eigenvector, limit),
            hubs: top_items(&metrics.hubs, limit),
            authorities: top_items(&metrics.authorities, limit),
            cores: top_items_usize(&metrics.core_number, limit),
            articulation: limit_strings(&metrics.articulation, limit),
            slack: top_items(&metrics.slack, limit),
            orphans: limit_strings(&self.orphans, limit),
            cycles: metrics.cycles.clone(),
            cluster_density: self.density,
        })
    }
}

fn top_items(map: &HashMap<String, f64>, limit: usize) -> Vec<InsightItem> {
    let mut items: Vec<InsightItem> = map
        .iter()
        .map(|(id, &value)| InsightItem {
            id: id.clone(),
            value,
        })
        .collect();
    items.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    items.truncate(limit);
    items
}

fn top_items_usize(map: &HashMap<String, usize>, limit: usize) -> Vec<InsightItem> {
    let as_float: HashMap<String, f64> = map
        .iter()
        .map(|(id, &value)| (id.clone(), value as f64))
        .collect();
    top_items(&as_float, limit)
}

fn limit_strings(values: &[String], limit: usize) -> Vec<String> {
    values.iter().take(limit).cloned().collect()
}
