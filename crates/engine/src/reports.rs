//! Machine-readable report envelopes. Every envelope carries the
//! snapshot's `data_hash` and a non-empty `usage_hints` array; bodies
//! are bitwise-deterministic for a given snapshot and configuration
//! (timestamps aside).

use crate::engine::{Engine, Prepared};
use crate::error::Result;
use beads_model::{Issue, Status};
use beads_search::{
    normalize_impact, normalize_priority, normalize_recency, normalize_status, Preset,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

#[derive(Serialize)]
struct InsightsEnvelope {
    data_hash: String,
    generated_at: String,
    analysis_config: beads_graph::AnalysisConfig,
    status: BTreeMap<String, usize>,
    full_stats: FullStats,
    insights: beads_graph::Insights,
    usage_hints: Vec<String>,
}

#[derive(Serialize)]
struct FullStats {
    pagerank: BTreeMap<String, f64>,
    betweenness: BTreeMap<String, f64>,
    eigenvector: BTreeMap<String, f64>,
    hubs: BTreeMap<String, f64>,
    authorities: BTreeMap<String, f64>,
    core_number: BTreeMap<String, f64>,
    critical_path: BTreeMap<String, f64>,
    slack: BTreeMap<String, f64>,
}

#[derive(Serialize)]
struct PlanEnvelope {
    data_hash: String,
    plan: Plan,
    usage_hints: Vec<String>,
}

#[derive(Serialize)]
struct Plan {
    tracks: Vec<Track>,
}

#[derive(Serialize)]
struct Track {
    items: Vec<TrackItem>,
}

#[derive(Serialize)]
struct TrackItem {
    id: String,
    unblocks: Vec<String>,
}

#[derive(Serialize)]
struct PriorityEnvelope {
    data_hash: String,
    recommendations: Vec<Recommendation>,
    usage_hints: Vec<String>,
}

#[derive(Serialize)]
struct Recommendation {
    issue_id: String,
    current_priority: i64,
    suggested_priority: i64,
    direction: &'static str,
    confidence: f64,
    reasoning: Vec<String>,
}

#[derive(Serialize)]
struct TriageEnvelope {
    data_hash: String,
    generated_at: String,
    triage: Triage,
    usage_hints: Vec<String>,
}

#[derive(Serialize)]
struct Triage {
    quick_ref: QuickRef,
}

#[derive(Serialize)]
struct QuickRef {
    top_picks: Vec<TopPick>,
}

#[derive(Serialize)]
struct TopPick {
    id: String,
    score: f64,
}

fn generated_at() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `BV_INSIGHTS_MAP_LIMIT` caps the `full_stats` map sizes; 0 or
/// unset means unbounded.
fn insights_map_limit() -> usize {
    std::env::var("BV_INSIGHTS_MAP_LIMIT")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|&limit| limit > 0)
        .unwrap_or(usize::MAX)
}

fn capped_map(map: &HashMap<String, f64>, limit: usize) -> BTreeMap<String, f64> {
    if map.len() <= limit {
        return map.iter().map(|(k, &v)| (k.clone(), v)).collect();
    }
    let mut entries: Vec<(&String, f64)> = map.iter().map(|(k, &v)| (k, v)).collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    entries
        .into_iter()
        .take(limit)
        .map(|(k, v)| (k.clone(), v))
        .collect()
}

impl Engine {
    /// Graph insights with the full per-node stat maps.
    pub fn insights_report(&self, issues: Vec<Issue>, limit: i64) -> Result<Value> {
        let prepared = self.prepare(issues)?;
        let phase2 = prepared.stats.wait_for_phase2()?;
        let insights = prepared.stats.generate_insights(limit)?;

        let map_limit = insights_map_limit();
        let core_number: HashMap<String, f64> = phase2
            .core_number
            .iter()
            .map(|(id, &core)| (id.clone(), core as f64))
            .collect();
        let full_stats = FullStats {
            pagerank: capped_map(&phase2.pagerank, map_limit),
            betweenness: capped_map(&phase2.betweenness, map_limit),
            eigenvector: capped_map(&phase2.eigenvector, map_limit),
            hubs: capped_map(&phase2.hubs, map_limit),
            authorities: capped_map(&phase2.authorities, map_limit),
            core_number: capped_map(&core_number, map_limit),
            critical_path: capped_map(&phase2.critical_path, map_limit),
            slack: capped_map(&phase2.slack, map_limit),
        };

        let envelope = InsightsEnvelope {
            data_hash: prepared.snapshot.data_hash().to_string(),
            generated_at: generated_at(),
            analysis_config: prepared.stats.config.clone(),
            status: prepared.snapshot.status_counts(),
            full_stats,
            insights,
            usage_hints: vec![
                "bottlenecks rank by betweenness; unblocking them frees the most paths".to_string(),
                "articulation points disconnect the graph if removed".to_string(),
                "zero-slack issues sit on the critical path".to_string(),
            ],
        };
        Ok(serde_json::to_value(envelope)?)
    }

    /// Parallel work tracks over currently actionable issues.
    pub fn plan_report(&self, issues: Vec<Issue>) -> Result<Value> {
        let prepared = self.prepare(issues)?;
        let plan = build_plan(&prepared);

        let envelope = PlanEnvelope {
            data_hash: prepared.snapshot.data_hash().to_string(),
            plan,
            usage_hints: vec![
                "tracks are independent; assign each to a different worker".to_string(),
                "items list what they unblock; start with the widest unblocks".to_string(),
            ],
        };
        Ok(serde_json::to_value(envelope)?)
    }

    /// Priority recommendations from structural signals.
    pub fn priority_report(&self, issues: Vec<Issue>) -> Result<Value> {
        let prepared = self.prepare(issues)?;
        let recommendations = build_recommendations(&prepared);

        let envelope = PriorityEnvelope {
            data_hash: prepared.snapshot.data_hash().to_string(),
            recommendations,
            usage_hints: vec![
                "direction \"up\" means the issue blocks more urgent work".to_string(),
                "confidence scales with the number of active dependents".to_string(),
            ],
        };
        Ok(serde_json::to_value(envelope)?)
    }

    /// Quick-reference triage picks scored by structural weight.
    pub fn triage_report(&self, issues: Vec<Issue>, limit: usize) -> Result<Value> {
        let prepared = self.prepare(issues)?;
        let top_picks = build_top_picks(self, &prepared, limit.max(1));

        let envelope = TriageEnvelope {
            data_hash: prepared.snapshot.data_hash().to_string(),
            generated_at: generated_at(),
            triage: Triage {
                quick_ref: QuickRef { top_picks },
            },
            usage_hints: vec![
                "top picks blend impact, urgency, and freshness".to_string(),
                "re-run after closing an item; scores shift with the graph".to_string(),
            ],
        };
        Ok(serde_json::to_value(envelope)?)
    }
}

fn build_plan(prepared: &Prepared) -> Plan {
    let snapshot = &prepared.snapshot;
    let by_id: HashMap<&str, &Issue> = snapshot
        .issues()
        .iter()
        .map(|issue| (issue.id.as_str(), issue))
        .collect();
    let is_closed =
        |id: &str| -> bool { by_id.get(id).map(|i| i.status == Status::Closed).unwrap_or(true) };

    // Direct active dependents per issue.
    let mut unblocks: HashMap<&str, Vec<String>> = HashMap::new();
    for issue in snapshot.issues() {
        if issue.status == Status::Closed {
            continue;
        }
        for target in issue.blocking_dependencies() {
            unblocks
                .entry(by_id.get(target).map(|i| i.id.as_str()).unwrap_or(target))
                .or_default()
                .push(issue.id.clone());
        }
    }
    for dependents in unblocks.values_mut() {
        dependents.sort();
        dependents.dedup();
    }

    // Actionable: active, with every blocking prerequisite closed or
    // absent from the snapshot.
    let actionable: Vec<&Issue> = snapshot
        .issues()
        .iter()
        .filter(|issue| issue.status != Status::Closed)
        .filter(|issue| issue.blocking_dependencies().all(|dep| is_closed(dep)))
        .collect();

    // Weakly connected components over blocking edges between active
    // issues; each component becomes one track.
    let component_of = weak_components(snapshot);
    let mut tracks: BTreeMap<usize, Vec<&Issue>> = BTreeMap::new();
    for &issue in &actionable {
        let component = component_of.get(issue.id.as_str()).copied().unwrap_or(0);
        tracks.entry(component).or_default().push(issue);
    }

    let mut ordered: Vec<Vec<&Issue>> = tracks.into_values().collect();
    for members in ordered.iter_mut() {
        members.sort_by(|a, b| {
            let a_unblocks = unblocks.get(a.id.as_str()).map(Vec::len).unwrap_or(0);
            let b_unblocks = unblocks.get(b.id.as_str()).map(Vec::len).unwrap_or(0);
            a.priority
                .cmp(&b.priority)
                .then_with(|| b_unblocks.cmp(&a_unblocks))
                .then_with(|| a.id.cmp(&b.id))
        });
    }
    ordered.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a[0].id.cmp(&b[0].id))
    });

    Plan {
        tracks: ordered
            .into_iter()
            .map(|members| Track {
                items: members
                    .into_iter()
                    .map(|issue| TrackItem {
                        id: issue.id.clone(),
                        unblocks: unblocks.get(issue.id.as_str()).cloned().unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Component label per active issue over the undirected blocking
/// edges, labelled by each component's smallest member index.
fn weak_components(snapshot: &beads_model::Snapshot) -> HashMap<&str, usize> {
    let active: Vec<&Issue> = snapshot
        .issues()
        .iter()
        .filter(|issue| issue.status != Status::Closed)
        .collect();
    let index_of: HashMap<&str, usize> = active
        .iter()
        .enumerate()
        .map(|(i, issue)| (issue.id.as_str(), i))
        .collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); active.len()];
    for (i, issue) in active.iter().enumerate() {
        for target in issue.blocking_dependencies() {
            if let Some(&j) = index_of.get(target) {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
    }

    let mut component = vec![usize::MAX; active.len()];
    for start in 0..active.len() {
        if component[start] != usize::MAX {
            continue;
        }
        let mut queue = vec![start];
        component[start] = start;
        while let Some(v) = queue.pop() {
            for &u in &adjacency[v] {
                if component[u] == usize::MAX {
                    component[u] = start;
                    queue.push(u);
                }
            }
        }
    }

    active
        .iter()
        .enumerate()
        .map(|(i, issue)| (issue.id.as_str(), component[i]))
        .collect()
}

fn build_recommendations(prepared: &Prepared) -> Vec<Recommendation> {
    let snapshot = &prepared.snapshot;
    let by_id: HashMap<&str, &Issue> = snapshot
        .issues()
        .iter()
        .map(|issue| (issue.id.as_str(), issue))
        .collect();

    // Active dependents per issue, with their priorities.
    let mut dependents: HashMap<&str, Vec<&Issue>> = HashMap::new();
    for issue in snapshot.issues() {
        if issue.status == Status::Closed {
            continue;
        }
        for target in issue.blocking_dependencies() {
            if let Some(blocker) = by_id.get(target) {
                dependents
                    .entry(blocker.id.as_str())
                    .or_default()
                    .push(issue);
            }
        }
    }

    let mut recommendations = Vec::new();
    for issue in snapshot.issues() {
        if issue.status == Status::Closed {
            continue;
        }
        let deps = dependents.get(issue.id.as_str());
        let dependent_count = deps.map(Vec::len).unwrap_or(0);

        if let Some(deps) = deps {
            // A blocker should be at least as urgent as its most
            // urgent active dependent.
            let most_urgent = deps.iter().map(|d| d.priority.clamp(0, 4)).min().unwrap();
            if issue.priority > most_urgent {
                let gap = (issue.priority - most_urgent).min(5) as f64;
                let confidence =
                    (0.3 + 0.15 * dependent_count as f64 + 0.05 * gap).clamp(0.0, 1.0);
                recommendations.push(Recommendation {
                    issue_id: issue.id.clone(),
                    current_priority: issue.priority,
                    suggested_priority: most_urgent,
                    direction: "up",
                    confidence,
                    reasoning: vec![
                        format!("blocks {dependent_count} active issue(s)"),
                        format!("most urgent dependent is priority {most_urgent}"),
                    ],
                });
                continue;
            }
        }

        if issue.priority == 0 && dependent_count == 0 {
            recommendations.push(Recommendation {
                issue_id: issue.id.clone(),
                current_priority: issue.priority,
                suggested_priority: 1,
                direction: "down",
                confidence: 0.4,
                reasoning: vec![
                    "no active issues depend on it".to_string(),
                    "priority 0 is reserved for work that unblocks others".to_string(),
                ],
            });
        }
    }

    recommendations.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.issue_id.cmp(&b.issue_id))
    });
    recommendations
}

fn build_top_picks(engine: &Engine, prepared: &Prepared, limit: usize) -> Vec<TopPick> {
    // Structural share of the default vector, with the text weight
    // redistributed across the remaining components.
    let weights = Preset::Default.weights();
    let structural_sum = weights.sum() - weights.text_relevance;
    let cache = engine.metrics_cache();

    let mut picks: Vec<TopPick> = prepared
        .snapshot
        .issues()
        .iter()
        .filter(|issue| issue.status != Status::Closed)
        .filter_map(|issue| {
            let metrics = cache.get(&issue.id)?;
            let score = (weights.pagerank * metrics.pagerank
                + weights.status * normalize_status(&metrics.status)
                + weights.impact
                    * normalize_impact(metrics.blocker_count, cache.max_blocker_count())
                + weights.priority * normalize_priority(metrics.priority)
                + weights.recency * normalize_recency(metrics.updated_at))
                / structural_sum;
            Some(TopPick {
                id: issue.id.clone(),
                score,
            })
        })
        .collect();

    picks.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    picks.truncate(limit);
    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_model::Dependency;
    use std::path::Path;

    fn issue(id: &str, priority: i64, deps: &[&str]) -> Issue {
        let mut issue = Issue::new(id, id);
        issue.priority = priority;
        issue.dependencies = deps.iter().map(|d| Dependency::blocks(id, d)).collect();
        issue
    }

    fn engine() -> Engine {
        Engine::new(Path::new("/tmp/report-tests"))
    }

    #[test]
    fn plan_lists_unblocker_first() {
        let report = engine()
            .plan_report(vec![issue("A", 1, &[]), issue("B", 2, &["A"])])
            .unwrap();

        assert!(!report["data_hash"].as_str().unwrap().is_empty());
        let item = &report["plan"]["tracks"][0]["items"][0];
        assert_eq!(item["id"], "A");
        assert_eq!(item["unblocks"][0], "B");
    }

    #[test]
    fn plan_splits_independent_components_into_tracks() {
        let report = engine()
            .plan_report(vec![
                issue("A", 1, &[]),
                issue("B", 2, &["A"]),
                issue("X", 1, &[]),
            ])
            .unwrap();
        let tracks = report["plan"]["tracks"].as_array().unwrap();
        assert_eq!(tracks.len(), 2);
        // Larger component first.
        assert_eq!(tracks[0]["items"][0]["id"], "A");
        assert_eq!(tracks[1]["items"][0]["id"], "X");
    }

    #[test]
    fn priority_recommends_raising_a_blocking_root() {
        let report = engine()
            .priority_report(vec![
                issue("P0", 5, &[]),
                issue("D1", 1, &["P0"]),
                issue("D2", 1, &["P0"]),
            ])
            .unwrap();

        let recs = report["recommendations"].as_array().unwrap();
        let p0 = recs
            .iter()
            .find(|r| r["issue_id"] == "P0")
            .expect("P0 recommendation");
        assert_eq!(p0["direction"], "up");
        assert!(p0["confidence"].as_f64().unwrap() > 0.0);
        assert_eq!(p0["suggested_priority"], 1);
        assert!(!p0["reasoning"].as_array().unwrap().is_empty());
    }

    #[test]
    fn priority_suggests_lowering_urgent_leaf() {
        let report = engine()
            .priority_report(vec![issue("solo", 0, &[])])
            .unwrap();
        let recs = report["recommendations"].as_array().unwrap();
        assert_eq!(recs[0]["issue_id"], "solo");
        assert_eq!(recs[0]["direction"], "down");
    }

    #[test]
    fn triage_produces_scored_top_picks() {
        let report = engine()
            .triage_report(vec![issue("A", 1, &[]), issue("B", 2, &["A"])], 5)
            .unwrap();

        assert!(!report["generated_at"].as_str().unwrap().is_empty());
        let picks = report["triage"]["quick_ref"]["top_picks"].as_array().unwrap();
        assert!(!picks.is_empty());
        assert!(picks[0]["score"].as_f64().unwrap() > 0.0);
        // A blocks B, so A should outrank B.
        assert_eq!(picks[0]["id"], "A");
    }

    #[test]
    fn insights_envelope_is_deterministic_apart_from_timestamp() {
        let issues = vec![issue("A", 1, &[]), issue("B", 2, &["A"])];
        let engine = engine();
        let mut first = engine.insights_report(issues.clone(), 10).unwrap();
        let mut second = engine.insights_report(issues, 10).unwrap();

        assert_eq!(first["data_hash"], second["data_hash"]);
        first.as_object_mut().unwrap().remove("generated_at");
        second.as_object_mut().unwrap().remove("generated_at");
        assert_eq!(first, second);
    }

    #[test]
    fn every_report_carries_usage_hints() {
        let issues = vec![issue("A", 1, &[])];
        let engine = engine();
        for report in [
            engine.insights_report(issues.clone(), 5).unwrap(),
            engine.plan_report(issues.clone()).unwrap(),
            engine.priority_report(issues.clone()).unwrap(),
            engine.triage_report(issues, 5).unwrap(),
        ] {
            let hints = report["usage_hints"].as_array().unwrap();
            assert!(!hints.is_empty());
            for hint in hints {
                assert!(!hint.as_str().unwrap().is_empty());
            }
        }
    }
}
