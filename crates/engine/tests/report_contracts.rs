//! Contract tests for the machine report envelopes: every report
//! carries `data_hash` and `usage_hints`, bodies are deterministic,
//! and the documented scenarios hold end to end.

use beads_engine::{Engine, SearchMode};
use beads_model::{Dependency, Issue};
use tempfile::TempDir;

fn issue(id: &str, title: &str, priority: i64, deps: &[&str]) -> Issue {
    let mut issue = Issue::new(id, title);
    issue.priority = priority;
    issue.dependencies = deps.iter().map(|d| Dependency::blocks(id, d)).collect();
    issue
}

fn chain_snapshot() -> Vec<Issue> {
    vec![
        issue("A", "Root", 1, &[]),
        issue("B", "Mid", 2, &["A"]),
        issue("C", "Leaf", 3, &["B"]),
    ]
}

#[test]
fn insights_contract_and_determinism() {
    let tmp = TempDir::new().unwrap();
    let engine = Engine::new(tmp.path());

    let first = engine.insights_report(chain_snapshot(), 10).unwrap();
    assert!(!first["data_hash"].as_str().unwrap().is_empty());
    assert!(first["analysis_config"].is_object());
    let status = first["status"].as_object().unwrap();
    assert!(!status.is_empty());
    assert!(first["full_stats"]["pagerank"].is_object());

    let second = engine.insights_report(chain_snapshot(), 10).unwrap();
    assert_eq!(first["data_hash"], second["data_hash"]);
}

#[test]
fn plan_contract_unblocker_first() {
    let tmp = TempDir::new().unwrap();
    let engine = Engine::new(tmp.path());

    let report = engine
        .plan_report(vec![
            issue("A", "Unblocker", 1, &[]),
            issue("B", "Blocked", 2, &["A"]),
        ])
        .unwrap();

    assert!(!report["data_hash"].as_str().unwrap().is_empty());
    let item = &report["plan"]["tracks"][0]["items"][0];
    assert_eq!(item["id"], "A");
    assert_eq!(item["unblocks"].as_array().unwrap()[0], "B");
}

#[test]
fn priority_contract_flags_misprioritised_root() {
    let tmp = TempDir::new().unwrap();
    let engine = Engine::new(tmp.path());

    let report = engine
        .priority_report(vec![
            issue("P0", "Low but critical", 5, &[]),
            issue("D1", "Dep1", 1, &["P0"]),
            issue("D2", "Dep2", 1, &["P0"]),
        ])
        .unwrap();

    assert!(!report["data_hash"].as_str().unwrap().is_empty());
    let recs = report["recommendations"].as_array().unwrap();
    let p0 = recs
        .iter()
        .find(|r| r["issue_id"] == "P0" && r["confidence"].as_f64().unwrap() > 0.0)
        .expect("expected recommendation for P0");
    assert_eq!(p0["direction"], "up");
}

#[test]
fn triage_contract_quick_ref() {
    let tmp = TempDir::new().unwrap();
    let engine = Engine::new(tmp.path());

    let report = engine
        .triage_report(
            vec![
                issue("A", "Blocker", 1, &[]),
                issue("B", "Blocked", 2, &["A"]),
            ],
            5,
        )
        .unwrap();

    assert!(!report["data_hash"].as_str().unwrap().is_empty());
    assert!(!report["generated_at"].as_str().unwrap().is_empty());
    assert!(!report["triage"]["quick_ref"]["top_picks"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[test]
fn all_reports_carry_nonempty_usage_hints() {
    let tmp = TempDir::new().unwrap();
    let engine = Engine::new(tmp.path());
    let issues = vec![issue("A", "Test", 1, &[])];

    for report in [
        engine.insights_report(issues.clone(), 5).unwrap(),
        engine.plan_report(issues.clone()).unwrap(),
        engine.priority_report(issues.clone()).unwrap(),
        engine.triage_report(issues, 5).unwrap(),
    ] {
        let hints = report["usage_hints"].as_array().unwrap();
        assert!(!hints.is_empty());
        for hint in hints {
            let text = hint.as_str().unwrap();
            assert!(!text.is_empty());
        }
    }
}

/// Twenty issues, five of which mention "benchmarks". One of the
/// matches anchors a pile of dependents, so hybrid ranking with the
/// impact-first preset must reorder the text-only ranking and put the
/// high-impact match on top.
fn benchmark_snapshot() -> Vec<Issue> {
    let mut issues = Vec::new();
    for i in 1..=5 {
        issues.push(issue(
            &format!("B{i:02}"),
            &format!("Performance benchmarks pass {i}"),
            2,
            &[],
        ));
    }
    for i in 1..=6 {
        issues.push(issue(&format!("D{i:02}"), "Dependent work", 2, &["B05"]));
    }
    for i in 7..=8 {
        issues.push(issue(&format!("D{i:02}"), "Dependent work", 2, &["B04"]));
    }
    for i in 1..=7 {
        issues.push(issue(&format!("F{i:02}"), "Unrelated filler", 3, &[]));
    }
    assert_eq!(issues.len(), 20);
    issues
}

#[tokio::test]
async fn short_query_hybrid_reranks_text_results() {
    let tmp = TempDir::new().unwrap();
    let engine = Engine::new(tmp.path());

    let text = engine
        .search_report(
            benchmark_snapshot(),
            "benchmarks",
            SearchMode::Text,
            "impact-first",
            5,
        )
        .await
        .unwrap();
    let hybrid = engine
        .search_report(
            benchmark_snapshot(),
            "benchmarks",
            SearchMode::Hybrid,
            "impact-first",
            5,
        )
        .await
        .unwrap();

    assert_eq!(text["mode"], "text");
    assert_eq!(hybrid["mode"], "hybrid");
    assert_eq!(text["data_hash"], hybrid["data_hash"]);

    let text_ids: Vec<&str> = text["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["issue_id"].as_str().unwrap())
        .collect();
    let hybrid_ids: Vec<&str> = hybrid["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["issue_id"].as_str().unwrap())
        .collect();

    assert_eq!(text_ids.len(), 5);
    assert_ne!(text_ids, hybrid_ids, "hybrid should reorder the text ranking");

    // The hybrid winner is the match with the most dependents, and its
    // impact component dominates the other lexical matches.
    assert_eq!(hybrid_ids[0], "B05");
    let results = hybrid["results"].as_array().unwrap();
    let top_impact = results[0]["component_scores"]["impact"].as_f64().unwrap();
    for result in results.iter().skip(1) {
        let impact = result["component_scores"]["impact"].as_f64().unwrap();
        assert!(top_impact >= impact);
    }
}

#[tokio::test]
async fn hybrid_results_include_component_scores() {
    let tmp = TempDir::new().unwrap();
    let engine = Engine::new(tmp.path());

    let report = engine
        .search_report(chain_snapshot(), "Root", SearchMode::Hybrid, "default", 5)
        .await
        .unwrap();

    let results = report["results"].as_array().unwrap();
    assert!(!results.is_empty());
    let components = results[0]["component_scores"].as_object().unwrap();
    for key in ["text", "pagerank", "status", "impact", "priority", "recency"] {
        assert!(components.contains_key(key), "missing component {key}");
    }
}

#[tokio::test]
async fn unknown_preset_fails_without_partial_envelope() {
    let tmp = TempDir::new().unwrap();
    let engine = Engine::new(tmp.path());

    let err = engine
        .search_report(chain_snapshot(), "Root", SearchMode::Hybrid, "turbo", 5)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("turbo"));
}

#[tokio::test]
async fn semantic_search_builds_and_persists_the_index() {
    let tmp = TempDir::new().unwrap();
    let engine = Engine::new(tmp.path());

    let issues = vec![
        issue("G1", "Graph rendering benchmarks", 1, &[]),
        issue("G2", "Graph rendering speedups", 2, &[]),
        issue("U1", "Unrelated database migration", 2, &[]),
    ];

    let report = engine
        .search_report(
            issues,
            "graph rendering benchmarks",
            SearchMode::Semantic,
            "default",
            2,
        )
        .await
        .unwrap();

    assert_eq!(report["mode"], "semantic");
    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["issue_id"], "G1");

    let index_path = tmp.path().join(".beads").join("index").join("hash-384.bin");
    assert!(index_path.exists(), "semantic index not persisted");
}
