//! Critical-path length and slack on the cycle-condensed DAG.
//!
//! Strongly connected components collapse to single condensation
//! nodes, the longest path is computed over Kahn's topological order,
//! and every member of an SCC inherits its component's values. Nodes
//! on the longest path have zero slack.

use crate::types::CompactGraph;
use std::collections::HashSet;

pub struct CriticalPath {
    /// Longest-path position per compact node (in nodes, >= 1).
    pub score: Vec<f64>,
    /// Delay tolerance relative to the critical path.
    pub slack: Vec<f64>,
    /// Length of the critical path in condensation nodes.
    pub length: usize,
}

/// Compute critical path and slack. `sccs` must cover every node of
/// `graph` exactly once.
pub fn critical_path(graph: &CompactGraph, sccs: &[Vec<usize>]) -> CriticalPath {
    let n = graph.n;
    if n == 0 {
        return CriticalPath {
            score: Vec::new(),
            slack: Vec::new(),
            length: 0,
        };
    }

    // Map node -> condensation component.
    let mut component = vec![0usize; n];
    for (c, members) in sccs.iter().enumerate() {
        for &v in members {
            component[v] = c;
        }
    }
    let c_count = sccs.len();

    // Condensation edges, deduplicated.
    let mut c_out = vec![Vec::new(); c_count];
    let mut c_in_degree = vec![0usize; c_count];
    let mut seen = HashSet::new();
    for u in 0..n {
        for &v in &graph.out[u] {
            let (cu, cv) = (component[u], component[v]);
            if cu != cv && seen.insert((cu, cv)) {
                c_out[cu].push(cv);
                c_in_degree[cv] += 1;
            }
        }
    }
    for list in c_out.iter_mut() {
        list.sort_unstable();
    }

    // Kahn topological order over the condensation.
    let mut order = Vec::with_capacity(c_count);
    let mut queue: Vec<usize> = (0..c_count).filter(|&c| c_in_degree[c] == 0).collect();
    queue.sort_unstable();
    let mut head = 0;
    let mut in_degree = c_in_degree.clone();
    while head < queue.len() {
        let c = queue[head];
        head += 1;
        order.push(c);
        for &d in &c_out[c] {
            in_degree[d] -= 1;
            if in_degree[d] == 0 {
                queue.push(d);
            }
        }
    }

    // Forward pass: longest distance (in nodes) from any root.
    let mut dist_from_start = vec![1usize; c_count];
    for &c in &order {
        for &d in &c_out[c] {
            dist_from_start[d] = dist_from_start[d].max(dist_from_start[c] + 1);
        }
    }
    // Backward pass: longest distance to any sink.
    let mut dist_to_end = vec![1usize; c_count];
    for &c in order.iter().rev() {
        for &d in &c_out[c] {
            dist_to_end[c] = dist_to_end[c].max(dist_to_end[d] + 1);
        }
    }

    let length = (0..c_count)
        .map(|c| dist_from_start[c] + dist_to_end[c] - 1)
        .max()
        .unwrap_or(0);

    let mut score = vec![0.0; n];
    let mut slack = vec![0.0; n];
    for v in 0..n {
        let c = component[v];
        let through = dist_from_start[c] + dist_to_end[c] - 1;
        score[v] = dist_from_start[c] as f64;
        slack[v] = (length - through) as f64;
    }

    CriticalPath {
        score,
        slack,
        length,
    }
}
