//! Centrality measures over the compact graph. All functions return
//! vectors indexed by compact node id and iterate nodes in index
//! order, so output is deterministic for a given snapshot.

use crate::types::CompactGraph;
use std::collections::VecDeque;

const PAGERANK_DAMPING: f64 = 0.85;
const PAGERANK_MAX_ITER: usize = 100;
const PAGERANK_TOLERANCE: f64 = 1e-8;

const EIGENVECTOR_MAX_ITER: usize = 500;
const EIGENVECTOR_TOLERANCE: f64 = 1e-9;

const HITS_MAX_ITER: usize = 100;
const HITS_TOLERANCE: f64 = 1e-9;

/// PageRank with uniform sink redistribution.
pub fn pagerank(graph: &CompactGraph) -> Vec<f64> {
    let n = graph.n;
    if n == 0 {
        return Vec::new();
    }
    let inv_n = 1.0 / n as f64;
    let mut rank = vec![inv_n; n];
    let mut next = vec![0.0; n];

    let sinks: Vec<usize> = (0..n).filter(|&v| graph.out[v].is_empty()).collect();

    for _ in 0..PAGERANK_MAX_ITER {
        let sink_mass: f64 = sinks.iter().map(|&v| rank[v]).sum();
        let base = (1.0 - PAGERANK_DAMPING) * inv_n + PAGERANK_DAMPING * sink_mass * inv_n;
        for slot in next.iter_mut() {
            *slot = base;
        }
        for u in 0..n {
            let out_deg = graph.out[u].len();
            if out_deg == 0 {
                continue;
            }
            let share = PAGERANK_DAMPING * rank[u] / out_deg as f64;
            for &v in &graph.out[u] {
                next[v] += share;
            }
        }

        let max_delta = rank
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        std::mem::swap(&mut rank, &mut next);
        if max_delta < PAGERANK_TOLERANCE {
            break;
        }
    }
    rank
}

/// Brandes' betweenness on the unweighted digraph, normalised by
/// (n-1)(n-2). Zero for graphs with fewer than three nodes.
pub fn betweenness(graph: &CompactGraph) -> Vec<f64> {
    let n = graph.n;
    let mut centrality = vec![0.0; n];
    if n < 3 {
        return centrality;
    }

    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0_f64; n];
    let mut dist = vec![-1_i64; n];
    let mut delta = vec![0.0_f64; n];

    for source in 0..n {
        stack.clear();
        for v in 0..n {
            preds[v].clear();
            sigma[v] = 0.0;
            dist[v] = -1;
            delta[v] = 0.0;
        }
        sigma[source] = 1.0;
        dist[source] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            stack.push(u);
            for &v in &graph.out[u] {
                if dist[v] < 0 {
                    dist[v] = dist[u] + 1;
                    queue.push_back(v);
                }
                if dist[v] == dist[u] + 1 {
                    sigma[v] += sigma[u];
                    preds[v].push(u);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &u in &preds[w] {
                delta[u] += sigma[u] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                centrality[w] += delta[w];
            }
        }
    }

    let norm = ((n - 1) * (n - 2)) as f64;
    for value in centrality.iter_mut() {
        *value /= norm;
    }
    centrality
}

/// Eigenvector centrality by power iteration over incoming edges,
/// L2-normalised each round.
pub fn eigenvector(graph: &CompactGraph) -> Vec<f64> {
    let n = graph.n;
    if n == 0 {
        return Vec::new();
    }
    let mut x = vec![1.0 / (n as f64).sqrt(); n];
    let mut next = vec![0.0; n];

    for _ in 0..EIGENVECTOR_MAX_ITER {
        for v in 0..n {
            next[v] = graph.inn[v].iter().map(|&u| x[u]).sum();
        }
        let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            // No incoming mass anywhere (edge-free graph).
            return vec![0.0; n];
        }
        for value in next.iter_mut() {
            *value /= norm;
        }
        let delta = x
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        std::mem::swap(&mut x, &mut next);
        if delta < EIGENVECTOR_TOLERANCE {
            break;
        }
    }
    x
}

/// HITS hub and authority scores, alternating updates with L2
/// normalisation.
pub fn hits(graph: &CompactGraph) -> (Vec<f64>, Vec<f64>) {
    let n = graph.n;
    if n == 0 {
        return (Vec::new(), Vec::new());
    }
    let mut hubs = vec![1.0; n];
    let mut auth = vec![1.0; n];

    for _ in 0..HITS_MAX_ITER {
        let mut new_auth = vec![0.0; n];
        for v in 0..n {
            new_auth[v] = graph.inn[v].iter().map(|&u| hubs[u]).sum();
        }
        normalize_l2(&mut new_auth);

        let mut new_hubs = vec![0.0; n];
        for u in 0..n {
            new_hubs[u] = graph.out[u].iter().map(|&v| new_auth[v]).sum();
        }
        normalize_l2(&mut new_hubs);

        let delta = hubs
            .iter()
            .zip(new_hubs.iter())
            .chain(auth.iter().zip(new_auth.iter()))
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        hubs = new_hubs;
        auth = new_auth;
        if delta < HITS_TOLERANCE {
            break;
        }
    }
    (hubs, auth)
}

fn normalize_l2(values: &mut [f64]) {
    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in values.iter_mut() {
            *value /= norm;
        }
    }
}
