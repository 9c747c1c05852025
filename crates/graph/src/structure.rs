//! Undirected-projection metrics (k-core, articulation points) and
//! cycle enumeration on the directed graph.

use crate::types::CompactGraph;
use std::collections::HashSet;

/// Matula–Beck core decomposition on the undirected projection,
/// bucket-sorted peeling in O(V + E).
pub fn core_numbers(undirected: &[Vec<usize>]) -> Vec<usize> {
    let n = undirected.len();
    if n == 0 {
        return Vec::new();
    }
    let mut degree: Vec<usize> = undirected.iter().map(Vec::len).collect();
    let max_degree = degree.iter().copied().max().unwrap_or(0);

    let mut bin = vec![0usize; max_degree + 1];
    for &d in &degree {
        bin[d] += 1;
    }
    let mut start = 0usize;
    for slot in bin.iter_mut() {
        let count = *slot;
        *slot = start;
        start += count;
    }

    let mut pos = vec![0usize; n];
    let mut vert = vec![0usize; n];
    for v in 0..n {
        pos[v] = bin[degree[v]];
        vert[pos[v]] = v;
        bin[degree[v]] += 1;
    }
    for d in (1..=max_degree).rev() {
        bin[d] = bin[d - 1];
    }
    bin[0] = 0;

    let mut core = vec![0usize; n];
    let mut processed = vec![false; n];
    for i in 0..n {
        let v = vert[i];
        core[v] = degree[v];
        processed[v] = true;
        for &u in &undirected[v] {
            if processed[u] || degree[u] <= degree[v] {
                continue;
            }
            // Move u down one bucket: swap with the first vertex of
            // its current bucket, then shrink the bucket.
            let du = degree[u];
            let pu = pos[u];
            let pw = bin[du];
            let w = vert[pw];
            if u != w {
                pos[u] = pw;
                vert[pw] = u;
                pos[w] = pu;
                vert[pu] = w;
            }
            bin[du] += 1;
            degree[u] -= 1;
        }
    }
    core
}

/// Articulation points on the undirected projection via iterative DFS
/// low-link. Parent tracking uses `Option`, so vertex 0 needs no
/// sentinel.
pub fn articulation_points(undirected: &[Vec<usize>]) -> Vec<bool> {
    let n = undirected.len();
    let mut is_cut = vec![false; n];
    let mut disc = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut timer = 0usize;

    for root in 0..n {
        if disc[root] != usize::MAX {
            continue;
        }
        // Stack frames: (vertex, parent, next neighbour offset).
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
        let mut root_children = 0usize;
        disc[root] = timer;
        low[root] = timer;
        timer += 1;

        while let Some(&(v, parent, next)) = stack.last() {
            if next < undirected[v].len() {
                let u = undirected[v][next];
                stack.last_mut().expect("non-empty stack").2 += 1;
                if disc[u] == usize::MAX {
                    disc[u] = timer;
                    low[u] = timer;
                    timer += 1;
                    if v == root {
                        root_children += 1;
                    }
                    stack.push((u, Some(v), 0));
                } else if Some(u) != parent {
                    low[v] = low[v].min(disc[u]);
                }
            } else {
                stack.pop();
                if let Some(&(p, _, _)) = stack.last() {
                    low[p] = low[p].min(low[v]);
                    if p != root && low[v] >= disc[p] {
                        is_cut[p] = true;
                    }
                }
            }
        }
        is_cut[root] = root_children > 1;
    }
    is_cut
}

/// Johnson-style cycle enumeration restricted to non-trivial strongly
/// connected components.
///
/// Each cycle is emitted rotated to start at its smallest compact
/// index (enumeration only ever visits vertices >= the start vertex),
/// so callers can sort representatives lexicographically by ID.
/// Enumeration stops once `limit` cycles are collected.
pub fn simple_cycles(graph: &CompactGraph, sccs: &[Vec<usize>], limit: usize) -> Vec<Vec<usize>> {
    let mut cycles = Vec::new();
    if limit == 0 {
        return cycles;
    }

    for scc in sccs {
        if scc.len() < 2 {
            continue;
        }
        let members: Vec<usize> = {
            let mut m = scc.clone();
            m.sort_unstable();
            m
        };
        let in_scc: HashSet<usize> = members.iter().copied().collect();

        for &start in &members {
            if cycles.len() >= limit {
                return cycles;
            }
            let mut blocked = HashSet::new();
            let mut path = vec![start];
            dfs_cycles(
                graph, &in_scc, start, start, &mut path, &mut blocked, &mut cycles, limit,
            );
        }
    }
    cycles
}

#[allow(clippy::too_many_arguments)]
fn dfs_cycles(
    graph: &CompactGraph,
    in_scc: &HashSet<usize>,
    start: usize,
    v: usize,
    path: &mut Vec<usize>,
    blocked: &mut HashSet<usize>,
    cycles: &mut Vec<Vec<usize>>,
    limit: usize,
) -> bool {
    let mut found = false;
    blocked.insert(v);
    for &w in &graph.out[v] {
        if cycles.len() >= limit {
            break;
        }
        // Restricting to vertices >= start de-duplicates rotations.
        if w < start || !in_scc.contains(&w) {
            continue;
        }
        if w == start {
            cycles.push(path.clone());
            found = true;
        } else if !blocked.contains(&w) {
            path.push(w);
            if dfs_cycles(graph, in_scc, start, w, path, blocked, cycles, limit) {
                found = true;
            }
            path.pop();
        }
    }
    if found {
        blocked.remove(&v);
    }
    found
}
