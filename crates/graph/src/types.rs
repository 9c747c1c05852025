use crate::error::{GraphError, Result};
use beads_model::{DepKind, Snapshot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Directed dependency graph over the issues of one snapshot.
///
/// An edge `u -> v` means issue `u` declares a `blocks` dependency on
/// `v`; informational dependency kinds never produce edges. Node order
/// is fixed by ascending issue ID so every derived metric iterates the
/// same way on every run.
#[derive(Debug)]
pub struct DependencyGraph {
    pub graph: DiGraph<String, DepKind>,
    /// Issue ID -> node index for O(1) lookup.
    pub id_index: HashMap<String, NodeIndex>,
    /// Issue IDs in ascending order; `ids[i]` is the label of the
    /// compact node `i`.
    pub ids: Vec<String>,
    /// Dependency edges whose target was not in the snapshot.
    pub dropped_edges: usize,
}

/// Adjacency view with nodes renumbered `0..n` in ID order. All
/// analysis algorithms run against this form.
pub struct CompactGraph {
    pub n: usize,
    /// `out[u]` = sorted targets v of edges u -> v.
    pub out: Vec<Vec<usize>>,
    /// `inn[v]` = sorted sources u of edges u -> v.
    pub inn: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Build the analytic graph from a snapshot.
    ///
    /// Self-loops are rejected; edges to unknown issue IDs are dropped
    /// and counted.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let mut ids: Vec<String> = snapshot.issues().iter().map(|i| i.id.clone()).collect();
        ids.sort();

        let mut graph = DiGraph::with_capacity(ids.len(), ids.len());
        let mut id_index = HashMap::with_capacity(ids.len());
        for id in &ids {
            let idx = graph.add_node(id.clone());
            id_index.insert(id.clone(), idx);
        }

        let mut dropped_edges = 0usize;
        for issue in snapshot.issues() {
            let from = id_index[&issue.id];
            for target in issue.blocking_dependencies() {
                if target == issue.id {
                    return Err(GraphError::SelfLoop(issue.id.clone()));
                }
                match id_index.get(target) {
                    Some(&to) => {
                        graph.add_edge(from, to, DepKind::Blocks);
                    }
                    None => dropped_edges += 1,
                }
            }
        }

        if dropped_edges > 0 {
            log::debug!("Dropped {dropped_edges} dependency edges with unknown targets");
        }

        Ok(Self {
            graph,
            id_index,
            ids,
            dropped_edges,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edge density of the directed graph; 0 for fewer than two nodes.
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        self.edge_count() as f64 / (n as f64 * (n as f64 - 1.0))
    }

    /// Renumber to the compact `0..n` form used by the algorithms.
    pub fn compact(&self) -> CompactGraph {
        let n = self.ids.len();
        let mut out = vec![Vec::new(); n];
        let mut inn = vec![Vec::new(); n];

        let position: HashMap<&str, usize> = self
            .ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        for edge in self.graph.edge_indices() {
            let (a, b) = self.graph.edge_endpoints(edge).expect("edge endpoints");
            let u = position[self.graph[a].as_str()];
            let v = position[self.graph[b].as_str()];
            out[u].push(v);
            inn[v].push(u);
        }
        for list in out.iter_mut().chain(inn.iter_mut()) {
            list.sort_unstable();
            list.dedup();
        }

        CompactGraph { n, out, inn }
    }
}

impl CompactGraph {
    /// Undirected neighbour lists (deduplicated union of in and out).
    pub fn undirected(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.n];
        for (u, list) in self.out.iter().enumerate() {
            for &v in list {
                adj[u].push(v);
                adj[v].push(u);
            }
        }
        for list in adj.iter_mut() {
            list.sort_unstable();
            list.dedup();
        }
        adj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_model::{Dependency, Issue};

    fn snapshot(issues: Vec<Issue>) -> Snapshot {
        Snapshot::new(issues).unwrap()
    }

    #[test]
    fn builds_edges_only_for_blocking_deps() {
        let mut b = Issue::new("B", "Beta");
        b.dependencies = vec![
            Dependency::blocks("B", "A"),
            Dependency {
                issue_id: "B".to_string(),
                depends_on_id: "A".to_string(),
                kind: beads_model::DepKind::Related,
            },
        ];
        let graph =
            DependencyGraph::from_snapshot(&snapshot(vec![Issue::new("A", "Alpha"), b])).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn self_loop_rejected() {
        let mut a = Issue::new("A", "Alpha");
        a.dependencies = vec![Dependency::blocks("A", "A")];
        let err = DependencyGraph::from_snapshot(&snapshot(vec![a])).unwrap_err();
        assert!(matches!(err, GraphError::SelfLoop(id) if id == "A"));
    }

    #[test]
    fn unknown_targets_dropped_and_counted() {
        let mut a = Issue::new("A", "Alpha");
        a.dependencies = vec![Dependency::blocks("A", "GHOST")];
        let graph = DependencyGraph::from_snapshot(&snapshot(vec![a])).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.dropped_edges, 1);
    }

    #[test]
    fn compact_orders_nodes_by_id() {
        let mut z = Issue::new("z", "last");
        z.dependencies = vec![Dependency::blocks("z", "a")];
        let graph =
            DependencyGraph::from_snapshot(&snapshot(vec![z, Issue::new("a", "first")])).unwrap();
        assert_eq!(graph.ids, vec!["a".to_string(), "z".to_string()]);

        let compact = graph.compact();
        // z (index 1) depends on a (index 0)
        assert_eq!(compact.out[1], vec![0]);
        assert_eq!(compact.inn[0], vec![1]);
    }
}
