//! Strongly-connected component computation.
//!
//! Code generation consumes the grouping as an opaque function of a
//! dependency graph: nodes are indices, `edges[n]` lists the nodes `n`
//! depends on.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// Computes the strongly-connected components of a graph with Tarjan's
/// algorithm.
///
/// Components are returned dependencies-first: every component appears
/// after all components reachable from it. Node indices inside a component
/// are sorted ascending. Out-of-range edge targets are ignored.
#[must_use]
pub fn strongly_connected_components(edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(edges.len(), 0);
    let nodes: Vec<NodeIndex> = (0..edges.len()).map(|n| graph.add_node(n)).collect();
    for (from, targets) in edges.iter().enumerate() {
        for &to in targets {
            if let Some(&target) = nodes.get(to) {
                graph.update_edge(nodes[from], target, ());
            }
        }
    }

    tarjan_scc(&graph)
        .into_iter()
        .map(|component| {
            let mut members: Vec<usize> = component.into_iter().map(|node| graph[node]).collect();
            members.sort_unstable();
            members
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acyclic_graph_dependencies_first() {
        // 0 -> 1 -> 2
        let edges = vec![vec![1], vec![2], vec![]];
        let sccs = strongly_connected_components(&edges);
        assert_eq!(sccs, vec![vec![2], vec![1], vec![0]]);
    }

    #[test]
    fn test_cycle_grouped() {
        // 0 -> 1 -> 2 -> 1, 3 isolated
        let edges = vec![vec![1], vec![2], vec![1], vec![]];
        let sccs = strongly_connected_components(&edges);
        assert_eq!(sccs, vec![vec![1, 2], vec![0], vec![3]]);
    }

    #[test]
    fn test_self_loop_and_bad_target() {
        let edges = vec![vec![0, 7]];
        assert_eq!(strongly_connected_components(&edges), vec![vec![0]]);
    }

    #[test]
    fn test_long_chain_does_not_exhaust_stack() {
        let n = 200_000;
        let edges: Vec<Vec<usize>> = (0..n)
            .map(|i| if i + 1 < n { vec![i + 1] } else { Vec::new() })
            .collect();
        let sccs = strongly_connected_components(&edges);
        assert_eq!(sccs.len(), n);
        assert_eq!(sccs[0], vec![n - 1]);
        assert_eq!(sccs[n - 1], vec![0]);
    }

    #[test]
    fn test_long_cycle_is_one_component() {
        let n = 100_000;
        let edges: Vec<Vec<usize>> = (0..n).map(|i| vec![(i + 1) % n]).collect();
        let sccs = strongly_connected_components(&edges);
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), n);
        assert_eq!(sccs[0][0], 0);
        assert_eq!(sccs[0][n - 1], n - 1);
    }
}
