//! FindPivots: bounded multi-source relaxation over the probability graph.
//!
//! Starting from observed symptom nodes, edges are relaxed for up to `depth`
//! rounds, treating edge weight as distance. Nodes reached under `bound` form
//! the working set that scopes question selection. A seed whose tight-edge
//! subtree holds at least `depth` nodes is a pivot.

use crate::graph::{NodeId, ProbabilityGraph};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotResult {
    pub pivots: Vec<NodeId>,
    /// Reached nodes in insertion order; always starts with the seeds
    pub working_set: Vec<NodeId>,
    /// Expansion exceeded `depth * |seeds|` and was cut short
    pub truncated: bool,
}

impl PivotResult {
    pub fn ids(nodes: &[NodeId], graph: &ProbabilityGraph) -> Vec<String> {
        nodes.iter().map(|&n| graph.node(n).id().to_string()).collect()
    }
}

pub fn find_pivots(graph: &ProbabilityGraph, seeds: &[NodeId], bound: f64, depth: usize) -> PivotResult {
    let n = graph.len();

    let mut unique_seeds: Vec<NodeId> = Vec::with_capacity(seeds.len());
    for &seed in seeds {
        if seed.0 < n && !unique_seeds.contains(&seed) {
            unique_seeds.push(seed);
        }
    }
    if unique_seeds.is_empty() {
        return PivotResult::default();
    }

    let mut bd = vec![f64::INFINITY; n];
    let mut in_working = vec![false; n];
    let mut working_set = Vec::new();
    let mut in_frontier = vec![false; n];
    for &seed in &unique_seeds {
        bd[seed.0] = 0.0;
        in_working[seed.0] = true;
        in_frontier[seed.0] = true;
        working_set.push(seed);
    }

    for round in 1..=depth {
        let mut next = vec![false; n];
        let mut advanced = false;

        for edge in graph.edges() {
            if !in_frontier[edge.from.0] {
                continue;
            }
            let candidate = bd[edge.from.0] + edge.weight;
            if candidate <= bd[edge.to.0] {
                bd[edge.to.0] = candidate;
                if candidate < bound {
                    next[edge.to.0] = true;
                    advanced = true;
                    if !in_working[edge.to.0] {
                        in_working[edge.to.0] = true;
                        working_set.push(edge.to);
                    }
                }
            }
        }

        if !advanced {
            debug!(round, "relaxation settled");
            break;
        }
        in_frontier = next;

        if working_set.len() > depth * unique_seeds.len() {
            debug!(
                round,
                working = working_set.len(),
                seeds = unique_seeds.len(),
                "expansion too large, seeds become pivots"
            );
            return PivotResult {
                pivots: unique_seeds,
                working_set,
                truncated: true,
            };
        }
    }

    // Forest of tight edges inside the working set
    let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); n];
    for edge in graph.edges() {
        if in_working[edge.from.0]
            && in_working[edge.to.0]
            && bd[edge.to.0] == bd[edge.from.0] + edge.weight
        {
            children[edge.from.0].push(edge.to);
        }
    }

    let mut visited = vec![false; n];
    let mut pivots = Vec::new();
    for &root in &unique_seeds {
        let mut count = 0;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if visited[node.0] {
                continue;
            }
            visited[node.0] = true;
            count += 1;
            stack.extend(children[node.0].iter().copied());
        }
        if count >= depth {
            pivots.push(root);
        }
    }

    debug!(pivots = pivots.len(), working = working_set.len(), "pivots found");
    PivotResult {
        pivots,
        working_set,
        truncated: false,
    }
}
