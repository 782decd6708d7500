//! Level graph derivation.
//!
//! A single BFS from the root assigns every reachable page its depth. Only raw
//! edges that increase depth by exactly one survive, which makes the result
//! acyclic and turns every root-to-node path in it into a shortest path.
//!
//! Degree and leaves-count are computed here, once per derivation, and stored
//! in tables owned by the [`LevelGraph`]. They are never touched by an
//! analysis reset; re-deriving is the only way they change.

use std::collections::VecDeque;

use tracing::debug;

use super::SiteGraph;
use crate::error::{GraphError, GraphResult};

/// Acyclic BFS-layered view of a [`SiteGraph`].
#[derive(Debug, Clone, PartialEq)]
pub struct LevelGraph {
    levels: Vec<Option<u32>>,
    children: Vec<Vec<usize>>,
    parents: Vec<Vec<usize>>,
    degree: Vec<Option<u64>>,
    leaves: Vec<Option<u32>>,
}

impl LevelGraph {
    /// Derive the level graph and its structural tables from `graph`.
    pub fn derive(graph: &SiteGraph) -> GraphResult<Self> {
        let n = graph.len();
        let root = graph.root_index();

        let mut levels = vec![None; n];
        let mut queue = VecDeque::new();
        levels[root] = Some(0);
        queue.push_back(root);

        while let Some(ix) = queue.pop_front() {
            let next = levels[ix].map_or(0, |l: u32| l + 1);
            for &child in graph.node_at(ix).children() {
                if levels[child].is_none() {
                    levels[child] = Some(next);
                    queue.push_back(child);
                }
            }
        }

        let mut children = vec![Vec::new(); n];
        let mut parents = vec![Vec::new(); n];
        for (ix, node) in graph.nodes() {
            let Some(level) = levels[ix] else {
                continue;
            };
            for &child in node.children() {
                if levels[child] == Some(level + 1) {
                    children[ix].push(child);
                    parents[child].push(ix);
                }
            }
        }

        let mut level_graph = Self {
            levels,
            children,
            parents,
            degree: vec![None; n],
            leaves: vec![None; n],
        };
        level_graph.verify(graph)?;
        level_graph.compute_structure();

        debug!(
            reachable = level_graph.reachable_count(),
            edges = level_graph.edge_count(),
            leaves = level_graph.leaves().count(),
            "Level graph derived"
        );

        Ok(level_graph)
    }

    /// Every level edge must go from depth d to depth d+1.
    fn verify(&self, graph: &SiteGraph) -> GraphResult<()> {
        for (parent, kids) in self.children.iter().enumerate() {
            for &child in kids {
                let ok = match (self.levels[parent], self.levels[child]) {
                    (Some(p), Some(c)) => c == p + 1,
                    _ => false,
                };
                if !ok {
                    return Err(GraphError::LevelInvariant {
                        node: graph.node_at(child).id(),
                        parent: graph.node_at(parent).id(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Post-order over the DAG: visiting nodes deepest level first guarantees
    /// every level-child is finished before its parents.
    fn compute_structure(&mut self) {
        let mut order: Vec<usize> = (0..self.levels.len())
            .filter(|&ix| self.levels[ix].is_some())
            .collect();
        order.sort_by_key(|&ix| std::cmp::Reverse(self.levels[ix]));

        for ix in order {
            let kids = &self.children[ix];
            if kids.is_empty() {
                self.degree[ix] = Some(1);
                self.leaves[ix] = Some(1);
            } else {
                let degree = kids
                    .iter()
                    .filter_map(|&c| self.degree[c])
                    .fold(1u64, |acc, d| acc.saturating_add(d));
                let leaves = kids
                    .iter()
                    .filter_map(|&c| self.leaves[c])
                    .fold(0u32, |acc, l| acc.saturating_add(l));
                self.degree[ix] = Some(degree);
                self.leaves[ix] = Some(leaves);
            }
        }
    }

    /// BFS depth from the root, `None` if unreachable.
    pub fn level(&self, ix: usize) -> Option<u32> {
        self.levels.get(ix).copied().flatten()
    }

    /// True if the page was reached from the root.
    pub fn is_reachable(&self, ix: usize) -> bool {
        self.level(ix).is_some()
    }

    /// Level-graph children.
    pub fn children(&self, ix: usize) -> &[usize] {
        self.children.get(ix).map_or(&[], Vec::as_slice)
    }

    /// Level-graph parents.
    pub fn parents(&self, ix: usize) -> &[usize] {
        self.parents.get(ix).map_or(&[], Vec::as_slice)
    }

    /// True for a reachable page without level-children.
    pub fn is_leaf(&self, ix: usize) -> bool {
        self.is_reachable(ix) && self.children(ix).is_empty()
    }

    /// Successor count including the page itself; `None` if unreachable.
    pub fn degree(&self, ix: usize) -> Option<u64> {
        self.degree.get(ix).copied().flatten()
    }

    /// Level leaves beneath the page (1 for a leaf); `None` if unreachable.
    pub fn leaves_count(&self, ix: usize) -> Option<u32> {
        self.leaves.get(ix).copied().flatten()
    }

    /// All reachable leaves in arena order.
    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.levels.len()).filter(|&ix| self.is_leaf(ix))
    }

    /// Number of pages reached from the root.
    pub fn reachable_count(&self) -> usize {
        self.levels.iter().filter(|l| l.is_some()).count()
    }

    /// Number of level edges.
    pub fn edge_count(&self) -> usize {
        self.children.iter().map(Vec::len).sum()
    }

    /// Detection window size: twice the average leaf depth, using integer
    /// division for the average.
    pub fn nodes_to_inspect(&self) -> usize {
        let (sum, count) = self
            .leaves()
            .filter_map(|ix| self.level(ix))
            .fold((0usize, 0usize), |(sum, count), level| {
                (sum + level as usize, count + 1)
            });
        if count == 0 {
            return 0;
        }
        sum / count * 2
    }
}
