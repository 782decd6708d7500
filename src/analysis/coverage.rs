//! Hot list: greedy recommendation of future task targets.
//!
//! Simulated visits start from the recorded optimal-path visits and are kept
//! in a separate table, so a recommendation run never alters the state of
//! the pass it reads from.

use std::cmp::{Ordering, Reverse};
use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use super::optimal::shortest_path_nodes;
use super::state::{ratio, AnalysisState};
use crate::graph::{LevelGraph, NodeId, SiteGraph};

/// One hot-list row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotListEntry {
    /// Proposed target page
    pub node: NodeId,
    /// Page label
    pub label: String,
    /// Simulated graph coverage after adding this and all earlier picks
    pub coverage_gain: f64,
}

/// Greedy coverage simulation over the level graph.
#[derive(Debug, Clone)]
pub struct CoverageRecommender<'a> {
    graph: &'a SiteGraph,
    level: &'a LevelGraph,
    state: &'a AnalysisState,
    targets: BTreeSet<usize>,
}

impl<'a> CoverageRecommender<'a> {
    /// Create a recommender. `targets` are pages already targeted by tasks.
    pub fn new(
        graph: &'a SiteGraph,
        level: &'a LevelGraph,
        state: &'a AnalysisState,
        targets: BTreeSet<usize>,
    ) -> Self {
        Self {
            graph,
            level,
            state,
            targets,
        }
    }

    /// Propose every level leaf that is not yet a target exactly once.
    ///
    /// Each pick descends from the root, always into the level-child with
    /// the lowest simulated coverage (ties go to the child with more leaves,
    /// then to the earlier child) among children that still hold an
    /// unproposed leaf.
    pub fn recommend(&self) -> Vec<HotListEntry> {
        let root = self.graph.root_index();
        let mut simulated: Vec<u64> = (0..self.state.len())
            .map(|ix| self.state.node(ix).visits_on_optimal_paths)
            .collect();
        let mut candidates: BTreeSet<usize> = self
            .level
            .leaves()
            .filter(|ix| !self.targets.contains(ix))
            .collect();
        let order = self.deepest_first();

        let mut hot_list = Vec::with_capacity(candidates.len());
        while !candidates.is_empty() {
            let pending = self.pending_below(&order, &candidates);
            let Some(pick) = self.descend(root, &simulated, &pending) else {
                break;
            };
            candidates.remove(&pick);

            for ix in shortest_path_nodes(self.graph, self.level, root, pick) {
                simulated[ix] += 1;
            }

            let node = self.graph.node_at(pick);
            hot_list.push(HotListEntry {
                node: node.id(),
                label: node.label().to_string(),
                coverage_gain: ratio(simulated[root], self.level.leaves_count(root)),
            });
        }

        debug!(proposals = hot_list.len(), "Hot list computed");
        hot_list
    }

    fn descend(&self, root: usize, simulated: &[u64], pending: &[u32]) -> Option<usize> {
        if pending[root] == 0 {
            return None;
        }

        let mut node = root;
        loop {
            let mut best: Option<usize> = None;
            for &child in self.level.children(node) {
                if pending[child] == 0 {
                    continue;
                }
                best = match best {
                    Some(current) if !self.prefer(child, current, simulated) => Some(current),
                    _ => Some(child),
                };
            }
            match best {
                Some(next) => node = next,
                None => return Some(node),
            }
        }
    }

    /// True if `child` should replace `current` as the next step down.
    fn prefer(&self, child: usize, current: usize, simulated: &[u64]) -> bool {
        let leaves_child = u128::from(self.level.leaves_count(child).unwrap_or(0));
        let leaves_current = u128::from(self.level.leaves_count(current).unwrap_or(0));

        // simulated[child] / leaves_child vs simulated[current] / leaves_current
        let lhs = u128::from(simulated[child]) * leaves_current;
        let rhs = u128::from(simulated[current]) * leaves_child;

        match lhs.cmp(&rhs) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => leaves_child > leaves_current,
        }
    }

    /// Reachable pages ordered so every level-child precedes its parents.
    fn deepest_first(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.graph.len())
            .filter(|&ix| self.level.is_reachable(ix))
            .collect();
        order.sort_by_key(|&ix| Reverse(self.level.level(ix)));
        order
    }

    /// Nonzero for every page with an unproposed candidate at or below it.
    fn pending_below(&self, order: &[usize], candidates: &BTreeSet<usize>) -> Vec<u32> {
        let mut pending = vec![0u32; self.graph.len()];
        for &ix in order {
            let own = u32::from(candidates.contains(&ix));
            pending[ix] = self
                .level
                .children(ix)
                .iter()
                .fold(own, |acc, &child| acc.saturating_add(pending[child]));
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SiteStructure;

    fn star() -> (SiteGraph, LevelGraph) {
        let structure = SiteStructure::new(0, "Home")
            .page(1, "L1", 0)
            .page(2, "L2", 0)
            .page(3, "L3", 0)
            .page(4, "L4", 0);
        let graph = SiteGraph::build(&structure).unwrap();
        let level = LevelGraph::derive(&graph).unwrap();
        (graph, level)
    }

    #[test]
    fn test_star_picks_in_child_order() {
        let (graph, level) = star();
        let state = AnalysisState::new(graph.len());
        let recommender = CoverageRecommender::new(&graph, &level, &state, BTreeSet::new());

        let hot_list = recommender.recommend();
        let labels: Vec<&str> = hot_list.iter().map(|e| e.label.as_str()).collect();
        let gains: Vec<f64> = hot_list.iter().map(|e| e.coverage_gain).collect();

        assert_eq!(labels, vec!["L1", "L2", "L3", "L4"]);
        assert_eq!(gains, vec![0.25, 0.5, 0.75, 1.0]);
        // the recorded state is untouched
        assert_eq!(state, AnalysisState::new(graph.len()));
    }

    #[test]
    fn test_existing_targets_are_not_proposed() {
        let (graph, level) = star();
        let mut state = AnalysisState::new(graph.len());
        state.node_mut(0).visits_on_optimal_paths = 1;
        state.node_mut(2).visits_on_optimal_paths = 1;
        let recommender =
            CoverageRecommender::new(&graph, &level, &state, BTreeSet::from([2]));

        let hot_list = recommender.recommend();
        let labels: Vec<&str> = hot_list.iter().map(|e| e.label.as_str()).collect();

        assert_eq!(labels, vec!["L1", "L3", "L4"]);
        assert_eq!(hot_list.last().map(|e| e.coverage_gain), Some(1.0));
    }

    #[test]
    fn test_prefers_less_covered_subtree_with_more_leaves() {
        // root → {A, B}; A → {A1, A2}; B → B1
        let structure = SiteStructure::new(0, "Home")
            .page(1, "A", 0)
            .page(2, "B", 0)
            .page(3, "A1", 1)
            .page(4, "A2", 1)
            .page(5, "B1", 2);
        let graph = SiteGraph::build(&structure).unwrap();
        let level = LevelGraph::derive(&graph).unwrap();
        let state = AnalysisState::new(graph.len());
        let recommender = CoverageRecommender::new(&graph, &level, &state, BTreeSet::new());

        let labels: Vec<String> = recommender
            .recommend()
            .into_iter()
            .map(|e| e.label)
            .collect();

        // A wins the 0/2 vs 0/1 tie on leaves; then B (0/1) beats A (1/2)
        assert_eq!(labels, vec!["A1", "B1", "A2"]);
    }
}
