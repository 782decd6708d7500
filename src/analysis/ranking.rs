//! Bad list: pages ranked by navigation problem severity.

use serde::Serialize;

use super::state::AnalysisState;
use crate::graph::{LevelGraph, NodeId, SiteGraph};

/// One bad-list row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadListEntry {
    /// Page identifier
    pub node: NodeId,
    /// Page label
    pub label: String,
    /// Distance rating weighted by degree
    pub malus: u64,
    /// Accumulated distance rating
    pub dist_rating: u64,
    /// Median observed latency in milliseconds
    pub latency_weight: f64,
}

/// Orders covered pages by malus, then by latency weight.
#[derive(Debug, Clone, Copy)]
pub struct ProblemRanker<'a> {
    graph: &'a SiteGraph,
    level: &'a LevelGraph,
    state: &'a AnalysisState,
}

impl<'a> ProblemRanker<'a> {
    /// Create a ranker over the state of a finished pass.
    pub fn new(graph: &'a SiteGraph, level: &'a LevelGraph, state: &'a AnalysisState) -> Self {
        Self {
            graph,
            level,
            state,
        }
    }

    /// Every reachable page with positive coverage, highest malus first.
    /// Exact ties on both keys keep arena order.
    pub fn rank(&self) -> Vec<BadListEntry> {
        let mut entries: Vec<BadListEntry> = self
            .graph
            .nodes()
            .filter(|(ix, _)| {
                self.level.is_reachable(*ix) && self.state.coverage(*ix, self.level) > 0.0
            })
            .map(|(ix, node)| {
                let stats = self.state.node(ix);
                BadListEntry {
                    node: node.id(),
                    label: node.label().to_string(),
                    malus: self.state.malus(ix, self.level),
                    dist_rating: stats.dist_rating,
                    latency_weight: stats.latency_weight(),
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.malus
                .cmp(&a.malus)
                .then_with(|| b.latency_weight.total_cmp(&a.latency_weight))
        });
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::TaskId;
    use crate::graph::SiteStructure;

    /// root(0) → {A(1), B(2)}, A → C(3)
    fn setup() -> (SiteGraph, LevelGraph, AnalysisState) {
        let structure = SiteStructure::new(0, "Home")
            .page(1, "A", 0)
            .page(2, "B", 0)
            .page(3, "C", 1);
        let graph = SiteGraph::build(&structure).unwrap();
        let level = LevelGraph::derive(&graph).unwrap();
        let state = AnalysisState::new(graph.len());
        (graph, level, state)
    }

    #[test]
    fn test_uncovered_pages_are_excluded() {
        let (graph, level, mut state) = setup();
        state.node_mut(2).record_step(TaskId(0), 2, 100);

        assert!(ProblemRanker::new(&graph, &level, &state).rank().is_empty());
    }

    #[test]
    fn test_ordered_by_malus_then_latency() {
        let (graph, level, mut state) = setup();
        for ix in 0..4 {
            state.node_mut(ix).visits_on_optimal_paths = 1;
        }
        // A: rating 1 × degree 2 = 2; B: rating 2 × degree 1 = 2; root: 0
        state.node_mut(1).record_step(TaskId(0), 1, 300);
        state.node_mut(2).record_step(TaskId(0), 2, 900);
        state.node_mut(0).record_step(TaskId(0), 0, 50);

        let ranked = ProblemRanker::new(&graph, &level, &state).rank();
        let labels: Vec<&str> = ranked.iter().map(|e| e.label.as_str()).collect();

        assert_eq!(labels, vec!["B", "A", "Home", "C"]);
        assert_eq!(ranked[0].malus, 2);
        assert_eq!(ranked[0].latency_weight, 900.0);
        assert_eq!(ranked[1].dist_rating, 1);

        for pair in ranked.windows(2) {
            assert!(pair[0].malus >= pair[1].malus);
        }
    }
}
