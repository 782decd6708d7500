//! Optimal-path sets: every page through which some shortest path runs.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, warn};

use super::state::AnalysisState;
use crate::error::DataWarning;
use crate::experiment::Task;
use crate::graph::{LevelGraph, SiteGraph};

/// Walk the level graph from `source` toward `target`, admitting a
/// level-child iff its distance to the target is exactly one less than its
/// parent's. Returns admitted pages in BFS order, `source` first.
///
/// Each page is admitted at most once. An unreachable target yields just
/// `[source]`.
pub(crate) fn shortest_path_nodes(
    graph: &SiteGraph,
    level: &LevelGraph,
    source: usize,
    target: usize,
) -> Vec<usize> {
    let mut admitted = vec![source];
    let mut seen = BTreeSet::from([source]);
    let mut queue = VecDeque::from([source]);

    while let Some(node) = queue.pop_front() {
        let Some(here) = graph.distance_between(node, target).hops() else {
            continue;
        };
        for &child in level.children(node) {
            let Some(there) = graph.distance_between(child, target).hops() else {
                continue;
            };
            if there + 1 == here && seen.insert(child) {
                admitted.push(child);
                queue.push_back(child);
            }
        }
    }

    admitted
}

/// Computes optimal-path sets for tasks and records admissions.
#[derive(Debug, Clone, Copy)]
pub struct TaskAnalyzer<'a> {
    graph: &'a SiteGraph,
    level: &'a LevelGraph,
}

impl<'a> TaskAnalyzer<'a> {
    /// Create an analyzer over a graph and its level graph.
    pub fn new(graph: &'a SiteGraph, level: &'a LevelGraph) -> Self {
        Self { graph, level }
    }

    /// Pages on some shortest path from `source` to `target`.
    pub fn optimal_nodes(&self, source: usize, target: usize) -> BTreeSet<usize> {
        shortest_path_nodes(self.graph, self.level, source, target)
            .into_iter()
            .collect()
    }

    /// Store the optimal set on `task` and count one optimal-path visit per
    /// admitted page. An unreachable target is reported, not raised.
    pub fn analyze(&self, task: &mut Task, state: &mut AnalysisState) -> Option<DataWarning> {
        let source = task.source();
        let target = task.target();
        let admitted = shortest_path_nodes(self.graph, self.level, source, target);

        for &ix in &admitted {
            state.node_mut(ix).visits_on_optimal_paths += 1;
        }

        debug!(
            task = %task.alternate_name(),
            optimal_nodes = admitted.len(),
            "Optimal-path set computed"
        );
        task.set_optimal_nodes(admitted.into_iter().collect());

        if self.graph.distance_between(source, target).is_reachable() {
            return None;
        }

        let warning = DataWarning::UnreachableTarget {
            task: task.alternate_name().to_string(),
            target: self.graph.node_at(target).id(),
        };
        warn!(warning = %warning, "Task target unreachable");
        Some(warning)
    }
}
