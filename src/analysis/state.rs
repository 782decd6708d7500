//! Per-page analysis state.
//!
//! Everything here is wiped by [`AnalysisState::reset`]. Structural tables
//! (level, degree, leaves-count) live in [`LevelGraph`] and are not touched.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::experiment::TaskId;
use crate::graph::LevelGraph;

/// Scores a page collected while being visited for one task.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskStats {
    /// Accumulated distance rating for this task
    pub dist_rating: u64,
    /// Observed decision latencies for this task
    pub latencies: Vec<u64>,
}

/// Accumulated analysis state for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeStats {
    /// Scored visits
    pub visits: u64,
    /// Times the page was admitted to a task's optimal set
    pub visits_on_optimal_paths: u64,
    /// Accumulated distance rating over all tasks
    pub dist_rating: u64,
    /// Observed decision latencies over all tasks
    pub latencies: Vec<u64>,
    /// Estimated fastest plausible decision time
    pub minimal_latency_ms: Option<u64>,
    /// Breakdown by task
    pub per_task: BTreeMap<TaskId, TaskStats>,
}

impl NodeStats {
    /// Record one scored step taken from this page.
    pub fn record_step(&mut self, task: TaskId, rating: u64, latency_ms: u64) {
        self.visits += 1;
        self.dist_rating += rating;
        self.latencies.push(latency_ms);

        let stats = self.per_task.entry(task).or_default();
        stats.dist_rating += rating;
        stats.latencies.push(latency_ms);
    }

    /// Median observed latency; 0 without observations.
    pub fn latency_weight(&self) -> f64 {
        median(&self.latencies)
    }

    /// Distance rating collected for `task`.
    pub fn task_dist_rating(&self, task: TaskId) -> u64 {
        self.per_task.get(&task).map_or(0, |s| s.dist_rating)
    }

    /// Median latency observed for `task`; 0 without observations.
    pub fn task_latency_weight(&self, task: TaskId) -> f64 {
        self.per_task
            .get(&task)
            .map_or(0.0, |s| median(&s.latencies))
    }
}

/// Median of `values`; the mean of the two middle values for an even count.
pub fn median(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[middle] as f64
    } else {
        (sorted[middle - 1] as f64 + sorted[middle] as f64) / 2.0
    }
}

/// Analysis state for every page, indexed by arena index.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisState {
    nodes: Vec<NodeStats>,
}

impl AnalysisState {
    /// Zeroed state for `len` pages.
    pub fn new(len: usize) -> Self {
        Self {
            nodes: vec![NodeStats::default(); len],
        }
    }

    /// Zero every page. Idempotent.
    pub fn reset(&mut self) {
        for stats in &mut self.nodes {
            *stats = NodeStats::default();
        }
    }

    /// State of one page.
    ///
    /// # Panics
    ///
    /// Panics if `ix` is out of range.
    pub fn node(&self, ix: usize) -> &NodeStats {
        &self.nodes[ix]
    }

    pub(crate) fn node_mut(&mut self, ix: usize) -> &mut NodeStats {
        &mut self.nodes[ix]
    }

    /// Number of tracked pages.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no pages are tracked.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distance rating weighted by level-graph degree; 0 for unreachable pages.
    pub fn malus(&self, ix: usize, level: &LevelGraph) -> u64 {
        let degree = level.degree(ix).unwrap_or(0);
        self.nodes[ix].dist_rating.saturating_mul(degree)
    }

    /// Share of the page's leaves exercised by recorded tasks, within [0, 1].
    pub fn coverage(&self, ix: usize, level: &LevelGraph) -> f64 {
        ratio(self.nodes[ix].visits_on_optimal_paths, level.leaves_count(ix))
    }
}

/// `visits / leaves`, clamped to [0, 1]; 0 when `leaves` is missing or zero.
pub(crate) fn ratio(visits: u64, leaves: Option<u32>) -> f64 {
    match leaves {
        Some(leaves) if leaves > 0 => (visits as f64 / f64::from(leaves)).min(1.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[300, 100, 200]), 200.0);
        assert_eq!(median(&[400, 100, 200, 300]), 250.0);
        assert_eq!(median(&[1, 2]), 1.5);
    }

    #[test]
    fn test_record_step_tracks_task_breakdown() {
        let mut stats = NodeStats::default();
        stats.record_step(TaskId(0), 2, 800);
        stats.record_step(TaskId(1), 0, 200);
        stats.record_step(TaskId(0), 1, 400);

        assert_eq!(stats.visits, 3);
        assert_eq!(stats.dist_rating, 3);
        assert_eq!(stats.task_dist_rating(TaskId(0)), 3);
        assert_eq!(stats.task_dist_rating(TaskId(1)), 0);
        assert_eq!(stats.task_dist_rating(TaskId(7)), 0);
        assert_eq!(stats.latency_weight(), 400.0);
        assert_eq!(stats.task_latency_weight(TaskId(0)), 600.0);
        assert_eq!(stats.task_latency_weight(TaskId(7)), 0.0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut state = AnalysisState::new(3);
        state.node_mut(1).record_step(TaskId(0), 2, 100);
        state.node_mut(2).visits_on_optimal_paths = 4;
        state.node_mut(0).minimal_latency_ms = Some(600);

        state.reset();
        let once = state.clone();
        state.reset();

        assert_eq!(state, once);
        assert_eq!(state, AnalysisState::new(3));
    }

    #[test]
    fn test_ratio_is_clamped() {
        assert_eq!(ratio(1, Some(4)), 0.25);
        assert_eq!(ratio(9, Some(4)), 1.0);
        assert_eq!(ratio(3, Some(0)), 0.0);
        assert_eq!(ratio(3, None), 0.0);
    }
}
