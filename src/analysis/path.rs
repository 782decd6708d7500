//! Per-path scoring.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::detection::{DetectionLog, DetectionThresholds, SystematicSearchDetector};
use super::state::AnalysisState;
use crate::experiment::{Path, Task, TaskId};
use crate::graph::{Distance, SiteGraph};

/// Rating of one step from a page at distance `here` to a page at distance
/// `next` from the target: 0 when it gets closer, 1 when it holds distance,
/// 2 when it falls back.
///
/// An unreachable successor counts as one hop farther, and so does any
/// successor more than one hop farther. Steps from a page that cannot reach
/// the target are not rated.
pub fn step_rating(here: Distance, next: Distance) -> Option<u64> {
    let d = here.hops()?;
    let cap = d.saturating_add(1);
    let next = next.hops().map_or(cap, |n| n.min(cap));

    let rating = i64::from(next) - i64::from(d) + 1;
    Some(rating.clamp(0, 2) as u64)
}

/// Runs detection and scoring over every path of a task.
#[derive(Debug, Clone, Copy)]
pub struct PathAnalyzer<'a> {
    graph: &'a SiteGraph,
    detector: SystematicSearchDetector<'a>,
}

impl<'a> PathAnalyzer<'a> {
    /// Create an analyzer.
    pub fn new(graph: &'a SiteGraph, thresholds: DetectionThresholds) -> Self {
        Self {
            graph,
            detector: SystematicSearchDetector::new(graph, thresholds),
        }
    }

    /// Detect systematic searching on each finalized path, then score it up
    /// to its cutoff. The task's optimal set must already be computed.
    ///
    /// Returns the number of scored steps.
    pub fn analyze(
        &self,
        task: &mut Task,
        state: &mut AnalysisState,
        log: &mut DetectionLog,
    ) -> usize {
        let id = task.id();
        let optimal = task.optimal_nodes().clone();
        let mut scored = 0;

        for path in task.paths_mut() {
            if !path.is_finalized() {
                continue;
            }

            if let Some(record) = self.detector.inspect(path, state) {
                warn!(
                    user = %record.user_id,
                    target = %record.target,
                    position = record.position,
                    problem_rate = record.problem_rate,
                    return_rate = record.return_rate,
                    "Systematic searching detected"
                );
                path.set_cutoff(record.position);
                log.push(record);
            }

            scored += self.score(id, &optimal, path, state);
        }

        scored
    }

    /// Score the steps of one path taken from optimal-path pages, stopping
    /// at the cutoff.
    pub fn score(
        &self,
        task: TaskId,
        optimal: &BTreeSet<usize>,
        path: &Path,
        state: &mut AnalysisState,
    ) -> usize {
        let steps = path.steps();
        let end = path
            .cutoff()
            .unwrap_or(steps.len())
            .min(steps.len().saturating_sub(1));
        let target = path.target();
        let mut scored = 0;

        for (i, step) in steps.iter().enumerate().take(end) {
            if !optimal.contains(&step.node) {
                continue;
            }
            let here = self.graph.distance_between(step.node, target);
            let next = self.graph.distance_between(steps[i + 1].node, target);
            let Some(rating) = step_rating(here, next) else {
                continue;
            };

            state
                .node_mut(step.node)
                .record_step(task, rating, step.latency_ms);
            scored += 1;
        }

        if let Some(cutoff) = path.cutoff() {
            debug!(user = %path.user_id(), cutoff, scored, "Scored truncated path");
        }

        scored
    }
}
