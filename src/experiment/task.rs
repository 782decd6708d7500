//! Tasks: a target page plus every participant path recorded for it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Path;

/// Position of a task within its experiment, in first-seen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A target page participants were asked to find.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    source: usize,
    target: usize,
    alternate_name: String,
    paths: Vec<Path>,
    /// Pages on some shortest path from source to target; analysis state
    optimal_nodes: BTreeSet<usize>,
}

impl Task {
    /// Create a task without paths.
    pub fn new(id: TaskId, source: usize, target: usize, alternate_name: impl Into<String>) -> Self {
        Self {
            id,
            source,
            target,
            alternate_name: alternate_name.into(),
            paths: Vec::new(),
            optimal_nodes: BTreeSet::new(),
        }
    }

    /// Attach a path. Rejected if it heads for a different target.
    pub fn add_path(&mut self, path: Path) -> bool {
        if path.target() != self.target {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Task identifier.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Arena index of the start page.
    pub fn source(&self) -> usize {
        self.source
    }

    /// Arena index of the target page.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Human-readable task name used for de-duplication.
    pub fn alternate_name(&self) -> &str {
        &self.alternate_name
    }

    /// Recorded paths.
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub(crate) fn paths_mut(&mut self) -> &mut [Path] {
        &mut self.paths
    }

    /// Pages on some shortest path to the target, as of the last pass.
    pub fn optimal_nodes(&self) -> &BTreeSet<usize> {
        &self.optimal_nodes
    }

    pub(crate) fn set_optimal_nodes(&mut self, nodes: BTreeSet<usize>) {
        self.optimal_nodes = nodes;
    }

    /// Clear analysis state on the task and its paths.
    pub(crate) fn reset_analysis(&mut self) {
        self.optimal_nodes.clear();
        for path in &mut self.paths {
            path.reset_analysis();
        }
    }

    /// Share of successful paths; 0 for a task without paths.
    pub fn solution_rate(&self) -> f64 {
        if self.paths.is_empty() {
            return 0.0;
        }
        let successful = self.paths.iter().filter(|p| p.is_successful()).count();
        successful as f64 / self.paths.len() as f64
    }

    /// Paths truncated by systematic-search detection.
    pub fn invalid_path_count(&self) -> usize {
        self.paths.iter().filter(|p| p.is_invalid()).count()
    }

    /// Mean wall-clock duration over paths with a parseable duration.
    pub fn average_duration_secs(&self) -> u64 {
        let durations: Vec<u64> = self.paths.iter().filter_map(Path::duration_secs).collect();
        if durations.is_empty() {
            return 0;
        }
        let total = durations.iter().fold(0u64, |acc, &secs| acc.saturating_add(secs));
        total / durations.len() as u64
    }

    /// Mean number of visits per path.
    pub fn average_path_length(&self) -> usize {
        if self.paths.is_empty() {
            return 0;
        }
        self.paths.iter().map(Path::len).sum::<usize>() / self.paths.len()
    }
}
