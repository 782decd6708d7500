//! Systematic-search detection.
//!
//! A participant who stops navigating toward the target and starts probing
//! pages exhaustively shows a recognizable pattern: fast clicks, frequent
//! returns to pages already seen, and little progress. The detector slides a
//! fixed-size window over a path and flags the first position where all three
//! hold at once.
//!
//! # Window
//!
//! ```text
//! position i:   steps i-n .. i-1 are inspected, each against its successor
//!
//!   problem  step j does not strictly decrease the distance to the target
//!   return   page j was already seen earlier in the same window
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path as FsPath;

use serde::Serialize;
use tracing::debug;

use super::state::AnalysisState;
use crate::error::{ExportError, ExportResult};
use crate::experiment::Path;
use crate::graph::SiteGraph;

// ============================================================================
// Thresholds
// ============================================================================

/// Window size and trigger thresholds for one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionThresholds {
    /// Window size; 0 disables detection
    pub nodes_to_inspect: usize,
    /// Problem rate that must be exceeded
    pub max_problem_rate: f64,
    /// Return rate that must be exceeded
    pub max_return_rate: f64,
}

// ============================================================================
// Detection Records
// ============================================================================

/// One detected onset of systematic searching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRecord {
    /// Participant identifier
    pub user_id: String,
    /// Label of the task target
    pub target: String,
    /// Path position where the path is cut off
    pub position: usize,
    /// Label of the page at that position
    pub node: String,
    /// Share of window steps that did not get closer to the target
    pub problem_rate: f64,
    /// Share of window steps that revisited a page
    pub return_rate: f64,
    /// Number of revisits in the window
    pub returns: usize,
    /// Mean observed latency over the window
    pub average_latency_ms: f64,
    /// Mean minimal latency over the window
    pub average_minimal_latency_ms: f64,
}

const FRAME: &str = "*********************************";

impl fmt::Display for DetectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", FRAME)?;
        writeln!(f, "Systematic searching detected")?;
        writeln!(f, "User: {}, Target: {}", self.user_id, self.target)?;
        writeln!(f, "Position: {} ({})", self.position, self.node)?;
        writeln!(
            f,
            "Average minimal latency: {:.1} ms",
            self.average_minimal_latency_ms
        )?;
        writeln!(f, "Average latency: {:.1} ms", self.average_latency_ms)?;
        writeln!(
            f,
            "Problem rate: {:.3}, return rate: {:.3} ({} returns)",
            self.problem_rate, self.return_rate, self.returns
        )?;
        writeln!(f, "{}", FRAME)
    }
}

/// Detection records of one analysis pass, in detection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DetectionLog {
    records: Vec<DetectionRecord>,
}

impl DetectionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, record: DetectionRecord) {
        self.records.push(record);
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Records in detection order.
    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing was detected.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flat text export: one framed block per record.
    pub fn to_report_string(&self) -> String {
        self.records.iter().map(ToString::to_string).collect()
    }

    /// Write the flat text export to `path`.
    pub fn write_to(&self, path: impl AsRef<FsPath>) -> ExportResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_report_string()).map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

// ============================================================================
// Detector
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct WindowStats {
    problems: usize,
    returns: usize,
    latency_sum: u64,
    minimal_latency_sum: u64,
}

/// Sliding-window detector over one path.
#[derive(Debug, Clone, Copy)]
pub struct SystematicSearchDetector<'a> {
    graph: &'a SiteGraph,
    thresholds: DetectionThresholds,
}

impl<'a> SystematicSearchDetector<'a> {
    /// Create a detector.
    pub fn new(graph: &'a SiteGraph, thresholds: DetectionThresholds) -> Self {
        Self { graph, thresholds }
    }

    /// Scan `path` and return the first detection, if any.
    ///
    /// Minimal latencies are read from `state`, so they must be computed
    /// before the scan. Paths shorter than twice the distance from their
    /// first page to the target are never flagged.
    pub fn inspect(&self, path: &Path, state: &AnalysisState) -> Option<DetectionRecord> {
        let n = self.thresholds.nodes_to_inspect;
        let steps = path.steps();
        let first = steps.first()?;
        if n == 0 {
            return None;
        }

        let target = path.target();
        if let Some(d) = self.graph.distance_between(first.node, target).hops() {
            if (steps.len() as u64) < 2 * u64::from(d) {
                debug!(user = %path.user_id(), length = steps.len(), "Path too short for detection");
                return None;
            }
        }

        for i in n..steps.len() {
            let window = self.window_stats(path, state, i - n, i);
            let size = n as f64;
            let problem_rate = window.problems as f64 / size;
            let return_rate = window.returns as f64 / size;
            let average_latency_ms = window.latency_sum as f64 / size;
            let average_minimal_latency_ms = window.minimal_latency_sum as f64 / size;

            if problem_rate > self.thresholds.max_problem_rate
                && return_rate > self.thresholds.max_return_rate
                && average_latency_ms <= average_minimal_latency_ms
            {
                return Some(DetectionRecord {
                    user_id: path.user_id().to_string(),
                    target: self.graph.node_at(target).label().to_string(),
                    position: i,
                    node: self.graph.node_at(steps[i].node).label().to_string(),
                    problem_rate,
                    return_rate,
                    returns: window.returns,
                    average_latency_ms,
                    average_minimal_latency_ms,
                });
            }
        }

        None
    }

    /// Statistics over steps `start..end`; each step is compared with the
    /// step that follows it, which always exists because `end < path.len()`.
    fn window_stats(
        &self,
        path: &Path,
        state: &AnalysisState,
        start: usize,
        end: usize,
    ) -> WindowStats {
        let steps = path.steps();
        let target = path.target();
        let mut seen = HashSet::with_capacity(end - start);
        let mut stats = WindowStats {
            problems: 0,
            returns: 0,
            latency_sum: 0,
            minimal_latency_sum: 0,
        };

        for j in start..end {
            let here = steps[j].node;
            let next = steps[j + 1].node;

            stats.latency_sum = stats.latency_sum.saturating_add(steps[j].latency_ms);
            stats.minimal_latency_sum = stats
                .minimal_latency_sum
                .saturating_add(state.node(here).minimal_latency_ms.unwrap_or(0));

            // Unreachable orders after every hop count, so it never counts as progress
            if self.graph.distance_between(here, target) <= self.graph.distance_between(next, target) {
                stats.problems += 1;
            }
            if !seen.insert(here) {
                stats.returns += 1;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SiteStructure;

    /// root(0) → A(1) → B(2) → C(3)
    fn chain() -> SiteGraph {
        let structure = SiteStructure::new(0, "Home")
            .page(1, "A", 0)
            .page(2, "B", 1)
            .page(3, "C", 2);
        SiteGraph::build(&structure).unwrap()
    }

    fn state_with_minimal_latency(graph: &SiteGraph, ms: u64) -> AnalysisState {
        let mut state = AnalysisState::new(graph.len());
        for ix in 0..graph.len() {
            state.node_mut(ix).minimal_latency_ms = Some(ms);
        }
        state
    }

    fn path(nodes: &[usize], latency: u64) -> Path {
        let mut path = Path::new(0, 3, "u1", "00:00:30");
        for &node in nodes {
            path.push(node, latency);
        }
        path.finalize();
        path
    }

    fn thresholds(n: usize) -> DetectionThresholds {
        DetectionThresholds {
            nodes_to_inspect: n,
            max_problem_rate: 0.3,
            max_return_rate: 0.15,
        }
    }

    #[test]
    fn test_detects_at_repeat_position() {
        let graph = chain();
        let state = state_with_minimal_latency(&graph, 600);
        let detector = SystematicSearchDetector::new(&graph, thresholds(3));

        let record = detector
            .inspect(&path(&[0, 1, 0, 1, 2, 3], 50), &state)
            .unwrap();

        assert_eq!(record.position, 3);
        assert_eq!(record.node, "A");
        assert_eq!(record.target, "C");
        assert_eq!(record.returns, 1);
        assert!((record.problem_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(record.average_latency_ms, 50.0);
        assert_eq!(record.average_minimal_latency_ms, 600.0);
    }

    #[test]
    fn test_slow_participant_is_not_flagged() {
        let graph = chain();
        let state = state_with_minimal_latency(&graph, 600);
        let detector = SystematicSearchDetector::new(&graph, thresholds(3));

        assert!(detector
            .inspect(&path(&[0, 1, 0, 1, 2, 3], 5000), &state)
            .is_none());
    }

    #[test]
    fn test_short_path_is_skipped() {
        let graph = chain();
        let state = state_with_minimal_latency(&graph, 600);
        let detector = SystematicSearchDetector::new(&graph, thresholds(2));

        // five visits, but the first page is three hops from the target
        assert!(detector
            .inspect(&path(&[0, 1, 0, 1, 0], 10), &state)
            .is_none());
    }

    #[test]
    fn test_zero_window_disables_detection() {
        let graph = chain();
        let state = state_with_minimal_latency(&graph, 600);
        let detector = SystematicSearchDetector::new(&graph, thresholds(0));

        assert!(detector
            .inspect(&path(&[0, 1, 0, 1, 0, 1, 0], 10), &state)
            .is_none());
    }

    #[test]
    fn test_window_sums_saturate() {
        let graph = chain();
        let state = state_with_minimal_latency(&graph, u64::MAX);
        let detector = SystematicSearchDetector::new(&graph, thresholds(3));

        let record = detector
            .inspect(&path(&[0, 1, 0, 1, 2, 3], u64::MAX), &state)
            .unwrap();

        assert_eq!(record.position, 3);
        assert_eq!(record.average_latency_ms, record.average_minimal_latency_ms);
    }

    #[test]
    fn test_log_export_frames_every_record() {
        let graph = chain();
        let state = state_with_minimal_latency(&graph, 600);
        let detector = SystematicSearchDetector::new(&graph, thresholds(3));
        let record = detector
            .inspect(&path(&[0, 1, 0, 1, 2, 3], 50), &state)
            .unwrap();

        let mut log = DetectionLog::new();
        log.push(record.clone());
        log.push(record);
        let text = log.to_report_string();

        assert_eq!(text.matches(FRAME).count(), 4);
        assert!(text.contains("User: u1, Target: C"));
        assert!(text.contains("Position: 3 (A)"));

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("detections.txt");
        log.write_to(&file).unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), text);
    }
}
