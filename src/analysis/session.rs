//! Analysis session: one site structure, its experiment and the state of
//! the last pass.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::coverage::{CoverageRecommender, HotListEntry};
use super::detection::{DetectionLog, DetectionThresholds};
use super::optimal::TaskAnalyzer;
use super::path::PathAnalyzer;
use super::ranking::{BadListEntry, ProblemRanker};
use super::state::AnalysisState;
use super::summary::{AnalysisReport, StructureSummary, TaskBreakdown, TaskSummary};
use crate::config::AnalysisConfig;
use crate::error::{AppResult, DataWarning};
use crate::experiment::{Experiment, TaskAttempt, TaskId};
use crate::graph::{Distance, LevelGraph, NodeId, SiteGraph, SiteStructure};

/// Owns the graph, the experiment and all analysis state.
///
/// Built once per structure import. Re-importing a structure means building
/// a new session, never patching this one.
#[derive(Debug, Clone)]
pub struct Session {
    graph: SiteGraph,
    level: LevelGraph,
    experiment: Experiment,
    config: AnalysisConfig,
    state: AnalysisState,
    detections: DetectionLog,
    warnings: Vec<DataWarning>,
    nodes_to_inspect: usize,
}

impl Session {
    /// Build the graph and level graph from `structure`.
    pub fn new(structure: &SiteStructure, config: AnalysisConfig) -> AppResult<Self> {
        let graph = SiteGraph::build(structure)?;
        Self::from_graph(graph, config)
    }

    /// Wrap an already built graph.
    pub fn from_graph(graph: SiteGraph, config: AnalysisConfig) -> AppResult<Self> {
        config.validate()?;
        let level = LevelGraph::derive(&graph)?;
        let state = AnalysisState::new(graph.len());

        Ok(Self {
            graph,
            level,
            experiment: Experiment::new(),
            config,
            state,
            detections: DetectionLog::new(),
            warnings: Vec::new(),
            nodes_to_inspect: 0,
        })
    }

    /// Ingest one attempt into the experiment.
    pub fn ingest(&mut self, attempt: TaskAttempt) -> Option<TaskId> {
        self.experiment.ingest(&self.graph, attempt)
    }

    /// Ingest a batch of attempts. Returns how many became paths.
    pub fn ingest_all<I>(&mut self, attempts: I) -> usize
    where
        I: IntoIterator<Item = TaskAttempt>,
    {
        attempts
            .into_iter()
            .filter_map(|attempt| self.ingest(attempt))
            .count()
    }

    /// Clear all analysis state. Structure tables are left alone. Idempotent.
    pub fn reset(&mut self) {
        self.state.reset();
        self.detections.clear();
        self.warnings.clear();
        self.nodes_to_inspect = 0;
        for task in self.experiment.tasks_mut() {
            task.reset_analysis();
        }
    }

    /// Run a full pass and return its report.
    ///
    /// Order: reset, minimal latencies, window size, then per task the
    /// optimal set followed by detection and scoring of every path, and
    /// finally the bad list and hot list.
    pub fn analyze(&mut self) -> AnalysisReport {
        self.reset();
        info!(
            tasks = self.experiment.tasks().len(),
            paths = self.experiment.path_count(),
            "Starting analysis pass"
        );

        let think = self.config.time_to_think_ms;
        for ix in 0..self.graph.len() {
            self.state.node_mut(ix).minimal_latency_ms =
                Some(self.graph.minimal_latency_ms(ix, think));
        }
        self.nodes_to_inspect = self
            .config
            .nodes_to_inspect
            .unwrap_or_else(|| self.level.nodes_to_inspect());

        let thresholds = DetectionThresholds {
            nodes_to_inspect: self.nodes_to_inspect,
            max_problem_rate: self.config.max_problem_rate,
            max_return_rate: self.config.max_return_rate,
        };
        let task_analyzer = TaskAnalyzer::new(&self.graph, &self.level);
        let path_analyzer = PathAnalyzer::new(&self.graph, thresholds);

        let mut scored = 0;
        for task in self.experiment.tasks_mut() {
            if let Some(warning) = task_analyzer.analyze(task, &mut self.state) {
                self.warnings.push(warning);
            }
            scored += path_analyzer.analyze(task, &mut self.state, &mut self.detections);
        }

        let bad_list = self.bad_list();
        let hot_list = self.hot_list();

        info!(
            scored_steps = scored,
            detections = self.detections.len(),
            coverage = self.coverage(),
            "Analysis pass complete"
        );

        let mut warnings = self.experiment.warnings().to_vec();
        warnings.extend(self.warnings.iter().cloned());

        AnalysisReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            nodes_to_inspect: self.nodes_to_inspect,
            coverage: self.coverage(),
            total_solution_rate: self.total_solution_rate(),
            users: self.experiment.user_count(),
            bad_list,
            hot_list,
            detections: self.detections.records().to_vec(),
            tasks: self.task_summaries(),
            warnings,
            structure: self.structure_summary(),
        }
    }

    /// Bad list for the current analysis state.
    pub fn bad_list(&self) -> Vec<BadListEntry> {
        ProblemRanker::new(&self.graph, &self.level, &self.state).rank()
    }

    /// Hot list for the current analysis state.
    pub fn hot_list(&self) -> Vec<HotListEntry> {
        CoverageRecommender::new(&self.graph, &self.level, &self.state, self.experiment.targets())
            .recommend()
    }

    /// Graph coverage: the root's coverage.
    pub fn coverage(&self) -> f64 {
        self.state.coverage(self.graph.root_index(), &self.level)
    }

    /// Mean solution rate over all tasks.
    pub fn total_solution_rate(&self) -> f64 {
        self.experiment.total_solution_rate()
    }

    /// Directed hop distance between two page ids.
    pub fn distance(&self, source: NodeId, target: NodeId) -> Distance {
        self.graph.distance(source, target)
    }

    /// A page's share of one task's problems, or `None` if the page is not
    /// on the task's optimal set.
    pub fn task_breakdown(&self, node: NodeId, task: TaskId) -> Option<TaskBreakdown> {
        let ix = self.graph.index_of(node)?;
        let task = self.experiment.task(task)?;
        if !task.optimal_nodes().contains(&ix) {
            return None;
        }

        let stats = self.state.node(ix);
        let dist_rating = stats.task_dist_rating(task.id());
        let total: u64 = task
            .optimal_nodes()
            .iter()
            .map(|&other| self.state.node(other).task_dist_rating(task.id()))
            .sum();
        let dist_rating_share = if total == 0 {
            0.0
        } else {
            dist_rating as f64 * 100.0 / total as f64
        };

        Some(TaskBreakdown {
            dist_rating,
            dist_rating_share,
            latency_weight: stats.task_latency_weight(task.id()),
        })
    }

    /// Statistics for every task.
    pub fn task_summaries(&self) -> Vec<TaskSummary> {
        self.experiment
            .tasks()
            .iter()
            .map(|task| TaskSummary::new(task, &self.graph))
            .collect()
    }

    /// Shape of the structure and its level graph.
    pub fn structure_summary(&self) -> StructureSummary {
        StructureSummary::new(&self.graph, &self.level)
    }

    /// The raw structure graph.
    pub fn graph(&self) -> &SiteGraph {
        &self.graph
    }

    /// The level graph.
    pub fn level(&self) -> &LevelGraph {
        &self.level
    }

    /// The ingested experiment.
    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    /// Active analysis settings.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Per-page analysis state of the last pass.
    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    /// Detections of the last pass.
    pub fn detections(&self) -> &DetectionLog {
        &self.detections
    }

    /// Warnings raised by the last pass, excluding ingestion warnings.
    pub fn warnings(&self) -> &[DataWarning] {
        &self.warnings
    }

    /// Window size used by the last pass; 0 before the first pass.
    pub fn nodes_to_inspect(&self) -> usize {
        self.nodes_to_inspect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ConfigError};
    use crate::experiment::AttemptStatus;

    fn chain() -> SiteStructure {
        SiteStructure::new(0, "Home")
            .page(1, "A", 0)
            .page(2, "B", 1)
            .page(3, "C", 2)
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let config = AnalysisConfig::default().with_max_return_rate(1.5);
        let err = Session::new(&chain(), config).unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::OutOfRange { field: "max_return_rate", .. })
        ));
    }

    #[test]
    fn test_analyze_without_tasks() {
        let mut session = Session::new(&chain(), AnalysisConfig::default()).unwrap();
        let report = session.analyze();

        assert_eq!(report.coverage, 0.0);
        assert_eq!(report.total_solution_rate, 0.0);
        assert!(report.bad_list.is_empty());
        assert_eq!(report.hot_list.len(), 1);
        assert_eq!(report.nodes_to_inspect, 6);
    }

    #[test]
    fn test_breakdown_shares() {
        let mut session = Session::new(&chain(), AnalysisConfig::default()).unwrap();
        let attempt = TaskAttempt::new("u1", "Find C", 3, AttemptStatus::Completed)
            .visit(0, 2000)
            .visit(1, 2000)
            .visit(0, 2000)
            .visit(1, 2000)
            .visit(2, 2000)
            .visit(3, 0);
        session.ingest(attempt);
        session.analyze();

        // A → root regresses (2), everything else advances (0)
        let a = session.task_breakdown(NodeId(1), TaskId(0)).unwrap();
        assert_eq!(a.dist_rating, 2);
        assert_eq!(a.dist_rating_share, 100.0);
        assert_eq!(a.latency_weight, 2000.0);

        let root = session.task_breakdown(NodeId(0), TaskId(0)).unwrap();
        assert_eq!(root.dist_rating_share, 0.0);

        assert!(session.task_breakdown(NodeId(9), TaskId(0)).is_none());
        assert!(session.task_breakdown(NodeId(1), TaskId(4)).is_none());
    }

    #[test]
    fn test_configured_window_overrides_derived() {
        let config = AnalysisConfig::default().with_nodes_to_inspect(2);
        let mut session = Session::new(&chain(), config).unwrap();
        assert_eq!(session.analyze().nodes_to_inspect, 2);
        assert_eq!(session.structure_summary().nodes_to_inspect, 6);
    }
}
