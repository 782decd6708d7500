//! Serializable results of an analysis pass.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::coverage::HotListEntry;
use super::detection::DetectionRecord;
use super::ranking::BadListEntry;
use crate::error::DataWarning;
use crate::experiment::{Task, TaskId};
use crate::graph::{LevelGraph, NodeId, SiteGraph};

/// Shape of the site structure and its level graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureSummary {
    /// Number of pages
    pub nodes: usize,
    /// Number of raw links
    pub links: usize,
    /// Pages reached from the root
    pub reachable: usize,
    /// Number of level edges
    pub level_edges: usize,
    /// Number of level leaves
    pub leaves: usize,
    /// Level-graph degree of the root
    pub root_degree: u64,
    /// Level leaves beneath the root
    pub root_leaves: u32,
    /// Detection window size derived from leaf depths
    pub nodes_to_inspect: usize,
}

impl StructureSummary {
    /// Summarize a graph and its level graph.
    pub fn new(graph: &SiteGraph, level: &LevelGraph) -> Self {
        let root = graph.root_index();
        Self {
            nodes: graph.len(),
            links: graph.link_count(),
            reachable: level.reachable_count(),
            level_edges: level.edge_count(),
            leaves: level.leaves().count(),
            root_degree: level.degree(root).unwrap_or(0),
            root_leaves: level.leaves_count(root).unwrap_or(0),
            nodes_to_inspect: level.nodes_to_inspect(),
        }
    }
}

/// Per-task statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    /// Task identifier
    pub id: TaskId,
    /// Task name
    pub name: String,
    /// Target page
    pub target: NodeId,
    /// Target label
    pub target_label: String,
    /// Share of successful paths
    pub solution_rate: f64,
    /// Recorded paths
    pub paths: usize,
    /// Paths cut off by systematic-search detection
    pub invalid_paths: usize,
    /// Paths abandoned by the participant
    pub skipped_paths: usize,
    /// Mean wall-clock duration in seconds
    pub average_duration_secs: u64,
    /// Mean number of visits per path
    pub average_path_length: usize,
    /// Size of the optimal-path set
    pub optimal_nodes: usize,
}

impl TaskSummary {
    /// Summarize an analyzed task.
    pub fn new(task: &Task, graph: &SiteGraph) -> Self {
        let target = graph.node_at(task.target());
        Self {
            id: task.id(),
            name: task.alternate_name().to_string(),
            target: target.id(),
            target_label: target.label().to_string(),
            solution_rate: task.solution_rate(),
            paths: task.paths().len(),
            invalid_paths: task.invalid_path_count(),
            skipped_paths: task.paths().iter().filter(|p| p.is_skipped()).count(),
            average_duration_secs: task.average_duration_secs(),
            average_path_length: task.average_path_length(),
            optimal_nodes: task.optimal_nodes().len(),
        }
    }
}

/// A page's share of one task's problems.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaskBreakdown {
    /// Distance rating for the task
    pub dist_rating: u64,
    /// Percentage of the task's total distance rating; 0 when the total is 0
    pub dist_rating_share: f64,
    /// Median latency observed for the task
    pub latency_weight: f64,
}

/// Everything one analysis pass produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Unique id of this pass
    pub run_id: Uuid,
    /// Completion time
    pub generated_at: DateTime<Utc>,
    /// Detection window size used
    pub nodes_to_inspect: usize,
    /// Graph coverage
    pub coverage: f64,
    /// Mean solution rate over tasks
    pub total_solution_rate: f64,
    /// Distinct participants
    pub users: usize,
    /// Pages ranked by problem severity
    pub bad_list: Vec<BadListEntry>,
    /// Recommended future targets
    pub hot_list: Vec<HotListEntry>,
    /// Systematic-search detections
    pub detections: Vec<DetectionRecord>,
    /// Per-task statistics
    pub tasks: Vec<TaskSummary>,
    /// Data-quality warnings from ingestion and analysis
    pub warnings: Vec<DataWarning>,
    /// Structure shape
    pub structure: StructureSummary,
}
