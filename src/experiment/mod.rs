//! Experiment data: tasks, participant paths and event ingestion.
//!
//! Event records arrive already parsed (one [`TaskAttempt`] per participant
//! and task). Ingestion:
//! - drops attempts with `unknown` status and skipped attempts without visits
//! - de-duplicates tasks by their alternate name, in first-seen order
//! - maps visited item ids onto the [`SiteGraph`] arena
//! - reports unusable attempts as [`DataWarning`]s instead of failing

mod path;
mod task;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DataWarning;
use crate::graph::{NodeId, SiteGraph};

pub use path::{parse_duration_secs, Path, PathState, Step};
pub use task::{Task, TaskId};

// ============================================================================
// Ingestion Records
// ============================================================================

/// Outcome reported by the study tool for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// The participant submitted an answer
    Completed,
    /// The participant gave up
    Skipped,
    /// The tool could not tell
    Unknown,
}

/// A single page visit within an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    /// Visited page
    pub item_id: NodeId,
    /// Time spent on the page before the next click, in milliseconds
    pub elapsed_ms: u64,
}

/// One participant's attempt at one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAttempt {
    /// Participant identifier
    pub user_id: String,
    /// Task name as shown to the participant
    pub alternate_name: String,
    /// Page the participant was asked to find
    pub target_id: NodeId,
    /// Reported outcome
    pub status: AttemptStatus,
    /// Wall-clock duration, `HH:MM:SS`
    #[serde(default)]
    pub duration: String,
    /// Visits in click order
    #[serde(default)]
    pub visits: Vec<Visit>,
}

impl TaskAttempt {
    /// Create an attempt without visits.
    pub fn new(
        user_id: impl Into<String>,
        alternate_name: impl Into<String>,
        target_id: u32,
        status: AttemptStatus,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            alternate_name: alternate_name.into(),
            target_id: NodeId(target_id),
            status,
            duration: String::new(),
            visits: Vec::new(),
        }
    }

    /// Set the recorded duration.
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    /// Append a visit.
    pub fn visit(mut self, item_id: u32, elapsed_ms: u64) -> Self {
        self.visits.push(Visit {
            item_id: NodeId(item_id),
            elapsed_ms,
        });
        self
    }
}

// ============================================================================
// Experiment
// ============================================================================

/// All tasks and paths ingested for one site structure.
#[derive(Debug, Clone, Default)]
pub struct Experiment {
    tasks: Vec<Task>,
    users: BTreeSet<String>,
    warnings: Vec<DataWarning>,
}

impl Experiment {
    /// Create an empty experiment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a batch of attempts against `graph`.
    pub fn from_attempts<I>(graph: &SiteGraph, attempts: I) -> Self
    where
        I: IntoIterator<Item = TaskAttempt>,
    {
        let mut experiment = Self::new();
        for attempt in attempts {
            experiment.ingest(graph, attempt);
        }
        experiment
    }

    /// Ingest one attempt. Returns the task the resulting path was added to,
    /// or `None` if the attempt was dropped.
    pub fn ingest(&mut self, graph: &SiteGraph, attempt: TaskAttempt) -> Option<TaskId> {
        let status = attempt.status;
        match status {
            AttemptStatus::Unknown => {
                debug!(user = %attempt.user_id, task = %attempt.alternate_name, "Dropping attempt with unknown status");
                return None;
            }
            AttemptStatus::Skipped if attempt.visits.is_empty() => {
                debug!(user = %attempt.user_id, task = %attempt.alternate_name, "Dropping skipped attempt without visits");
                return None;
            }
            AttemptStatus::Completed if attempt.visits.is_empty() => {
                self.warn(DataWarning::EmptyAttempt {
                    user_id: attempt.user_id,
                    task: attempt.alternate_name,
                });
                return None;
            }
            _ => {}
        }

        let Some(target) = graph.index_of(attempt.target_id) else {
            self.warn(DataWarning::UnknownTarget {
                task: attempt.alternate_name,
                target: attempt.target_id,
            });
            return None;
        };

        let mut steps = Vec::with_capacity(attempt.visits.len());
        for visit in &attempt.visits {
            match graph.index_of(visit.item_id) {
                Some(ix) => steps.push((ix, visit.elapsed_ms)),
                None => {
                    self.warn(DataWarning::UnknownVisit {
                        user_id: attempt.user_id.clone(),
                        item: visit.item_id,
                    });
                    return None;
                }
            }
        }

        let source = graph.root_index();
        let task_ix = match self
            .tasks
            .iter()
            .position(|t| t.alternate_name() == attempt.alternate_name)
        {
            Some(ix) => ix,
            None => {
                let id = TaskId(self.tasks.len());
                self.tasks
                    .push(Task::new(id, source, target, attempt.alternate_name.clone()));
                id.0
            }
        };

        let expected = self.tasks[task_ix].target();
        if expected != target {
            self.warn(DataWarning::TargetMismatch {
                task: attempt.alternate_name,
                expected: graph.node_at(expected).id(),
                found: attempt.target_id,
            });
            return None;
        }

        self.users.insert(attempt.user_id.clone());
        let mut path = Path::new(source, target, attempt.user_id, attempt.duration);
        for (ix, latency) in steps {
            path.push(ix, latency);
        }
        path.set_skipped(status == AttemptStatus::Skipped);
        path.finalize();

        let task = &mut self.tasks[task_ix];
        task.add_path(path);
        Some(task.id())
    }

    fn warn(&mut self, warning: DataWarning) {
        warn!(warning = %warning, "Attempt not imported");
        self.warnings.push(warning);
    }

    /// Tasks in first-seen order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    /// Look up a task.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.0)
    }

    /// Total number of imported paths.
    pub fn path_count(&self) -> usize {
        self.tasks.iter().map(|t| t.paths().len()).sum()
    }

    /// Distinct participants with at least one imported path.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Arena indices of every task target.
    pub fn targets(&self) -> BTreeSet<usize> {
        self.tasks.iter().map(Task::target).collect()
    }

    /// Data-quality warnings raised during ingestion.
    pub fn warnings(&self) -> &[DataWarning] {
        &self.warnings
    }

    /// Mean solution rate over all tasks; 0 without tasks.
    pub fn total_solution_rate(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        self.tasks.iter().map(Task::solution_rate).sum::<f64>() / self.tasks.len() as f64
    }
}
