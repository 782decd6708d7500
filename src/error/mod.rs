use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::graph::NodeId;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Structural invariant violations. These indicate a construction bug or
/// corrupt structure data and abort the pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate node id: {id}")]
    DuplicateNode { id: NodeId },

    #[error("Unknown node id referenced by structure entry: {id}")]
    UnknownNode { id: NodeId },

    #[error("Level graph edge {parent} -> {node} does not increase depth by exactly one")]
    LevelInvariant { node: NodeId, parent: NodeId },
}

/// Configuration faults, rejected before any pass starts.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("{field} must be positive")]
    NonPositive { field: &'static str },
}

/// Errors while loading already-structured input documents.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors while writing reports.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Data-quality faults. These never abort a pass: the offending input is
/// skipped or degrades to an empty result, and the warning is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    /// An attempt names a target page that is not in the graph
    UnknownTarget { task: String, target: NodeId },

    /// An attempt visits a page that is not in the graph
    UnknownVisit { user_id: String, item: NodeId },

    /// A completed attempt without any recorded visit
    EmptyAttempt { user_id: String, task: String },

    /// An attempt reuses a task name with a different target page
    TargetMismatch {
        task: String,
        expected: NodeId,
        found: NodeId,
    },

    /// The task target cannot be reached from the task source
    UnreachableTarget { task: String, target: NodeId },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::UnknownTarget { task, target } => {
                write!(f, "Task '{}' targets unknown page {}", task, target)
            }
            DataWarning::UnknownVisit { user_id, item } => {
                write!(f, "User {} visited unknown page {}", user_id, item)
            }
            DataWarning::EmptyAttempt { user_id, task } => {
                write!(f, "User {} completed task '{}' without visits", user_id, task)
            }
            DataWarning::TargetMismatch {
                task,
                expected,
                found,
            } => write!(
                f,
                "Task '{}' targets page {} but an attempt targets page {}",
                task, expected, found
            ),
            DataWarning::UnreachableTarget { task, target } => {
                write!(f, "Target page {} of task '{}' is unreachable", target, task)
            }
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for graph construction
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for configuration validation
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for report export
pub type ExportResult<T> = Result<T, ExportError>;
