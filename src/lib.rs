//! # Pathsight
//!
//! Navigation analysis for tree-testing studies. Given a site's page
//! structure and the click paths participants recorded while looking for
//! assigned target pages, Pathsight finds where navigation goes wrong and
//! which pages future tasks should target.
//!
//! ## Features
//!
//! - **Level Graph**: BFS layering of the raw, possibly cyclic structure into an acyclic shortest-path view
//! - **Distance Index**: all-pairs directed hop counts over the raw structure
//! - **Optimal Paths**: every page on some shortest path to a task target
//! - **Step Scoring**: per-page distance ratings and latency weights
//! - **Systematic-Search Detection**: sliding-window detection of fast, repetitive probing
//! - **Bad List**: pages ranked by degree-weighted problem score
//! - **Hot List**: greedy recommendation of targets that raise test coverage
//!
//! ## Architecture
//!
//! ```text
//! SiteStructure → SiteGraph → LevelGraph ─┐
//!                     ↓                   ├→ Session::analyze → AnalysisReport
//! TaskAttempts → Experiment (Tasks/Paths) ┘
//! ```
//!
//! ## Example
//!
//! ```
//! use pathsight::{AnalysisConfig, Session, SiteStructure};
//! use pathsight::experiment::{AttemptStatus, TaskAttempt};
//!
//! let structure = SiteStructure::new(0, "Home")
//!     .page(1, "Support", 0)
//!     .page(2, "Warranty", 1);
//! let mut session = Session::new(&structure, AnalysisConfig::default())?;
//! session.ingest(
//!     TaskAttempt::new("p1", "Find the warranty terms", 2, AttemptStatus::Completed)
//!         .visit(0, 2400)
//!         .visit(1, 1800)
//!         .visit(2, 0),
//! );
//!
//! let report = session.analyze();
//! assert_eq!(report.total_solution_rate, 1.0);
//! # Ok::<(), pathsight::AppError>(())
//! ```

#![warn(missing_docs)]

/// Per-page scoring, detection and rankings.
pub mod analysis;
/// Command-line interface.
pub mod cli;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Tasks, participant paths and event ingestion.
pub mod experiment;
/// Site structure graph, distance index and level graph.
pub mod graph;
/// Text renderings and report export.
pub mod report;

pub use analysis::{AnalysisReport, Session};
pub use config::{AnalysisConfig, Config};
pub use error::{AppError, AppResult};
pub use graph::{Distance, NodeId, SiteGraph, SiteStructure};
