//! Path analysis engine.
//!
//! A pass runs synchronously to completion over a [`Session`]:
//! - [`TaskAnalyzer`]: optimal-path sets per task
//! - [`SystematicSearchDetector`]: flags and truncates exhaustive probing
//! - [`PathAnalyzer`]: rates each step taken from an optimal-path page
//! - [`ProblemRanker`]: the bad list
//! - [`CoverageRecommender`]: the hot list
//!
//! # Architecture
//!
//! ```text
//! reset → minimal latencies → nodes_to_inspect
//!       → per task: TaskAnalyzer → per path: Detector → PathAnalyzer
//!       → ProblemRanker, CoverageRecommender → AnalysisReport
//! ```
//!
//! All per-page results live in [`AnalysisState`], which a reset wipes
//! without touching the level graph's structural tables.

mod coverage;
mod detection;
mod optimal;
mod path;
mod ranking;
mod session;
mod state;
mod summary;

pub use coverage::{CoverageRecommender, HotListEntry};
pub use detection::{DetectionLog, DetectionRecord, DetectionThresholds, SystematicSearchDetector};
pub use optimal::TaskAnalyzer;
pub use path::{step_rating, PathAnalyzer};
pub use ranking::{BadListEntry, ProblemRanker};
pub use session::Session;
pub use state::{median, AnalysisState, NodeStats, TaskStats};
pub use summary::{AnalysisReport, StructureSummary, TaskBreakdown, TaskSummary};
