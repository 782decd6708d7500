//! Command-line interface.
//!
//! Inputs are already-structured JSON documents: a [`SiteStructure`] and an
//! array of [`TaskAttempt`] records.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::analysis::Session;
use crate::config::AnalysisConfig;
use crate::error::{AppResult, IngestError};
use crate::experiment::{TaskAttempt, TaskId};
use crate::graph::{LevelGraph, NodeId, SiteGraph, SiteStructure};
use crate::report;

/// Navigation analysis for tree-testing studies.
#[derive(Parser, Debug)]
#[command(name = "pathsight")]
#[command(version)]
#[command(about = "Analyze participant click paths against a site structure")]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Analysis threshold overrides. Unset flags keep the environment values.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ThresholdArgs {
    /// Problem rate a detection window must exceed (0..=1)
    #[arg(long)]
    pub max_problem_rate: Option<f64>,

    /// Return rate a detection window must exceed (0..=1)
    #[arg(long)]
    pub max_return_rate: Option<f64>,

    /// Think time per offered link in milliseconds
    #[arg(long)]
    pub time_to_think_ms: Option<u64>,

    /// Fixed detection window size instead of the derived one
    #[arg(long)]
    pub nodes_to_inspect: Option<usize>,
}

impl ThresholdArgs {
    /// Apply the overrides to `base` and validate the result.
    pub fn apply(&self, base: &AnalysisConfig) -> AppResult<AnalysisConfig> {
        let mut config = base.clone();
        if let Some(rate) = self.max_problem_rate {
            config.max_problem_rate = rate;
        }
        if let Some(rate) = self.max_return_rate {
            config.max_return_rate = rate;
        }
        if let Some(ms) = self.time_to_think_ms {
            config.time_to_think_ms = ms;
        }
        if let Some(nodes) = self.nodes_to_inspect {
            config.nodes_to_inspect = Some(nodes);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a full analysis pass and print the text report
    Analyze {
        /// Site structure JSON
        #[arg(long)]
        structure: PathBuf,

        /// Task attempts JSON (array)
        #[arg(long)]
        events: PathBuf,

        /// Write the full report as JSON
        #[arg(long)]
        report_json: Option<PathBuf>,

        /// Write the systematic-search detection log
        #[arg(long)]
        detection_log: Option<PathBuf>,

        /// Append the per-page breakdown for this task id
        #[arg(long)]
        breakdown: Option<usize>,

        /// Threshold overrides
        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Print the directed hop distance between two pages
    Distance {
        /// Site structure JSON
        #[arg(long)]
        structure: PathBuf,

        /// Source page id
        #[arg(long)]
        from: u32,

        /// Target page id
        #[arg(long)]
        to: u32,
    },

    /// Print the structure and level-graph summary
    Structure {
        /// Site structure JSON
        #[arg(long)]
        structure: PathBuf,
    },
}

/// Result of CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Execute a CLI command against the environment configuration.
pub fn execute_command(command: Commands, config: &AnalysisConfig) -> CliResult {
    let result = match command {
        Commands::Analyze {
            structure,
            events,
            report_json,
            detection_log,
            breakdown,
            thresholds,
        } => execute_analyze(
            &structure,
            &events,
            report_json.as_deref(),
            detection_log.as_deref(),
            breakdown,
            &thresholds,
            config,
        ),
        Commands::Distance {
            structure,
            from,
            to,
        } => execute_distance(&structure, from, to),
        Commands::Structure { structure } => execute_structure(&structure),
    };

    match result {
        Ok(message) => CliResult::success(message),
        Err(e) => CliResult::error(format!("Error: {}", e)),
    }
}

fn execute_analyze(
    structure: &Path,
    events: &Path,
    report_json: Option<&Path>,
    detection_log: Option<&Path>,
    breakdown: Option<usize>,
    thresholds: &ThresholdArgs,
    config: &AnalysisConfig,
) -> AppResult<String> {
    let config = thresholds.apply(config)?;
    let site = load_structure(structure)?;
    let attempts = load_attempts(events)?;

    let mut session = Session::new(&site, config)?;
    let imported = session.ingest_all(attempts);
    info!(imported, "Attempts imported");

    let report = session.analyze();

    if let Some(path) = report_json {
        report::write_json(&report, path)?;
        info!(path = %path.display(), "Report written");
    }
    if let Some(path) = detection_log {
        session.detections().write_to(path)?;
        info!(path = %path.display(), "Detection log written");
    }

    let mut output = report::render_report(&report);
    if let Some(task) = breakdown {
        output.push_str(&report::render_task_breakdown(&session, TaskId(task)));
    }
    Ok(output)
}

fn execute_distance(structure: &Path, from: u32, to: u32) -> AppResult<String> {
    let graph = SiteGraph::build(&load_structure(structure)?)?;
    let distance = graph.distance(NodeId(from), NodeId(to));
    Ok(format!("{} -> {}: {}\n", from, to, distance))
}

fn execute_structure(structure: &Path) -> AppResult<String> {
    let graph = SiteGraph::build(&load_structure(structure)?)?;
    let level = LevelGraph::derive(&graph)?;
    let summary = crate::analysis::StructureSummary::new(&graph, &level);
    Ok(report::render_structure(&summary))
}

/// Load a site structure document.
pub fn load_structure(path: &Path) -> Result<SiteStructure, IngestError> {
    load_json(path)
}

/// Load an array of task attempts.
pub fn load_attempts(path: &Path) -> Result<Vec<TaskAttempt>, IngestError> {
    load_json(path)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| IngestError::Json {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ConfigError};

    #[test]
    fn test_cli_parses_analyze_with_overrides() {
        let cli = Cli::try_parse_from([
            "pathsight",
            "analyze",
            "--structure",
            "site.json",
            "--events",
            "events.json",
            "--max-problem-rate",
            "0.4",
            "--nodes-to-inspect",
            "5",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze {
                structure,
                thresholds,
                report_json,
                ..
            } => {
                assert_eq!(structure, PathBuf::from("site.json"));
                assert_eq!(thresholds.max_problem_rate, Some(0.4));
                assert_eq!(thresholds.nodes_to_inspect, Some(5));
                assert!(report_json.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_distance() {
        let cli = Cli::try_parse_from([
            "pathsight", "distance", "--structure", "s.json", "--from", "3", "--to", "0",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Distance { from: 3, to: 0, .. }));
    }

    #[test]
    fn test_threshold_overrides_are_validated() {
        let base = AnalysisConfig::default();

        let args = ThresholdArgs {
            max_return_rate: Some(0.3),
            ..Default::default()
        };
        let config = args.apply(&base).unwrap();
        assert_eq!(config.max_return_rate, 0.3);
        assert_eq!(config.max_problem_rate, base.max_problem_rate);

        let args = ThresholdArgs {
            time_to_think_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            args.apply(&base),
            Err(AppError::Config(ConfigError::NonPositive { .. }))
        ));
    }

    #[test]
    fn test_missing_file_is_an_ingest_error() {
        let err = load_structure(Path::new("/nonexistent/site.json")).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
