use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

/// Tunables for the analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Share of non-progressing steps in a window above which a path is suspicious (0.0 - 1.0)
    pub max_problem_rate: f64,
    /// Share of revisited pages in a window above which a path is suspicious (0.0 - 1.0)
    pub max_return_rate: f64,
    /// Think time per offered link, in milliseconds
    pub time_to_think_ms: u64,
    /// Fixed detection window; derived from the level graph when unset
    pub nodes_to_inspect: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let analysis = AnalysisConfig {
            max_problem_rate: env::var("MAX_PROBLEM_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_PROBLEM_RATE),
            max_return_rate: env::var("MAX_RETURN_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_RETURN_RATE),
            time_to_think_ms: env::var("TIME_TO_THINK_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIME_TO_THINK_MS),
            nodes_to_inspect: env::var("NODES_TO_INSPECT")
                .ok()
                .and_then(|s| s.parse().ok()),
        };
        analysis.validate()?;

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        Ok(Config { analysis, logging })
    }
}

const DEFAULT_MAX_PROBLEM_RATE: f64 = 0.6;
const DEFAULT_MAX_RETURN_RATE: f64 = 0.15;
const DEFAULT_TIME_TO_THINK_MS: u64 = 100;

impl AnalysisConfig {
    /// Reject thresholds outside [0, 1] and non-positive time values.
    pub fn validate(&self) -> ConfigResult<()> {
        check_rate("max_problem_rate", self.max_problem_rate)?;
        check_rate("max_return_rate", self.max_return_rate)?;
        if self.time_to_think_ms == 0 {
            return Err(ConfigError::NonPositive {
                field: "time_to_think_ms",
            });
        }
        if self.nodes_to_inspect == Some(0) {
            return Err(ConfigError::NonPositive {
                field: "nodes_to_inspect",
            });
        }
        Ok(())
    }

    /// Set the problem-rate threshold.
    pub fn with_max_problem_rate(mut self, rate: f64) -> Self {
        self.max_problem_rate = rate;
        self
    }

    /// Set the return-rate threshold.
    pub fn with_max_return_rate(mut self, rate: f64) -> Self {
        self.max_return_rate = rate;
        self
    }

    /// Set the think time per link.
    pub fn with_time_to_think_ms(mut self, ms: u64) -> Self {
        self.time_to_think_ms = ms;
        self
    }

    /// Pin the detection window instead of deriving it.
    pub fn with_nodes_to_inspect(mut self, nodes: usize) -> Self {
        self.nodes_to_inspect = Some(nodes);
        self
    }
}

fn check_rate(field: &'static str, value: f64) -> ConfigResult<()> {
    // NaN fails the range check as well
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_problem_rate: DEFAULT_MAX_PROBLEM_RATE,
            max_return_rate: DEFAULT_MAX_RETURN_RATE,
            time_to_think_ms: DEFAULT_TIME_TO_THINK_MS,
            nodes_to_inspect: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
