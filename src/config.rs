//! Suite configuration
//!
//! Loads benchmark cases and logging settings from a JSON file.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Root of a suite file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuiteConfig {
    #[serde(default)]
    pub log: LogConfig,
    pub cases: Vec<CaseConfig>,
}

/// One named benchmark case
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaseConfig {
    #[serde(deserialize_with = "validate_name")]
    pub name: String,
    pub mode: Mode,
    /// Kept signed so a negative count reaches the harness and is rejected there.
    pub runs: i64,
    pub workload: Workload,
}

/// Execution model used for a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Sequential,
    Capture,
    Concurrent,
    ConcurrentAsync,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Sequential => "sequential",
            Mode::Capture => "capture",
            Mode::Concurrent => "concurrent",
            Mode::ConcurrentAsync => "concurrent-async",
        };
        f.write_str(name)
    }
}

/// Built-in unit of work
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Workload {
    Spin {
        #[serde(deserialize_with = "validate_positive_u64")]
        iterations: u64,
    },
    Sleep {
        micros: u64,
    },
    Allocate {
        #[serde(deserialize_with = "validate_positive_usize")]
        bytes: usize,
    },
    Counter,
}

/// Logger settings handed to `init_logging`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::Plain,
        }
    }
}

fn validate_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.trim().is_empty() {
        Err(serde::de::Error::custom("Case name must not be empty"))
    } else {
        Ok(value)
    }
}

fn validate_positive_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = u64::deserialize(deserializer)?;
    if value > 0 {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("Value must be positive"))
    }
}

fn validate_positive_usize<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = usize::deserialize(deserializer)?;
    if value > 0 {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("Value must be positive"))
    }
}

// ============================================================================
// LOADING
// ============================================================================

impl SuiteConfig {
    /// Parse a suite from JSON text.
    pub fn from_json(content: &str) -> Result<Self, BenchError> {
        let config: Self = serde_json::from_str(content)?;
        if config.cases.is_empty() {
            return Err(BenchError::InvalidConfig("suite has no cases".to_string()));
        }
        Ok(config)
    }

    /// Load a suite file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BenchError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Replace the repetition count of every case.
    pub fn override_runs(&mut self, runs: i64) {
        for case in &mut self.cases {
            case.runs = runs;
        }
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            cases: vec![
                CaseConfig {
                    name: "spin-10k".to_string(),
                    mode: Mode::Sequential,
                    runs: 1_000,
                    workload: Workload::Spin { iterations: 10_000 },
                },
                CaseConfig {
                    name: "counter".to_string(),
                    mode: Mode::Capture,
                    runs: 100_000,
                    workload: Workload::Counter,
                },
                CaseConfig {
                    name: "alloc-4k".to_string(),
                    mode: Mode::Concurrent,
                    runs: 64,
                    workload: Workload::Allocate { bytes: 4_096 },
                },
                CaseConfig {
                    name: "sleep-1ms".to_string(),
                    mode: Mode::ConcurrentAsync,
                    runs: 256,
                    workload: Workload::Sleep { micros: 1_000 },
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_suite() {
        let config = SuiteConfig::from_json(
            r#"{
                "log": { "level": "debug", "format": "json" },
                "cases": [
                    { "name": "spin", "mode": "sequential", "runs": 10,
                      "workload": { "kind": "spin", "iterations": 100 } },
                    { "name": "async", "mode": "concurrent-async", "runs": 4,
                      "workload": { "kind": "sleep", "micros": 0 } },
                    { "name": "count", "mode": "capture", "runs": -1,
                      "workload": { "kind": "counter" } }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.cases.len(), 3);
        assert_eq!(config.cases[1].mode, Mode::ConcurrentAsync);
        assert_eq!(config.cases[2].runs, -1);
        assert_eq!(config.cases[2].workload, Workload::Counter);
    }

    #[test]
    fn log_section_is_optional() {
        let config = SuiteConfig::from_json(
            r#"{ "cases": [ { "name": "a", "mode": "concurrent", "runs": 1,
                 "workload": { "kind": "allocate", "bytes": 8 } } ] }"#,
        )
        .unwrap();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Plain);
    }

    #[test]
    fn rejects_invalid_workloads() {
        let zero_spin = r#"{ "cases": [ { "name": "a", "mode": "sequential", "runs": 1,
            "workload": { "kind": "spin", "iterations": 0 } } ] }"#;
        assert!(matches!(
            SuiteConfig::from_json(zero_spin),
            Err(BenchError::Config(_))
        ));

        let blank_name = r#"{ "cases": [ { "name": "  ", "mode": "sequential", "runs": 1,
            "workload": { "kind": "counter" } } ] }"#;
        assert!(SuiteConfig::from_json(blank_name).is_err());
    }

    #[test]
    fn rejects_empty_suite() {
        assert!(matches!(
            SuiteConfig::from_json(r#"{ "cases": [] }"#),
            Err(BenchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn override_runs_applies_to_every_case() {
        let mut config = SuiteConfig::default();
        config.override_runs(3);
        assert!(config.cases.iter().all(|c| c.runs == 3));
    }

    #[test]
    fn mode_display_matches_serde_names() {
        for mode in [Mode::Sequential, Mode::Capture, Mode::Concurrent, Mode::ConcurrentAsync] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json.trim_matches('"'), mode.to_string());
        }
    }
}
