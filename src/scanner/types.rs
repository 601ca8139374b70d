//! Scanner result types
//!
//! The data model shared by the pipeline stages and embedded into the
//! final scan report. `ScanResult` is built once at the end of a
//! coordinator run and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cap applied to `matched_value` when a finding is serialized
const MATCHED_VALUE_OUTPUT_CAP: usize = 20;

/// Severity of a finding, derived from the secret-type label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
}

/// One detected candidate secret occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Path relative to the repository root, `/`-separated
    pub file_path: String,
    /// 1-based; serialized as 0 when line numbers are disabled for the scan
    pub line_number: usize,
    pub secret_type: String,
    pub severity: Severity,
    /// Display-safe context line (masked unless redaction is off)
    pub context: String,
    /// Byte span of the secret within the line, half-open
    pub start: usize,
    pub end: usize,
    /// Edge-preserving masked value; hard-truncated on serialization
    #[serde(serialize_with = "serialize_capped")]
    pub matched_value: String,
    /// Provenance: "pattern" for the built-in library, else the tool name
    pub provider: String,
}

fn serialize_capped<S>(value: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if value.chars().count() > MATCHED_VALUE_OUTPUT_CAP {
        let truncated: String = value.chars().take(MATCHED_VALUE_OUTPUT_CAP).collect();
        serializer.serialize_str(&format!("{}...", truncated))
    } else {
        serializer.serialize_str(value)
    }
}

/// Terminal status of a whole scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Completed,
    Failed,
    Error,
}

/// Repository statistics computed by the summary pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_size_kb: f64,
    pub file_count: u64,
    pub directory_count: u64,
    pub by_extension: BTreeMap<String, u64>,
    pub by_language: BTreeMap<String, u64>,
    pub sensitive_files: Vec<String>,
}

/// Report from one complete repository scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub repo_name: String,
    pub repo_url: String,
    pub status: ResultStatus,
    pub secrets: Vec<Finding>,
    /// Per-ecosystem external tool output, opaque to the core
    pub dependencies: BTreeMap<String, serde_json::Value>,
    pub summary: ScanSummary,
    pub errors: Vec<String>,
    /// Wall-clock seconds
    pub scan_duration: f64,
}

impl ScanResult {
    /// Empty report carrying only a fatal error, used for the early-exit paths
    pub fn failed(repo_name: &str, repo_url: &str, error: String, duration: f64) -> Self {
        Self {
            repo_name: repo_name.to_string(),
            repo_url: repo_url.to_string(),
            status: ResultStatus::Failed,
            secrets: Vec::new(),
            dependencies: BTreeMap::new(),
            summary: ScanSummary::default(),
            errors: vec![error],
            scan_duration: duration,
        }
    }

    /// Report for a fault the pipeline did not anticipate
    pub fn unexpected(repo_name: &str, repo_url: &str, error: String, duration: f64) -> Self {
        Self {
            status: ResultStatus::Error,
            ..Self::failed(repo_name, repo_url, error, duration)
        }
    }
}
