//! External scanner collaborators
//!
//! Dependency and code-quality tools invoked as subprocesses against the
//! cloned tree. Every tool failure is soft: recorded in the report's
//! error list or the per-ecosystem result, never fatal to the scan.

pub mod node;
pub mod python;
pub mod quality;
pub mod runner;
pub mod trufflehog;

use crate::core::config::ScanConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Result of one ecosystem's tool runs, opaque to the scan core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyReport {
    /// Whether the ecosystem applies to this repository at all
    pub applicable: bool,
    /// "scanned" or "not_applicable"
    pub status: String,
    pub findings: Vec<serde_json::Value>,
    pub errors: Vec<String>,
    pub tool_versions: BTreeMap<String, String>,
}

impl DependencyReport {
    pub fn not_applicable() -> Self {
        Self {
            applicable: false,
            status: "not_applicable".to_string(),
            findings: Vec::new(),
            errors: Vec::new(),
            tool_versions: BTreeMap::new(),
        }
    }

    pub fn scanned() -> Self {
        Self {
            applicable: true,
            status: "scanned".to_string(),
            ..Self::not_applicable()
        }
    }
}

/// Run every enabled ecosystem scanner and collect their reports.
///
/// Per-tool errors end up inside each report; errors that should surface
/// on the scan itself are appended to `scan_errors`.
pub async fn scan_dependencies(
    repo_path: &Path,
    config: &ScanConfig,
    scan_errors: &mut Vec<String>,
) -> BTreeMap<String, serde_json::Value> {
    let mut results = BTreeMap::new();

    let python_report = python::scan(repo_path, config).await;
    let node_report = node::scan(repo_path, config).await;
    let quality_report = quality::scan(repo_path, config).await;

    for report in [&python_report, &node_report, &quality_report] {
        for error in &report.errors {
            log::warn!("Dependency tool issue: {}", error);
        }
    }
    scan_errors.extend(
        [&python_report, &node_report, &quality_report]
            .iter()
            .flat_map(|r| r.errors.iter().cloned()),
    );

    results.insert("python".to_string(), to_value(python_report));
    results.insert("node".to_string(), to_value(node_report));
    results.insert("code_quality".to_string(), to_value(quality_report));
    results
}

fn to_value(report: DependencyReport) -> serde_json::Value {
    serde_json::to_value(report).unwrap_or(serde_json::Value::Null)
}
