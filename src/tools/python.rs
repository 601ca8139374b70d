//! Python dependency scanning (pip-audit, safety)

use crate::core::config::ScanConfig;
use crate::tools::runner::{parse_json_output, run_tool, tool_version};
use crate::tools::DependencyReport;
use serde_json::json;
use std::path::Path;

/// Scan a Python project's dependencies, when one is present
pub async fn scan(repo_path: &Path, config: &ScanConfig) -> DependencyReport {
    let has_python_project = ["requirements.txt", "setup.py", "pyproject.toml"]
        .iter()
        .any(|f| repo_path.join(f).exists());
    if !has_python_project {
        return DependencyReport::not_applicable();
    }

    let mut report = DependencyReport::scanned();
    let timeout = config.timeout();

    if config.enable_pip_audit {
        log::info!("Running pip-audit...");
        match run_tool("pip-audit", &["--desc"], repo_path, timeout).await {
            Ok(output) => {
                if !output.exit_ok && !output.stderr.trim().is_empty() {
                    report
                        .errors
                        .push(format!("pip-audit: {}", output.stderr.trim()));
                }
                if !output.stdout.is_empty() {
                    report
                        .findings
                        .push(json!({"tool": "pip-audit", "output": output.stdout}));
                }
            }
            Err(e) => report.errors.push(e.to_string()),
        }
        report
            .tool_versions
            .insert("pip-audit".to_string(), tool_version("pip-audit").await);
    }

    if config.enable_safety {
        log::info!("Running safety...");
        match run_tool("safety", &["check", "--json"], repo_path, timeout).await {
            Ok(output) => match parse_json_output(&output.stdout) {
                Some(data) => {
                    report
                        .findings
                        .push(json!({"tool": "safety", "vulnerabilities": data}));
                }
                None if !output.stdout.trim().is_empty() => {
                    report.errors.push("safety output not JSON".to_string());
                }
                None => {}
            },
            Err(e) => report.errors.push(e.to_string()),
        }
        report
            .tool_versions
            .insert("safety".to_string(), tool_version("safety").await);
    }

    report
}
