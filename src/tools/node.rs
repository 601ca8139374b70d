//! Node.js dependency scanning (npm audit, snyk)
//!
//! npm audit needs a lockfile; when the repository ships none and
//! `generate_lockfile` is set, one is generated in a scratch directory so
//! the checked-out tree is never modified.

use crate::core::config::ScanConfig;
use crate::tools::runner::{parse_json_output, run_tool, tool_version};
use crate::tools::DependencyReport;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Scan a Node.js project's dependencies, when one is present
pub async fn scan(repo_path: &Path, config: &ScanConfig) -> DependencyReport {
    if !repo_path.join("package.json").exists() {
        return DependencyReport::not_applicable();
    }

    let mut report = DependencyReport::scanned();
    let timeout = config.timeout();

    if config.enable_npm_audit {
        log::info!("Running npm audit...");
        let mut performed_audit = false;

        match run_tool("npm", &["audit", "--json"], repo_path, timeout).await {
            Ok(output) => {
                if !output.exit_ok && !output.stderr.trim().is_empty() {
                    report
                        .errors
                        .push(format!("npm audit: {}", output.stderr.trim()));
                }
                if let Some(data) = parse_json_output(&output.stdout) {
                    report.findings.push(json!({
                        "tool": "npm-audit",
                        "vulnerabilities": data.get("vulnerabilities").cloned().unwrap_or(json!({})),
                        "metadata": data.get("metadata").cloned().unwrap_or(json!({})),
                    }));
                    performed_audit = true;
                }
            }
            Err(e) => report.errors.push(e.to_string()),
        }

        if !performed_audit && config.generate_lockfile {
            match audit_with_generated_lockfile(repo_path, config).await {
                Ok(Some(finding)) => report.findings.push(finding),
                Ok(None) => {}
                Err(message) => report.errors.push(message),
            }
        }

        report
            .tool_versions
            .insert("npm".to_string(), tool_version("npm").await);
    }

    if config.enable_snyk {
        log::info!("Running snyk...");
        match run_tool("snyk", &["test", "--json"], repo_path, timeout).await {
            Ok(output) => match parse_json_output(&output.stdout) {
                Some(data) => {
                    report.findings.push(json!({
                        "tool": "snyk",
                        "vulnerabilities": data.get("vulnerabilities").cloned().unwrap_or(json!([])),
                    }));
                }
                None if !output.stdout.trim().is_empty() => {
                    report
                        .findings
                        .push(json!({"tool": "snyk", "output": output.stdout}));
                }
                None => {}
            },
            Err(e) => report.errors.push(e.to_string()),
        }
        report
            .tool_versions
            .insert("snyk".to_string(), tool_version("snyk").await);
    }

    report
}

/// Copy the manifest into a scratch directory, generate a lockfile there
/// and audit that instead.
async fn audit_with_generated_lockfile(
    repo_path: &Path,
    config: &ScanConfig,
) -> Result<Option<serde_json::Value>, String> {
    let scratch = ScratchDir::create("npm-audit")?;
    let timeout = config.timeout();

    tokio::fs::copy(
        repo_path.join("package.json"),
        scratch.path().join("package.json"),
    )
    .await
    .map_err(|e| format!("npm fallback failed: {}", e))?;
    if repo_path.join("package-lock.json").exists() {
        let _ = tokio::fs::copy(
            repo_path.join("package-lock.json"),
            scratch.path().join("package-lock.json"),
        )
        .await;
    }

    let gen = run_tool(
        "npm",
        &["install", "--package-lock-only"],
        scratch.path(),
        timeout,
    )
    .await
    .map_err(|e| e.to_string())?;
    if !gen.exit_ok {
        if !gen.stderr.trim().is_empty() {
            return Err(format!("npm lockfile gen: {}", gen.stderr.trim()));
        }
        return Ok(None);
    }

    let audit = run_tool("npm", &["audit", "--json"], scratch.path(), timeout)
        .await
        .map_err(|e| e.to_string())?;
    Ok(parse_json_output(&audit.stdout).map(|data| {
        json!({
            "tool": "npm-audit",
            "vulnerabilities": data.get("vulnerabilities").cloned().unwrap_or(json!({})),
            "metadata": data.get("metadata").cloned().unwrap_or(json!({})),
        })
    }))
}

/// Scratch directory under the system temp dir, removed on drop
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn create(prefix: &str) -> Result<Self, String> {
        let path = std::env::temp_dir().join(format!(
            "reposcan-{}-{}-{}",
            prefix,
            std::process::id(),
            chrono::Utc::now().timestamp_micros()
        ));
        std::fs::create_dir_all(&path).map_err(|e| format!("scratch dir: {}", e))?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
