//! Code quality scanning (semgrep, bandit)

use crate::core::config::ScanConfig;
use crate::tools::runner::{parse_json_output, run_tool, tool_version};
use crate::tools::DependencyReport;
use serde_json::json;
use std::path::Path;

/// Stored findings per tool are capped to keep result payloads bounded
const MAX_STORED_FINDINGS: usize = 10;

fn has_files_with_extensions(repo_path: &Path, exts: &[&str]) -> bool {
    fn walk(dir: &Path, exts: &[&str]) -> bool {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return false,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if path.is_dir() {
                if name.starts_with('.')
                    || matches!(
                        name.as_str(),
                        "node_modules" | "__pycache__" | "dist" | "build" | "target" | "vendor"
                    )
                {
                    continue;
                }
                if walk(&path, exts) {
                    return true;
                }
            } else if let Some((_, ext)) = name.rsplit_once('.') {
                if exts.contains(&ext.to_lowercase().as_str()) {
                    return true;
                }
            }
        }
        false
    }
    walk(repo_path, exts)
}

/// Run the code-quality tools when Python or JS/TS sources are present
pub async fn scan(repo_path: &Path, config: &ScanConfig) -> DependencyReport {
    let has_python = has_files_with_extensions(repo_path, &["py"]);
    let has_javascript = has_files_with_extensions(repo_path, &["js", "ts", "jsx", "tsx"]);
    if !has_python && !has_javascript {
        return DependencyReport::not_applicable();
    }

    let mut report = DependencyReport::scanned();
    let timeout = config.timeout();

    if config.enable_semgrep {
        log::info!("Running semgrep...");
        match run_tool("semgrep", &["--json", "--quiet", "."], repo_path, timeout).await {
            Ok(output) => {
                match parse_json_output(&output.stdout) {
                    Some(data) => {
                        let results = data
                            .get("results")
                            .and_then(|r| r.as_array())
                            .cloned()
                            .unwrap_or_default();
                        if !results.is_empty() {
                            let count = results.len();
                            let capped: Vec<_> =
                                results.into_iter().take(MAX_STORED_FINDINGS).collect();
                            report.findings.push(json!({
                                "tool": "semgrep",
                                "count": count,
                                "results": capped,
                            }));
                        }
                    }
                    None if !output.stdout.trim().is_empty() => {
                        report.errors.push("semgrep output not JSON".to_string());
                    }
                    None => {}
                }
                if !output.exit_ok && !output.stderr.trim().is_empty() {
                    report
                        .errors
                        .push(format!("semgrep: {}", output.stderr.trim()));
                }
            }
            Err(e) => report.errors.push(e.to_string()),
        }
        report
            .tool_versions
            .insert("semgrep".to_string(), tool_version("semgrep").await);
    }

    if config.enable_bandit && has_python {
        log::info!("Running bandit...");
        match run_tool("bandit", &["-r", ".", "-f", "json"], repo_path, timeout).await {
            Ok(output) => {
                if let Some(data) = parse_json_output(&output.stdout) {
                    let results = data
                        .get("results")
                        .and_then(|r| r.as_array())
                        .cloned()
                        .unwrap_or_default();
                    if !results.is_empty() {
                        let count = results.len();
                        let capped: Vec<_> =
                            results.into_iter().take(MAX_STORED_FINDINGS).collect();
                        report.findings.push(json!({
                            "tool": "bandit",
                            "count": count,
                            "results": capped,
                        }));
                    }
                }
                if !output.exit_ok && !output.stderr.trim().is_empty() {
                    report
                        .errors
                        .push(format!("bandit: {}", output.stderr.trim()));
                }
            }
            Err(e) => report.errors.push(e.to_string()),
        }
        report
            .tool_versions
            .insert("bandit".to_string(), tool_version("bandit").await);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_tools_config() -> ScanConfig {
        ScanConfig {
            enable_semgrep: false,
            enable_bandit: false,
            ..ScanConfig::default()
        }
    }

    #[tokio::test]
    async fn test_not_applicable_without_sources() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("README.md"), "# hi\n").unwrap();
        let report = scan(dir.path(), &no_tools_config()).await;
        assert!(!report.applicable);
    }

    #[tokio::test]
    async fn test_applicable_with_python_sources() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/app.py"), "x = 1\n").unwrap();
        let report = scan(dir.path(), &no_tools_config()).await;
        assert!(report.applicable);
    }

    #[test]
    fn test_extension_walk_skips_vendored_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/x")).unwrap();
        std::fs::write(dir.path().join("node_modules/x/index.js"), "x\n").unwrap();
        assert!(!has_files_with_extensions(dir.path(), &["js"]));
    }
}
