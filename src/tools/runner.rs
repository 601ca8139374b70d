//! External tool invocation
//!
//! One uniform contract for every third-party scanner: run with a hard
//! timeout and the repository as working directory, capture output, and
//! fold every failure mode (missing binary, timeout, non-zero exit,
//! unparsable output) into a soft, recordable outcome.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

/// Captured output of a completed tool run
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_ok: bool,
}

/// Soft failure of a tool run; never fatal to the scan
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0} not installed")]
    NotInstalled(String),
    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },
    #[error("{tool} failed to run: {message}")]
    Spawn { tool: String, message: String },
}

/// Run a tool to completion under a timeout.
///
/// A non-zero exit is not an error here: several scanners (npm audit,
/// semgrep) exit non-zero exactly when they found something. Callers
/// inspect `exit_ok` and stderr as needed.
pub async fn run_tool(
    tool: &str,
    args: &[&str],
    cwd: &Path,
    timeout: Duration,
) -> Result<ToolOutput, ToolError> {
    let future = tokio::process::Command::new(tool)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, future).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ToolError::NotInstalled(tool.to_string()));
        }
        Ok(Err(e)) => {
            return Err(ToolError::Spawn {
                tool: tool.to_string(),
                message: e.to_string(),
            });
        }
        Err(_) => {
            return Err(ToolError::Timeout {
                tool: tool.to_string(),
                seconds: timeout.as_secs(),
            });
        }
    };

    Ok(ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_ok: output.status.success(),
    })
}

/// Parse a tool's stdout as one JSON document
pub fn parse_json_output(stdout: &str) -> Option<serde_json::Value> {
    serde_json::from_str(stdout.trim()).ok()
}

/// Probe a tool's version, with npx and `python -m` fallbacks for tools
/// that are commonly installed through those runners.
pub async fn tool_version(tool: &str) -> String {
    let probe_timeout = Duration::from_secs(5);
    let cwd = std::env::temp_dir();

    if let Ok(output) = run_tool(tool, &["--version"], &cwd, probe_timeout).await {
        if output.exit_ok {
            if let Some(line) = output.stdout.lines().next() {
                return line.trim().to_string();
            }
        }
    }

    if let Ok(output) = run_tool(
        "npx",
        &["--yes", tool, "--version"],
        &cwd,
        Duration::from_secs(10),
    )
    .await
    {
        if output.exit_ok {
            if let Some(line) = output.stdout.lines().next() {
                return line.trim().to_string();
            }
        }
    }

    if let Ok(output) = run_tool("python", &["-m", tool, "--version"], &cwd, probe_timeout).await {
        if output.exit_ok {
            if let Some(line) = output.stdout.lines().next() {
                return line.trim().to_string();
            }
        }
    }

    "not installed".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_soft_not_installed() {
        let result = run_tool(
            "reposcan-no-such-tool-xyz",
            &["--version"],
            &std::env::temp_dir(),
            Duration::from_secs(5),
        )
        .await;
        match result {
            Err(ToolError::NotInstalled(tool)) => {
                assert_eq!(tool, "reposcan-no-such-tool-xyz")
            }
            other => panic!("expected NotInstalled, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_and_reports() {
        let result = run_tool(
            "sleep",
            &["5"],
            &std::env::temp_dir(),
            Duration::from_millis(200),
        )
        .await;
        match result {
            Err(ToolError::Timeout { tool, .. }) => assert_eq!(tool, "sleep"),
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_captures_stdout_of_successful_run() {
        let output = run_tool(
            "echo",
            &["{\"ok\":true}"],
            &std::env::temp_dir(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert!(output.exit_ok);
        let parsed = parse_json_output(&output.stdout).unwrap();
        assert_eq!(parsed["ok"], true);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let output = run_tool(
            "sh",
            &["-c", "echo findings; exit 3"],
            &std::env::temp_dir(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert!(!output.exit_ok);
        assert!(output.stdout.contains("findings"));
    }

    #[test]
    fn test_json_parse_rejects_garbage() {
        assert!(parse_json_output("not json at all").is_none());
        assert!(parse_json_output("{\"a\": 1}").is_some());
    }

    #[tokio::test]
    async fn test_version_probe_falls_back_to_not_installed() {
        let version = tool_version("reposcan-no-such-tool-xyz").await;
        assert_eq!(version, "not installed");
    }
}
