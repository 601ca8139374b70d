//! Repository cloning
//!
//! Shallow, single-branch clones via the `git` binary, behind a trait so
//! the coordinator can be driven with a fake cloner in tests. The
//! per-scan working directory is an RAII guard: it is removed on every
//! exit path, including unwinding.

use crate::scanner::error::ScanError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Clone collaborator used by the coordinator.
///
/// Implementations do not enforce the timeout themselves; the coordinator
/// wraps the call and kills the work on expiry.
#[async_trait]
pub trait RepositoryCloner: Send + Sync {
    async fn clone_repository(&self, repo_url: &str, dest: &Path) -> Result<(), ScanError>;
}

/// Default cloner shelling out to `git clone --depth=1 --single-branch`
pub struct GitCloner;

#[async_trait]
impl RepositoryCloner for GitCloner {
    async fn clone_repository(&self, repo_url: &str, dest: &Path) -> Result<(), ScanError> {
        log::info!("Cloning repository: {}", repo_url);

        let output = tokio::process::Command::new("git")
            .arg("clone")
            .arg("--depth=1")
            .arg("--single-branch")
            .arg("--quiet")
            .arg(repo_url)
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ScanError::clone_failed(format!("cannot run git: {}", e)))?;

        if output.status.success() {
            log::info!("Cloned '{}' into {}", repo_url, dest.display());
            Ok(())
        } else {
            Err(ScanError::clone_failed(summarize_git_output(
                &output.stderr,
                &output.stdout,
            )))
        }
    }
}

/// First non-empty line of git's output, stderr preferred
fn summarize_git_output(stderr: &[u8], stdout: &[u8]) -> String {
    for stream in [stderr, stdout] {
        let text = String::from_utf8_lossy(stream);
        if let Some(line) = text.lines().map(str::trim).find(|l| !l.is_empty()) {
            return line.to_string();
        }
    }
    "git exited with a failure status".to_string()
}

/// Working directory for one scan, removed on drop.
///
/// Creation clears any stale directory left at the same path by an
/// earlier crashed run.
#[derive(Debug)]
pub struct ScanWorkspace {
    path: PathBuf,
}

impl ScanWorkspace {
    pub fn create(base: &Path, repo_name: &str) -> Result<Self, ScanError> {
        std::fs::create_dir_all(base)?;
        let path = base.join(repo_name);
        if path.exists() {
            log::warn!("Removing stale working directory: {}", path.display());
            std::fs::remove_dir_all(&path)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScanWorkspace {
    fn drop(&mut self) {
        if self.path.exists() {
            match std::fs::remove_dir_all(&self.path) {
                Ok(()) => log::debug!("Cleaned up working directory: {}", self.path.display()),
                Err(e) => log::error!(
                    "Failed to clean up working directory '{}': {}",
                    self.path.display(),
                    e
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_workspace_removed_on_drop() {
        let base = TempDir::new().unwrap();
        let workspace = ScanWorkspace::create(base.path(), "myrepo_ab12cd34").unwrap();
        let path = workspace.path().to_path_buf();
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("file.txt"), b"data").unwrap();

        drop(workspace);
        assert!(!path.exists(), "workspace must be removed on drop");
    }

    #[test]
    fn test_workspace_clears_stale_directory() {
        let base = TempDir::new().unwrap();
        let stale = base.path().join("myrepo_ab12cd34");
        std::fs::create_dir_all(stale.join("old")).unwrap();

        let workspace = ScanWorkspace::create(base.path(), "myrepo_ab12cd34").unwrap();
        assert!(!workspace.path().join("old").exists());
    }

    #[test]
    fn test_workspace_removed_during_unwind() {
        let base = TempDir::new().unwrap();
        let path = base.path().join("panicky");

        let result = std::panic::catch_unwind(|| {
            let workspace = ScanWorkspace::create(base.path(), "panicky").unwrap();
            std::fs::create_dir_all(workspace.path()).unwrap();
            panic!("scan blew up");
        });
        assert!(result.is_err());
        assert!(!path.exists(), "cleanup must run during unwinding");
    }

    #[test]
    fn test_git_output_summary_prefers_stderr() {
        let message = summarize_git_output(b"\nfatal: repository not found\n", b"noise");
        assert_eq!(message, "fatal: repository not found");
        assert_eq!(
            summarize_git_output(b"", b""),
            "git exited with a failure status"
        );
    }

    #[tokio::test]
    async fn test_git_cloner_reports_failure_for_bad_source() {
        let base = TempDir::new().unwrap();
        let dest = base.path().join("dest");
        // A local path that is not a repository; git fails fast without
        // touching the network.
        let result = GitCloner
            .clone_repository("/nonexistent/not-a-repo", &dest)
            .await;
        match result {
            Err(ScanError::Clone { message }) => assert!(!message.is_empty()),
            other => panic!("expected Clone error, got {:?}", other),
        }
    }
}
