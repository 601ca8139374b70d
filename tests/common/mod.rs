//! Shared helpers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use reposcan::core::config::ScanConfig;
use reposcan::registry::{ScanExecutor, ScanStatus};
use reposcan::scanner::error::ScanError;
use reposcan::scanner::git::RepositoryCloner;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Cloner that materialises a fixed file set instead of touching the network
pub struct FixtureCloner {
    pub files: Vec<(String, Vec<u8>)>,
}

impl FixtureCloner {
    pub fn new(files: &[(&str, &[u8])]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(rel, content)| (rel.to_string(), content.to_vec()))
                .collect(),
        }
    }
}

#[async_trait]
impl RepositoryCloner for FixtureCloner {
    async fn clone_repository(&self, _repo_url: &str, dest: &Path) -> Result<(), ScanError> {
        for (rel, content) in &self.files {
            let path = dest.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        Ok(())
    }
}

/// Cloner recording the wall-clock interval of every clone call, with an
/// artificial duration so overlap would be observable if it happened
pub struct RecordingCloner {
    pub intervals: Arc<Mutex<Vec<(Instant, Instant)>>>,
    pub hold: Duration,
}

impl RecordingCloner {
    pub fn new(hold: Duration) -> Self {
        Self {
            intervals: Arc::new(Mutex::new(Vec::new())),
            hold,
        }
    }
}

#[async_trait]
impl RepositoryCloner for RecordingCloner {
    async fn clone_repository(&self, _repo_url: &str, dest: &Path) -> Result<(), ScanError> {
        let started = Instant::now();
        tokio::time::sleep(self.hold).await;
        std::fs::create_dir_all(dest)?;
        std::fs::write(dest.join("app.py"), b"x = 1\n")?;
        self.intervals.lock().unwrap().push((started, Instant::now()));
        Ok(())
    }
}

/// Cloner that never completes; used for timeout behaviour
pub struct StalledCloner;

#[async_trait]
impl RepositoryCloner for StalledCloner {
    async fn clone_repository(&self, _repo_url: &str, _dest: &Path) -> Result<(), ScanError> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

/// Scan configuration with external tools off and a private base path
pub fn test_config(base: &Path) -> ScanConfig {
    ScanConfig {
        base_path: base.to_path_buf(),
        enable_trufflehog: false,
        enable_pip_audit: false,
        enable_safety: false,
        enable_npm_audit: false,
        enable_snyk: false,
        enable_semgrep: false,
        enable_bandit: false,
        ..ScanConfig::default()
    }
}

/// Poll until the scan reaches a terminal state
pub async fn wait_for_terminal(executor: &ScanExecutor, scan_id: &str) -> ScanStatus {
    let deadline = Instant::now() + Duration::from_secs(20);
    loop {
        if let Some(status) = executor.status(scan_id).await {
            if status.is_terminal() {
                return status;
            }
        }
        assert!(
            Instant::now() < deadline,
            "scan '{}' did not finish in time",
            scan_id
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
