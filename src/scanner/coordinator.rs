//! Scan Coordinator
//!
//! Drives one repository scan through its lifecycle:
//! Validating → Cloning → ScanningSecrets → ScanningDependencies →
//! Summarizing → Completed, with Failed reachable from the first two
//! phases and Error reserved for faults nothing else anticipated.
//! Recoverable conditions become entries in the result's error list;
//! the working directory is released on every exit path.

use crate::core::config::ScanConfig;
use crate::core::validation::validate_repo_url;
use crate::patterns::classify::FileClassifier;
use crate::scanner::dedupe::dedupe_findings;
use crate::scanner::git::{GitCloner, RepositoryCloner, ScanWorkspace};
use crate::scanner::line_scan::scan_candidates;
use crate::scanner::summary::{directory_size, summarize_repository};
use crate::scanner::types::{Finding, ResultStatus, ScanResult, ScanSummary};
use crate::tools;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;

/// Lifecycle phase of a single scan, strictly ordered and non-branching
/// except at failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ScanPhase {
    Validating,
    Cloning,
    ScanningSecrets,
    ScanningDependencies,
    Summarizing,
    Completed,
    Failed,
    Error,
}

/// Orchestrator for one repository scan
pub struct ScanCoordinator {
    config: ScanConfig,
    cloner: Arc<dyn RepositoryCloner>,
}

impl ScanCoordinator {
    pub fn new(config: ScanConfig) -> Self {
        Self::with_cloner(config, Arc::new(GitCloner))
    }

    /// Construct with an injected cloner; tests use this to simulate slow
    /// or failing clones without a network.
    pub fn with_cloner(config: ScanConfig, cloner: Arc<dyn RepositoryCloner>) -> Self {
        Self { config, cloner }
    }

    /// Run the scan to completion. Never returns an `Err`: every outcome,
    /// fatal or not, is expressed in the returned report.
    pub async fn run(&self, repo_url: &str) -> ScanResult {
        let started = Instant::now();
        let repo_name = sanitize_repo_name(repo_url);
        log::info!("Starting scan for repository: {}", repo_url);

        let mut phase = ScanPhase::Validating;
        log::debug!("{}: entering phase {}", repo_name, phase);
        if let Err(message) = validate_repo_url(repo_url).await {
            log::warn!("Validation rejected '{}': {}", repo_url, message);
            return ScanResult::failed(&repo_name, repo_url, message, seconds_since(started));
        }

        phase = ScanPhase::Cloning;
        log::debug!("{}: entering phase {}", repo_name, phase);
        let workspace = match ScanWorkspace::create(&self.config.base_path, &repo_name) {
            Ok(workspace) => workspace,
            Err(e) => {
                return ScanResult::failed(
                    &repo_name,
                    repo_url,
                    format!("cannot prepare working directory: {}", e),
                    seconds_since(started),
                );
            }
        };

        let clone_result = tokio::time::timeout(
            self.config.timeout(),
            self.cloner.clone_repository(repo_url, workspace.path()),
        )
        .await;
        match clone_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return ScanResult::failed(
                    &repo_name,
                    repo_url,
                    format!("Clone failed: {}", e),
                    seconds_since(started),
                );
            }
            Err(_) => {
                return ScanResult::failed(
                    &repo_name,
                    repo_url,
                    format!("Clone timeout after {}s", self.config.default_timeout),
                    seconds_since(started),
                );
            }
        }

        // Oversize clones are fatal before any content is scanned
        let repo_path = workspace.path().to_path_buf();
        let size_path = repo_path.clone();
        let on_disk = tokio::task::spawn_blocking(move || directory_size(&size_path))
            .await
            .unwrap_or(u64::MAX);
        if on_disk > self.config.max_repo_size {
            return ScanResult::failed(
                &repo_name,
                repo_url,
                format!(
                    "repository size {} bytes exceeds max_repo_size {}",
                    on_disk, self.config.max_repo_size
                ),
                seconds_since(started),
            );
        }

        let mut errors: Vec<String> = Vec::new();

        phase = ScanPhase::ScanningSecrets;
        log::debug!("{}: entering phase {}", repo_name, phase);
        let secrets = self.scan_secrets(&repo_path, &mut errors).await;

        phase = ScanPhase::ScanningDependencies;
        log::debug!("{}: entering phase {}", repo_name, phase);
        let dependencies = tools::scan_dependencies(&repo_path, &self.config, &mut errors).await;

        phase = ScanPhase::Summarizing;
        log::debug!("{}: entering phase {}", repo_name, phase);
        let summary_path = repo_path.clone();
        let summary = tokio::task::spawn_blocking(move || summarize_repository(&summary_path))
            .await
            .unwrap_or_else(|e| {
                log::error!("Summary pass failed: {}", e);
                ScanSummary::default()
            });

        phase = ScanPhase::Completed;
        let duration = seconds_since(started);
        log::info!(
            "Scan of {} completed in {:.2}s: {} secrets, phase {}",
            repo_name,
            duration,
            secrets.len(),
            phase
        );

        // Workspace guard dropped here: the clone directory is removed on
        // this and every earlier return path.
        drop(workspace);

        ScanResult {
            repo_name,
            repo_url: repo_url.to_string(),
            status: ResultStatus::Completed,
            secrets,
            dependencies,
            summary,
            errors,
            scan_duration: duration,
        }
    }

    /// Classifier → line scanner → external secret tool → deduplicator
    async fn scan_secrets(
        &self,
        repo_path: &std::path::Path,
        errors: &mut Vec<String>,
    ) -> Vec<Finding> {
        let classifier = FileClassifier::new(&self.config);
        let walk_root = repo_path.to_path_buf();
        let candidates =
            tokio::task::spawn_blocking(move || classifier.collect_candidates(&walk_root))
                .await
                .unwrap_or_else(|e| {
                    log::error!("Classifier walk failed: {}", e);
                    Vec::new()
                });
        log::debug!("{} candidate files selected", candidates.len());

        let mut findings = scan_candidates(&candidates, &self.config).await;

        if self.config.enable_trufflehog {
            match tools::trufflehog::scan(repo_path, &self.config).await {
                Ok(external) => findings.extend(external),
                Err(message) => errors.push(message),
            }
        }

        let mut findings = dedupe_findings(findings);
        // Dedup groups by real line numbers; they are only blanked in the
        // reported findings.
        if !self.config.include_line_numbers {
            for finding in &mut findings {
                finding.line_number = 0;
            }
        }
        log::info!("Found {} unique secrets", findings.len());
        findings
    }
}

/// Derive a filesystem- and id-safe repository name from its URL.
///
/// An 8-hex SHA-256 fragment keeps differently-hosted repositories with
/// the same basename apart.
pub fn sanitize_repo_name(repo_url: &str) -> String {
    let base = repo_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("repository");
    let base = base.strip_suffix(".git").unwrap_or(base);
    let base: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let base = if base.is_empty() {
        "repository".to_string()
    } else {
        base
    };

    let mut hasher = Sha256::new();
    hasher.update(repo_url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}_{}", base, &digest[..8])
}

fn seconds_since(started: Instant) -> f64 {
    started.elapsed().as_secs_f64()
}
