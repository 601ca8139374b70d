//! Scan Configuration
//!
//! Defaults, TOML file loading and validation for the per-scan
//! configuration snapshot. A `ScanConfig` is immutable once handed to a
//! scan; the CLI and embedding services build one up front.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration snapshot for a single repository scan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum size of a single file considered for secret scanning (bytes)
    pub max_file_size: u64,
    /// Maximum on-disk size of a cloned repository (bytes); larger clones fail the scan
    pub max_repo_size: u64,
    /// Hard timeout for the clone and for each external tool (seconds)
    pub default_timeout: u64,
    /// Directory under which per-repository working directories are created
    pub base_path: PathBuf,
    /// Worker pool size for parallel file scanning
    pub max_workers: usize,
    /// Maximum directory depth descended below the repository root
    pub scan_depth: usize,
    /// Scan candidate files concurrently when there are enough of them
    pub enable_parallel: bool,
    /// Mask detected secrets in context strings and stored values
    pub redact_secrets: bool,
    /// Include 1-based line numbers in serialized findings
    pub include_line_numbers: bool,
    /// Also scan common source-code files, not only sensitive files
    pub scan_source_files: bool,
    /// Generate a package-lock in a scratch directory when npm audit needs one
    pub generate_lockfile: bool,
    /// Additional user-supplied exclusion globs, matched against repo-relative paths
    pub ignore_globs: Vec<String>,

    // External tool toggles
    pub enable_trufflehog: bool,
    pub enable_pip_audit: bool,
    pub enable_safety: bool,
    pub enable_npm_audit: bool,
    pub enable_snyk: bool,
    pub enable_semgrep: bool,
    pub enable_bandit: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024,
            max_repo_size: 500 * 1024 * 1024,
            default_timeout: 120,
            base_path: std::env::temp_dir().join("reposcan-repos"),
            max_workers: 4,
            scan_depth: 10,
            enable_parallel: true,
            redact_secrets: true,
            include_line_numbers: true,
            scan_source_files: true,
            generate_lockfile: true,
            ignore_globs: Vec::new(),
            enable_trufflehog: true,
            enable_pip_audit: true,
            enable_safety: true,
            enable_npm_audit: true,
            enable_snyk: true,
            enable_semgrep: true,
            enable_bandit: true,
        }
    }
}

impl ScanConfig {
    /// Load configuration from an explicit TOML file, or from the default
    /// locations (`$CONFIG_DIR/reposcan/reposcan.toml`, then
    /// `./reposcan.toml`). Missing files yield the defaults; a present but
    /// unparsable file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, String> {
        let candidate = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_locations().into_iter().find(|p| p.exists()),
        };

        let config = match candidate {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| format!("cannot read config file '{}': {}", path.display(), e))?;
                let config: ScanConfig = toml::from_str(&content)
                    .map_err(|e| format!("invalid config file '{}': {}", path.display(), e))?;
                log::debug!("Loaded configuration from {}", path.display());
                config
            }
            None => ScanConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints and user-supplied patterns
    pub fn validate(&self) -> Result<(), String> {
        if self.max_workers == 0 {
            return Err("max_workers must be greater than 0".to_string());
        }
        if self.default_timeout == 0 {
            return Err("default_timeout must be greater than 0".to_string());
        }
        for pattern in &self.ignore_globs {
            glob::Pattern::new(pattern)
                .map_err(|e| format!("invalid ignore glob '{}': {}", pattern, e))?;
        }
        Ok(())
    }

    /// Timeout as a `Duration`
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.default_timeout)
    }
}

fn default_config_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(config_dir) = dirs::config_dir() {
        locations.push(config_dir.join("reposcan").join("reposcan.toml"));
    }
    locations.push(PathBuf::from("reposcan.toml"));
    locations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = ScanConfig::default();
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.max_repo_size, 500 * 1024 * 1024);
        assert_eq!(config.default_timeout, 120);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.scan_depth, 10);
        assert!(config.enable_parallel);
        assert!(config.redact_secrets);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_merges_over_defaults() {
        let config: ScanConfig =
            toml::from_str("max_workers = 8\nredact_secrets = false").unwrap();
        assert_eq!(config.max_workers, 8);
        assert!(!config.redact_secrets);
        // Untouched fields keep their defaults
        assert_eq!(config.default_timeout, 120);
        assert!(config.scan_source_files);
    }

    #[test]
    fn test_invalid_ignore_glob_rejected() {
        let config = ScanConfig {
            ignore_globs: vec!["[".to_string()],
            ..ScanConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = ScanConfig {
            max_workers: 0,
            ..ScanConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
