//! Repository Lock Manager
//!
//! Guarantees at most one concurrent clone+scan per logical repository.
//! Each canonical repository key maps to one async mutex, created lazily
//! under a short-held guard mutex so two submissions can never race two
//! locks into existence for the same repository. Entries live for the
//! process lifetime; the growth bound is one entry per distinct
//! repository scanned.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

/// Lock table keyed by canonical repository identity
pub struct RepoLockManager {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RepoLockManager {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the lock for a repository, blocking (without busy-polling)
    /// while another scan of the same repository runs.
    ///
    /// `on_queued` fires exactly when the lock is already held, before
    /// waiting starts; the executor uses it to make the queued state
    /// observable in the registry.
    pub async fn acquire(&self, repo_url: &str, on_queued: impl FnOnce()) -> OwnedMutexGuard<()> {
        let lock = self.lock_entry(repo_url);
        match lock.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                log::info!(
                    "Repository '{}' already being scanned, waiting for lock",
                    repo_url
                );
                on_queued();
                lock.lock_owned().await
            }
        }
    }

    /// Look up or create the lock entry under the short-held guard mutex
    fn lock_entry(&self, repo_url: &str) -> Arc<tokio::sync::Mutex<()>> {
        let key = canonical_repo_key(repo_url);
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(key)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Number of distinct repositories ever locked
    pub fn entry_count(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for RepoLockManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical repository identity: URL normalised (scheme and credentials
/// stripped, `.git` suffix dropped) plus a SHA-256 disambiguator of the
/// normalised form.
pub fn canonical_repo_key(repo_url: &str) -> String {
    let normalised = normalise_repo_url(repo_url);
    let mut hasher = Sha256::new();
    hasher.update(normalised.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}#{}", normalised, &digest[..8])
}

/// Normalise a repository URL for identity comparison
fn normalise_repo_url(repo_url: &str) -> String {
    let trimmed = repo_url.trim();

    let without_scheme = match trimmed.find("://") {
        Some(scheme_end) => &trimmed[scheme_end + 3..],
        None => trimmed,
    };
    // Strip authentication info (user@host -> host)
    let host_path = match without_scheme.find('@') {
        Some(at) => &without_scheme[at + 1..],
        None => without_scheme,
    };
    let host_path = host_path.trim_end_matches('/');
    let host_path = host_path.strip_suffix(".git").unwrap_or(host_path);
    // scp-like syntax uses ':' between host and path
    host_path.replace(':', "/").to_lowercase()
}
