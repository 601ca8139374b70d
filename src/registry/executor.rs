//! Scan Executor
//!
//! Ties the registry, the lock manager, the coordinator and the
//! persistence store together. Each submitted scan runs as an
//! independent background task, decoupled from the caller; the executor
//! surface (submit/status/result/delete/list) is what an HTTP layer
//! would call.

use crate::core::config::ScanConfig;
use crate::core::validation::validate_repo_url;
use crate::registry::locks::RepoLockManager;
use crate::registry::{ScanListEntry, ScanRecord, ScanRegistry, ScanStatus};
use crate::scanner::coordinator::{sanitize_repo_name, ScanCoordinator};
use crate::scanner::error::ScanError;
use crate::scanner::git::{GitCloner, RepositoryCloner};
use crate::scanner::types::{ResultStatus, ScanResult};
use crate::store::ScanStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Background scan execution service
pub struct ScanExecutor {
    config: ScanConfig,
    registry: Arc<ScanRegistry>,
    locks: Arc<RepoLockManager>,
    cloner: Arc<dyn RepositoryCloner>,
    store: Option<Arc<dyn ScanStore>>,
    next_seq: AtomicU64,
}

impl ScanExecutor {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            registry: Arc::new(ScanRegistry::new()),
            locks: Arc::new(RepoLockManager::new()),
            cloner: Arc::new(GitCloner),
            store: None,
            next_seq: AtomicU64::new(1),
        }
    }

    /// Inject a cloner; tests use this to run without a network
    pub fn with_cloner(mut self, cloner: Arc<dyn RepositoryCloner>) -> Self {
        self.cloner = cloner;
        self
    }

    /// Attach a persistence store as restart-survivable fallback
    pub fn with_store(mut self, store: Arc<dyn ScanStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn registry(&self) -> &Arc<ScanRegistry> {
        &self.registry
    }

    /// Submit a scan. Validation happens here, synchronously with the
    /// caller: a rejected URL never produces a scan id.
    pub async fn submit(
        &self,
        repo_url: &str,
        config: Option<ScanConfig>,
    ) -> Result<String, ScanError> {
        validate_repo_url(repo_url)
            .await
            .map_err(ScanError::validation)?;

        let config = config.unwrap_or_else(|| self.config.clone());
        let repo_name = sanitize_repo_name(repo_url);
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let scan_id = format!(
            "{}_{}_{}",
            repo_name,
            chrono::Utc::now().format("%Y%m%d_%H%M%S"),
            seq
        );

        let record = self.registry.insert_queued(&scan_id, repo_url);
        self.persist(&record).await;
        log::info!("Scan queued: {}", scan_id);

        let registry = Arc::clone(&self.registry);
        let locks = Arc::clone(&self.locks);
        let cloner = Arc::clone(&self.cloner);
        let store = self.store.clone();
        let url = repo_url.to_string();
        let id = scan_id.clone();

        tokio::spawn(async move {
            run_scan_background(registry, locks, cloner, store, id, url, config).await;
        });

        Ok(scan_id)
    }

    /// Current status, consulting the store only when the registry has no
    /// record (e.g. after a restart)
    pub async fn status(&self, scan_id: &str) -> Option<ScanStatus> {
        if let Some(status) = self.registry.status(scan_id) {
            return Some(status);
        }
        self.stored_record(scan_id).await.map(|r| r.status)
    }

    /// Full record including the result once the scan reached a terminal
    /// state
    pub async fn result(&self, scan_id: &str) -> Option<ScanRecord> {
        if let Some(record) = self.registry.record(scan_id) {
            return Some(record);
        }
        self.stored_record(scan_id).await
    }

    /// Drop a scan: registry record, persisted row, and best-effort the
    /// on-disk clone if one is still around. Returns false for unknown
    /// ids.
    pub async fn delete(&self, scan_id: &str) -> bool {
        let known_in_memory = self.registry.remove(scan_id).is_some();
        let mut known_in_store = false;
        if let Some(store) = &self.store {
            known_in_store = matches!(store.get(scan_id).await, Ok(Some(_)));
            if let Err(e) = store.delete(scan_id).await {
                log::debug!("Failed to delete persisted scan '{}': {}", scan_id, e);
            }
        }
        if !known_in_memory && !known_in_store {
            return false;
        }

        // scan ids are `{repo_name}_{date}_{time}_{seq}`
        if let Some(repo_name) = repo_name_from_scan_id(scan_id) {
            let repo_path = self.config.base_path.join(repo_name);
            if repo_path.is_dir() {
                match tokio::fs::remove_dir_all(&repo_path).await {
                    Ok(()) => log::info!("Removed repo directory: {}", repo_path.display()),
                    Err(e) => log::warn!(
                        "Could not remove repo directory '{}': {}",
                        repo_path.display(),
                        e
                    ),
                }
            }
        }
        true
    }

    pub fn list(&self) -> Vec<ScanListEntry> {
        self.registry.list()
    }

    async fn stored_record(&self, scan_id: &str) -> Option<ScanRecord> {
        let store = self.store.as_ref()?;
        match store.get(scan_id).await {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Store lookup for '{}' failed: {}", scan_id, e);
                None
            }
        }
    }

    async fn persist(&self, record: &ScanRecord) {
        persist_record(&self.store, record).await;
    }
}

async fn persist_record(store: &Option<Arc<dyn ScanStore>>, record: &ScanRecord) {
    if let Some(store) = store {
        if let Err(e) = store.upsert(record).await {
            log::warn!("Failed to persist scan '{}': {}", record.scan_id, e);
        }
    }
}

/// The background task owning one scan id: waits on the repository lock,
/// advances the lifecycle and records the outcome. Panics inside the
/// scan surface as status "error" instead of killing the process.
async fn run_scan_background(
    registry: Arc<ScanRegistry>,
    locks: Arc<RepoLockManager>,
    cloner: Arc<dyn RepositoryCloner>,
    store: Option<Arc<dyn ScanStore>>,
    scan_id: String,
    repo_url: String,
    config: ScanConfig,
) {
    let _guard = locks
        .acquire(&repo_url, || {
            log::info!(
                "Scan {} waiting: repository already being scanned",
                scan_id
            );
        })
        .await;

    if let Err(e) = registry.update_status(&scan_id, ScanStatus::Scanning) {
        log::warn!("Cannot move scan '{}' to scanning: {}", scan_id, e);
        return;
    }
    if let Some(record) = registry.record(&scan_id) {
        persist_record(&store, &record).await;
    }
    log::info!("Background scan started for {}", scan_id);

    let coordinator = ScanCoordinator::with_cloner(config, cloner);
    let url = repo_url.clone();
    let outcome = tokio::spawn(async move { coordinator.run(&url).await }).await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            log::error!("Scan task for '{}' aborted: {}", scan_id, e);
            ScanResult::unexpected(
                &sanitize_repo_name(&repo_url),
                &repo_url,
                format!("scan aborted unexpectedly: {}", e),
                0.0,
            )
        }
    };

    let status = if result.status == ResultStatus::Completed {
        ScanStatus::Completed
    } else {
        ScanStatus::Failed
    };
    // Persist before the in-memory record turns terminal, so a terminal
    // status observed through the registry implies the row is durable.
    if let Some(mut record) = registry.record(&scan_id) {
        record.status = status;
        record.result = Some(result.clone());
        record.updated_at = chrono::Utc::now();
        persist_record(&store, &record).await;
    }
    if let Err(e) = registry.complete(&scan_id, status, result) {
        log::warn!("Cannot record outcome for scan '{}': {}", scan_id, e);
    }
    log::info!("Background scan finished for {} ({})", scan_id, status);
}

/// Strip the `_{date}_{time}_{seq}` suffix from a scan id
fn repo_name_from_scan_id(scan_id: &str) -> Option<&str> {
    let mut cut = scan_id;
    for _ in 0..3 {
        cut = &cut[..cut.rfind('_')?];
    }
    if cut.is_empty() {
        None
    } else {
        Some(cut)
    }
}
