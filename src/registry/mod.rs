//! Scan Registry
//!
//! In-memory map from scan id to lifecycle record. Writes come only from
//! the single background task owning a scan id; status and result queries
//! read concurrently under a short-lived lock. The registry is an
//! explicit component constructed once at process start and shared by
//! reference, not an ambient global.

pub mod executor;
pub mod locks;

use crate::scanner::types::ScanResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

pub use executor::ScanExecutor;
pub use locks::RepoLockManager;

/// Lifecycle status of a submitted scan
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScanStatus {
    Queued,
    Scanning,
    Completed,
    Failed,
}

impl ScanStatus {
    /// Position in the one-directional lifecycle; transitions may never
    /// move to a lower or equal rank (except the terminal split)
    fn rank(self) -> u8 {
        match self {
            ScanStatus::Queued => 0,
            ScanStatus::Scanning => 1,
            ScanStatus::Completed | ScanStatus::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }
}

/// One tracked scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub scan_id: String,
    pub repo_url: String,
    pub status: ScanStatus,
    pub result: Option<ScanResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Summary row for scan listings
#[derive(Debug, Clone, Serialize)]
pub struct ScanListEntry {
    pub scan_id: String,
    pub status: ScanStatus,
    pub has_result: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("scan '{0}' is not tracked")]
    UnknownScan(String),
    #[error("invalid status transition {from} -> {to} for scan '{scan_id}'")]
    InvalidTransition {
        scan_id: String,
        from: ScanStatus,
        to: ScanStatus,
    },
}

/// Concurrency-safe scan-id → record map
pub struct ScanRegistry {
    records: RwLock<HashMap<String, ScanRecord>>,
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Track a newly submitted scan as queued
    pub fn insert_queued(&self, scan_id: &str, repo_url: &str) -> ScanRecord {
        let now = Utc::now();
        let record = ScanRecord {
            scan_id: scan_id.to_string(),
            repo_url: repo_url.to_string(),
            status: ScanStatus::Queued,
            result: None,
            created_at: now,
            updated_at: now,
        };
        self.write().insert(scan_id.to_string(), record.clone());
        record
    }

    /// Advance a scan's status. Regressions are refused: the lifecycle is
    /// monotonic and one-directional.
    pub fn update_status(&self, scan_id: &str, status: ScanStatus) -> Result<(), RegistryError> {
        let mut records = self.write();
        let record = records
            .get_mut(scan_id)
            .ok_or_else(|| RegistryError::UnknownScan(scan_id.to_string()))?;
        if status.rank() <= record.status.rank() && status != record.status {
            return Err(RegistryError::InvalidTransition {
                scan_id: scan_id.to_string(),
                from: record.status,
                to: status,
            });
        }
        if record.status.is_terminal() && status != record.status {
            return Err(RegistryError::InvalidTransition {
                scan_id: scan_id.to_string(),
                from: record.status,
                to: status,
            });
        }
        record.status = status;
        record.updated_at = Utc::now();
        Ok(())
    }

    /// Attach the final result and matching terminal status
    pub fn complete(
        &self,
        scan_id: &str,
        status: ScanStatus,
        result: ScanResult,
    ) -> Result<(), RegistryError> {
        debug_assert!(status.is_terminal());
        self.update_status(scan_id, status)?;
        let mut records = self.write();
        if let Some(record) = records.get_mut(scan_id) {
            record.result = Some(result);
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    pub fn status(&self, scan_id: &str) -> Option<ScanStatus> {
        self.read().get(scan_id).map(|r| r.status)
    }

    pub fn record(&self, scan_id: &str) -> Option<ScanRecord> {
        self.read().get(scan_id).cloned()
    }

    pub fn remove(&self, scan_id: &str) -> Option<ScanRecord> {
        self.write().remove(scan_id)
    }

    pub fn list(&self) -> Vec<ScanListEntry> {
        let mut entries: Vec<_> = self
            .read()
            .values()
            .map(|r| ScanListEntry {
                scan_id: r.scan_id.clone(),
                status: r.status,
                has_result: r.result.is_some(),
            })
            .collect();
        entries.sort_by(|a, b| a.scan_id.cmp(&b.scan_id));
        entries
    }

    /// Number of scans currently in the Scanning state
    pub fn active_count(&self) -> usize {
        self.read()
            .values()
            .filter(|r| r.status == ScanStatus::Scanning)
            .count()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, ScanRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, ScanRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ScanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::types::ScanResult as Report;

    fn report() -> Report {
        Report::failed("name", "url", "boom".to_string(), 0.1)
    }

    #[test]
    fn test_lifecycle_progresses_forward() {
        let registry = ScanRegistry::new();
        registry.insert_queued("s1", "https://example.com/a.git");
        assert_eq!(registry.status("s1"), Some(ScanStatus::Queued));

        registry.update_status("s1", ScanStatus::Scanning).unwrap();
        assert_eq!(registry.status("s1"), Some(ScanStatus::Scanning));

        registry
            .complete("s1", ScanStatus::Completed, report())
            .unwrap();
        assert_eq!(registry.status("s1"), Some(ScanStatus::Completed));
        assert!(registry.record("s1").unwrap().result.is_some());
    }

    #[test]
    fn test_status_never_regresses() {
        let registry = ScanRegistry::new();
        registry.insert_queued("s1", "url");
        registry.update_status("s1", ScanStatus::Scanning).unwrap();

        let err = registry.update_status("s1", ScanStatus::Queued);
        assert!(matches!(
            err,
            Err(RegistryError::InvalidTransition { .. })
        ));
        assert_eq!(registry.status("s1"), Some(ScanStatus::Scanning));

        registry.update_status("s1", ScanStatus::Failed).unwrap();
        let err = registry.update_status("s1", ScanStatus::Completed);
        assert!(err.is_err(), "terminal states are final");
        assert_eq!(registry.status("s1"), Some(ScanStatus::Failed));
    }

    #[test]
    fn test_unknown_scan_is_an_error() {
        let registry = ScanRegistry::new();
        assert!(matches!(
            registry.update_status("ghost", ScanStatus::Scanning),
            Err(RegistryError::UnknownScan(_))
        ));
        assert!(registry.status("ghost").is_none());
    }

    #[test]
    fn test_listing_and_removal() {
        let registry = ScanRegistry::new();
        registry.insert_queued("b", "url-b");
        registry.insert_queued("a", "url-a");
        let list = registry.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].scan_id, "a");
        assert!(!list[0].has_result);

        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_concurrent_readers_during_writes() {
        use std::sync::Arc;
        let registry = Arc::new(ScanRegistry::new());
        registry.insert_queued("s1", "url");

        let mut handles = Vec::new();
        for _ in 0..4 {
            let reg = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                for _ in 0..500 {
                    let _ = reg.status("s1");
                    let _ = reg.list();
                }
            }));
        }
        registry.update_status("s1", ScanStatus::Scanning).unwrap();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.status("s1"), Some(ScanStatus::Scanning));
    }
}
