//! Scan persistence
//!
//! Boundary to the persistence collaborator: the in-memory registry is
//! authoritative while the process lives, the store is a retrieval
//! fallback after a restart. Store failures are logged and never fail a
//! scan.

use crate::registry::ScanRecord;
use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence contract: upserts keyed by scan id, lookups and deletes
#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn upsert(&self, record: &ScanRecord) -> Result<(), StoreError>;
    async fn get(&self, scan_id: &str) -> Result<Option<ScanRecord>, StoreError>;
    async fn delete(&self, scan_id: &str) -> Result<(), StoreError>;
}

/// File-backed store keeping one JSON document per scan
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, scan_id: &str) -> PathBuf {
        // Scan ids are generated from sanitised repo names and are
        // filesystem-safe by construction; reject anything else outright.
        let safe: String = scan_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

#[async_trait]
impl ScanStore for JsonFileStore {
    async fn upsert(&self, record: &ScanRecord) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(self.path_for(&record.scan_id), json).await?;
        Ok(())
    }

    async fn get(&self, scan_id: &str) -> Result<Option<ScanRecord>, StoreError> {
        let path = self.path_for(scan_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // A corrupt row reads as absent rather than failing lookups
                log::warn!("Corrupt scan row at '{}': {}", path.display(), e);
                Ok(None)
            }
        }
    }

    async fn delete(&self, scan_id: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(scan_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
