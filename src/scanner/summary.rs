//! Repository summary pass
//!
//! One final walk over the cloned tree computing size, file and directory
//! counts, per-extension and per-language histograms and the list of
//! sensitive files. Also provides the plain size walk used for the
//! post-clone `max_repo_size` check.

use crate::patterns::classify::{
    is_sensitive_name, language_for_extension, SENSITIVE_EXTENSIONS,
};
use crate::scanner::types::ScanSummary;
use std::path::Path;

/// Directories excluded from statistics, mirroring the classifier's walk
fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.')
        || matches!(
            name,
            "node_modules" | "__pycache__" | "dist" | "build" | "target" | "vendor"
        )
}

/// Compute the summary for a repository tree. Blocking.
pub fn summarize_repository(root: &Path) -> ScanSummary {
    let mut summary = ScanSummary::default();
    let mut total_bytes: u64 = 0;
    walk_summary(root, root, &mut summary, &mut total_bytes);
    summary.total_size_kb = total_bytes as f64 / 1024.0;
    summary.sensitive_files.sort();
    summary
}

fn walk_summary(root: &Path, dir: &Path, summary: &mut ScanSummary, total_bytes: &mut u64) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Summary cannot read '{}': {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();

        if path.is_dir() {
            if is_skipped_dir(&name) {
                continue;
            }
            summary.directory_count += 1;
            walk_summary(root, &path, summary, total_bytes);
            continue;
        }

        summary.file_count += 1;
        if let Ok(meta) = entry.metadata() {
            *total_bytes += meta.len();
        }

        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if !ext.is_empty() {
            *summary.by_extension.entry(ext.clone()).or_insert(0) += 1;
            if let Some(lang) = language_for_extension(&ext) {
                *summary.by_language.entry(lang.to_string()).or_insert(0) += 1;
            }
        }

        if is_sensitive_name(&name) || SENSITIVE_EXTENSIONS.contains(&ext.as_str()) {
            let rel = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            summary.sensitive_files.push(rel);
        }
    }
}

/// Total on-disk size of a tree in bytes, for the oversize check. Blocking.
pub fn directory_size(root: &Path) -> u64 {
    let mut total = 0u64;
    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                total += directory_size(&path);
            } else if let Ok(meta) = entry.metadata() {
                total += meta.len();
            }
        }
    }
    total
}
