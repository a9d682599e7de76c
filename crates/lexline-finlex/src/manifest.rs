//! Append-only audit log of fetch outcomes.
//!
//! Separate from the checkpoint on purpose: the checkpoint answers "what can
//! this run skip", the manifest answers "what did every run do". Resetting
//! one never touches the other, and a lost or corrupt manifest only loses
//! history — the checkpoint stays authoritative for resume decisions.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fetcher::{FetchOutcome, OutcomeStatus};

/// Counts by final status. Dry-run entries contribute to `total` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub success: usize,
    pub skipped: usize,
    pub error: usize,
}

#[derive(Serialize, Deserialize)]
struct ManifestFile {
    updated_at: Option<DateTime<Utc>>,
    total_entries: usize,
    success_count: usize,
    skipped_count: usize,
    error_count: usize,
    #[serde(default)]
    entries: Vec<FetchOutcome>,
}

/// Manifest persistence, one file per output root, rewritten in full on
/// every append.
pub struct Manifest {
    path: PathBuf,
    entries: Vec<FetchOutcome>,
}

impl Manifest {
    /// Open the manifest, loading prior entries when the file is present and
    /// readable. History is best-effort: missing or corrupt files start
    /// empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut manifest = Self {
            path,
            entries: Vec::new(),
        };
        if !manifest.path.exists() {
            return manifest;
        }
        let loaded = std::fs::read_to_string(&manifest.path)
            .map_err(anyhow::Error::from)
            .and_then(|text| {
                serde_json::from_str::<ManifestFile>(&text).map_err(anyhow::Error::from)
            });
        match loaded {
            Ok(file) => {
                log::info!("loaded manifest with {} entries", file.entries.len());
                manifest.entries = file.entries;
            }
            Err(e) => log::warn!("failed to load manifest: {e}"),
        }
        manifest
    }

    /// Append an outcome and rewrite the file.
    pub fn add(&mut self, outcome: FetchOutcome) {
        self.entries.push(outcome);
        self.save();
    }

    pub fn entries(&self) -> &[FetchOutcome] {
        &self.entries
    }

    pub fn summary(&self) -> Summary {
        let count = |status: OutcomeStatus| self.entries.iter().filter(|e| e.status == status).count();
        Summary {
            total: self.entries.len(),
            success: count(OutcomeStatus::Success),
            skipped: count(OutcomeStatus::Skipped),
            error: count(OutcomeStatus::Error),
        }
    }

    fn save(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("failed to create {}: {e}", parent.display());
                return;
            }
        }

        let summary = self.summary();
        let file = ManifestFile {
            updated_at: Some(Utc::now()),
            total_entries: summary.total,
            success_count: summary.success,
            skipped_count: summary.skipped,
            error_count: summary.error,
            entries: self.entries.clone(),
        };
        let json = match serde_json::to_string_pretty(&file) {
            Ok(json) => json,
            Err(e) => {
                log::error!("failed to serialize manifest: {e}");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            log::error!("failed to save manifest: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(uri: &str, status: OutcomeStatus) -> FetchOutcome {
        FetchOutcome {
            akn_uri: uri.to_string(),
            status,
            timestamp: Utc::now(),
            files: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn summary_counts_exact() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = Manifest::load(dir.path().join("manifest.json"));
        manifest.add(outcome("a", OutcomeStatus::Success));
        manifest.add(outcome("b", OutcomeStatus::Success));
        manifest.add(outcome("c", OutcomeStatus::Skipped));
        manifest.add(outcome("d", OutcomeStatus::Error));

        assert_eq!(
            manifest.summary(),
            Summary {
                total: 4,
                success: 2,
                skipped: 1,
                error: 1
            }
        );
    }

    #[test]
    fn dry_run_counts_toward_total_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = Manifest::load(dir.path().join("manifest.json"));
        manifest.add(outcome("a", OutcomeStatus::DryRun));
        manifest.add(outcome("b", OutcomeStatus::Success));

        let summary = manifest.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.success, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.error, 0);
    }

    #[test]
    fn entries_survive_reload_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let mut manifest = Manifest::load(&path);
        manifest.add(outcome("first", OutcomeStatus::Success));
        manifest.add(outcome("second", OutcomeStatus::Error));

        let reloaded = Manifest::load(&path);
        assert_eq!(reloaded.entries().len(), 2);
        assert_eq!(reloaded.entries()[0].akn_uri, "first");
        assert_eq!(reloaded.entries()[1].akn_uri, "second");
        assert_eq!(reloaded.entries()[1].status, OutcomeStatus::Error);
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::load(dir.path().join("manifest.json"));
        assert!(manifest.entries().is_empty());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, b"]broken[").unwrap();
        let manifest = Manifest::load(&path);
        assert!(manifest.entries().is_empty());
    }

    #[test]
    fn file_rewritten_with_header_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let mut manifest = Manifest::load(&path);
        manifest.add(outcome("a", OutcomeStatus::Success));
        manifest.add(outcome("b", OutcomeStatus::Skipped));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["total_entries"], 2);
        assert_eq!(raw["success_count"], 1);
        assert_eq!(raw["skipped_count"], 1);
        assert_eq!(raw["error_count"], 0);
        assert_eq!(raw["entries"].as_array().unwrap().len(), 2);
        assert_eq!(raw["entries"][0]["status"], "success");
    }
}
