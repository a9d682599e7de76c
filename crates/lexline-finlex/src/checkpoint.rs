//! Durable pipeline progress for resumable runs.
//!
//! The checkpoint is the sole source of resume truth: which (category, type)
//! pair was active, which page the lister was on, and which URIs are done.
//! Every mutating operation persists synchronously, so a run killed at any
//! point leaves the file consistent with exactly the work completed so far.
//! Persistence failures are logged and otherwise ignored: losing a
//! checkpoint write costs a re-fetch, not correctness.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Pipeline progress state, one JSON object on disk.
///
/// `completed_uris` serializes as an array; its on-disk order carries no
/// meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Checkpoint {
    pub current_category: Option<String>,
    pub current_document_type: Option<String>,
    pub current_page: u32,
    pub last_uri: Option<String>,
    pub completed_uris: FxHashSet<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            current_category: None,
            current_document_type: None,
            current_page: 1,
            last_uri: None,
            completed_uris: FxHashSet::default(),
            started_at: None,
            updated_at: None,
        }
    }
}

/// Checkpoint persistence, one file per output root.
pub struct CheckpointStore {
    path: PathBuf,
    state: Checkpoint,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Checkpoint::default(),
        }
    }

    pub fn state(&self) -> &Checkpoint {
        &self.state
    }

    /// Read persisted state if present. Missing or unreadable files are not
    /// an error: the store starts fresh and reports `false`.
    pub fn load(&mut self) -> bool {
        if !self.path.exists() {
            log::info!("no existing checkpoint found");
            return false;
        }
        let loaded = std::fs::read_to_string(&self.path)
            .map_err(anyhow::Error::from)
            .and_then(|text| serde_json::from_str(&text).map_err(anyhow::Error::from));
        match loaded {
            Ok(state) => {
                self.state = state;
                log::info!(
                    "loaded checkpoint: page {}, {} completed",
                    self.state.current_page,
                    self.state.completed_uris.len()
                );
                true
            }
            Err(e) => {
                log::warn!("failed to load checkpoint: {e}");
                self.state = Checkpoint::default();
                false
            }
        }
    }

    /// Stamp and persist the whole state as one file replace.
    pub fn save(&mut self) {
        self.state.updated_at = Some(Utc::now());

        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("failed to create {}: {e}", parent.display());
                return;
            }
        }

        let json = match serde_json::to_string_pretty(&self.state) {
            Ok(json) => json,
            Err(e) => {
                log::error!("failed to serialize checkpoint: {e}");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            log::error!("failed to save checkpoint: {e}");
        } else {
            log::debug!("saved checkpoint to {}", self.path.display());
        }
    }

    /// Record the active (category, document type) pair. `started_at` is set
    /// on the first-ever session only.
    pub fn start_session(&mut self, category: &str, document_type: &str) {
        if self.state.started_at.is_none() {
            self.state.started_at = Some(Utc::now());
        }
        self.state.current_category = Some(category.to_string());
        self.state.current_document_type = Some(document_type.to_string());
        self.save();
    }

    /// Mark a URI done. Idempotent.
    pub fn mark_completed(&mut self, uri: &str) {
        self.state.completed_uris.insert(uri.to_string());
        self.state.last_uri = Some(uri.to_string());
        self.save();
    }

    pub fn is_completed(&self, uri: &str) -> bool {
        self.state.completed_uris.contains(uri)
    }

    pub fn set_page(&mut self, page: u32) {
        self.state.current_page = page;
        self.save();
    }

    /// Page to resume paging from. The stored page applies only when both
    /// the category and the document type match the stored session exactly;
    /// anything else starts at page 1.
    pub fn resume_page_for(&self, category: &str, document_type: &str) -> u32 {
        if self.state.current_category.as_deref() == Some(category)
            && self.state.current_document_type.as_deref() == Some(document_type)
        {
            self.state.current_page
        } else {
            1
        }
    }

    /// Back to defaults; removes the persisted file if present.
    pub fn reset(&mut self) {
        self.state = Checkpoint::default();
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                log::warn!("failed to remove checkpoint file: {e}");
            }
        }
        log::info!("checkpoint reset");
    }
}
