//! Pipeline orchestration: lister x fetcher x checkpoint x manifest.
//!
//! One (category, document type) pair is fully drained before the next
//! begins; within a pair, items are processed one at a time in listing
//! order. The interrupt flag is polled between items and pages, so stopping
//! the process never loses recorded work.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use lexline_core::{is_interrupted, SharedProgress, Transport};

use crate::checkpoint::CheckpointStore;
use crate::config::{year_range, Selection};
use crate::fetcher::{fetch_document, FetchOptions, OutcomeStatus};
use crate::listing::{DocumentLister, ListQuery};
use crate::manifest::{Manifest, Summary};

/// Checkpoint filename under the output root.
pub const CHECKPOINT_FILE: &str = ".state.json";
/// Manifest filename under the output root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Per-selection override of the default year window.
#[derive(Debug, Clone, Copy, Default)]
pub struct YearOverrides {
    pub act: Option<u32>,
    pub judgment: Option<u32>,
    pub doc: Option<u32>,
    pub authority_regulation: Option<u32>,
}

impl YearOverrides {
    pub fn for_selection(&self, selection: Selection) -> Option<u32> {
        match selection {
            Selection::Act => self.act,
            Selection::Judgment => self.judgment,
            Selection::Doc => self.doc,
            Selection::AuthorityRegulation => self.authority_regulation,
        }
    }
}

/// Everything one `run` needs, assembled by the CLI.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    pub selections: Vec<Selection>,
    pub years: u32,
    pub year_overrides: YearOverrides,
    pub lang_and_version: String,
    pub limit: usize,
    pub max_pages: Option<u32>,
    pub fetch_pdf: bool,
    pub fetch_zip: bool,
    pub fetch_media: bool,
    pub force: bool,
    pub dry_run: bool,
    pub resume: bool,
    pub reset: bool,
}

impl RunConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            selections: vec![Selection::Act],
            years: 1,
            year_overrides: YearOverrides::default(),
            lang_and_version: "fin@".to_string(),
            limit: crate::listing::API_PAGE_LIMIT,
            max_pages: None,
            fetch_pdf: false,
            fetch_zip: false,
            fetch_media: false,
            force: false,
            dry_run: false,
            resume: false,
            reset: false,
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    pub counts: Summary,
    pub elapsed: Duration,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn log(&self) {
        log::info!("=== Run Summary ===");
        log::info!(
            "Outcomes: {} total ({} success, {} skipped, {} errors)",
            self.counts.total,
            self.counts.success,
            self.counts.skipped,
            self.counts.error
        );
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
        if self.interrupted {
            log::info!("Interrupted before completion; resume with --resume");
        }
    }
}

/// Drain every selected (category, document type) pair through the fetcher,
/// recording outcomes in the manifest and progress in the checkpoint.
pub fn run<T: Transport>(
    transport: &T,
    config: &RunConfig,
    progress: &SharedProgress,
) -> Result<RunSummary> {
    let start = Instant::now();

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;

    let mut checkpoint = CheckpointStore::new(config.output_dir.join(CHECKPOINT_FILE));
    let mut manifest = Manifest::load(config.output_dir.join(MANIFEST_FILE));

    if config.reset {
        checkpoint.reset();
    }
    if config.resume {
        checkpoint.load();
    }

    let options = FetchOptions {
        output_root: config.output_dir.clone(),
        fetch_pdf: config.fetch_pdf,
        fetch_zip: config.fetch_zip,
        fetch_media: config.fetch_media,
        force: config.force,
        dry_run: config.dry_run,
    };

    let mut interrupted = false;

    'selections: for &selection in &config.selections {
        let category = selection.category();
        let years = config
            .year_overrides
            .for_selection(selection)
            .unwrap_or(config.years);
        let (start_year, end_year) = year_range(years);
        log::info!("processing {selection}: years {start_year}-{end_year}");

        for &document_type in selection.document_types() {
            if is_interrupted() {
                interrupted = true;
                break 'selections;
            }

            let start_page = if config.resume {
                let page = checkpoint.resume_page_for(category.as_str(), document_type);
                if page > 1 {
                    log::info!("{category}/{document_type}: resuming from page {page}");
                }
                page
            } else {
                1
            };

            checkpoint.start_session(category.as_str(), document_type);

            let mut query = ListQuery::new(category, document_type);
            query.lang_and_version = config.lang_and_version.clone();
            query.start_year = Some(start_year);
            query.end_year = Some(end_year);
            query.limit = config.limit;
            query.max_pages = config.max_pages;
            query.start_page = start_page;

            let line = progress.stage_line(&format!("{category}/{document_type}"));
            let mut lister = DocumentLister::new(transport, query);
            while let Some(item) = lister.next() {
                if is_interrupted() {
                    interrupted = true;
                    line.finish_and_clear();
                    break 'selections;
                }
                line.set_message(item.uri.clone());

                if checkpoint.is_completed(&item.uri) {
                    log::debug!("already completed: {}", item.uri);
                    continue;
                }

                let outcome = fetch_document(transport, &item.uri, &options);
                let status = outcome.status;
                manifest.add(outcome);

                if matches!(status, OutcomeStatus::Success | OutcomeStatus::Skipped) {
                    checkpoint.mark_completed(&item.uri);
                }
                checkpoint.set_page(lister.current_page());
            }
            line.finish_and_clear();
        }
    }

    let summary = RunSummary {
        counts: manifest.summary(),
        elapsed: start.elapsed(),
        interrupted,
    };
    summary.log();
    Ok(summary)
}
