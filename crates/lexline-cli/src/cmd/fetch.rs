//! Fetch subcommand - run the checkpointed download pipeline

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use lexline_core::{ClientConfig, FinlexClient, SharedProgress};
use lexline_finlex::runner::{self, RunConfig, YearOverrides};
use lexline_finlex::Selection;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Document categories to download
    #[arg(long, value_enum, num_args = 1.., default_values = ["act"])]
    pub types: Vec<TypeArg>,

    /// Number of years to download
    #[arg(long, default_value_t = 1)]
    pub years: u32,

    /// Override years for the act category
    #[arg(long)]
    pub years_act: Option<u32>,

    /// Override years for the judgment category
    #[arg(long)]
    pub years_judgment: Option<u32>,

    /// Override years for the doc category
    #[arg(long)]
    pub years_doc: Option<u32>,

    /// Override years for authority regulations
    #[arg(long)]
    pub years_authority_regulation: Option<u32>,

    /// Language and version marker
    #[arg(long)]
    pub lang: Option<String>,

    /// Page size for list requests (max: 10)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Maximum pages to fetch per document type
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Seconds between requests
    #[arg(long)]
    pub sleep: Option<f64>,

    /// Also download PDF versions
    #[arg(long)]
    pub pdf: bool,

    /// Also download packaged ZIP bundles
    #[arg(long)]
    pub zip: bool,

    /// Also download embedded media files
    #[arg(long)]
    pub media: bool,

    /// Re-download existing files
    #[arg(long)]
    pub force: bool,

    /// Show what would be downloaded without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Resume from the last checkpoint
    #[arg(long)]
    pub resume: bool,

    /// Discard the checkpoint and start fresh
    #[arg(long)]
    pub reset: bool,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum TypeArg {
    Act,
    Judgment,
    Doc,
    AuthorityRegulation,
}

impl From<TypeArg> for Selection {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Act => Selection::Act,
            TypeArg::Judgment => Selection::Judgment,
            TypeArg::Doc => Selection::Doc,
            TypeArg::AuthorityRegulation => Selection::AuthorityRegulation,
        }
    }
}

/// Print a key-value summary table on stderr
fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}

pub fn run(args: FetchArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    let output_dir = args.output.unwrap_or_else(|| config.output.dir.clone());
    let selections: Vec<Selection> = args.types.iter().copied().map(Into::into).collect();

    let client = FinlexClient::new(ClientConfig {
        base_url: config.http.base_url.clone(),
        pace: Duration::from_secs_f64(args.sleep.unwrap_or(config.http.sleep_seconds)),
        max_retries: config.http.max_retries,
        timeout: Duration::from_secs(config.http.timeout_seconds),
    });

    let run_config = RunConfig {
        output_dir: output_dir.clone(),
        selections,
        years: args.years,
        year_overrides: YearOverrides {
            act: args.years_act,
            judgment: args.years_judgment,
            doc: args.years_doc,
            authority_regulation: args.years_authority_regulation,
        },
        lang_and_version: args.lang.unwrap_or_else(|| config.listing.lang.clone()),
        limit: args.limit.unwrap_or(config.listing.limit),
        max_pages: args.max_pages,
        fetch_pdf: args.pdf,
        fetch_zip: args.zip,
        fetch_media: args.media,
        force: args.force,
        dry_run: args.dry_run,
        resume: args.resume,
        reset: args.reset,
    };

    log::info!("Output directory: {}", output_dir.display());
    log::info!(
        "Document types: {}",
        run_config
            .selections
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    log::info!("Language: {}", run_config.lang_and_version);

    let summary = runner::run(&client, &run_config, progress)?;

    print_summary(
        "Fetch",
        &[
            ("Outcomes", summary.counts.total.to_string()),
            ("Success", summary.counts.success.to_string()),
            ("Skipped", summary.counts.skipped.to_string()),
            ("Errors", summary.counts.error.to_string()),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );

    if summary.interrupted {
        return Ok(ExitCode::from(130));
    }
    if summary.counts.error > 0 {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}
