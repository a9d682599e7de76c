//! Status subcommand - summarize an output directory's manifest and checkpoint

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use lexline_finlex::runner::{CHECKPOINT_FILE, MANIFEST_FILE};
use lexline_finlex::{CheckpointStore, Manifest};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output directory to inspect
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: StatusArgs, config: &Config) -> Result<ExitCode> {
    let output_dir = args.output.unwrap_or_else(|| config.output.dir.clone());

    let manifest = Manifest::load(output_dir.join(MANIFEST_FILE));
    let summary = manifest.summary();

    let mut checkpoint = CheckpointStore::new(output_dir.join(CHECKPOINT_FILE));
    let has_checkpoint = checkpoint.load();
    let state = checkpoint.state();

    let checkpoint_row = if has_checkpoint {
        let pair = match (&state.current_category, &state.current_document_type) {
            (Some(category), Some(document_type)) => format!("{category}/{document_type}"),
            _ => "-".to_string(),
        };
        format!(
            "{} completed, {} page {}",
            state.completed_uris.len(),
            pair,
            state.current_page
        )
    } else {
        "none".to_string()
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Status").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    table.add_row(vec!["Output", &output_dir.display().to_string()]);
    table.add_row(vec!["Manifest entries", &summary.total.to_string()]);
    table.add_row(vec!["Success", &summary.success.to_string()]);
    table.add_row(vec!["Skipped", &summary.skipped.to_string()]);
    table.add_row(vec!["Errors", &summary.error.to_string()]);
    table.add_row(vec!["Checkpoint", &checkpoint_row]);
    if let Some(last_uri) = &state.last_uri {
        table.add_row(vec!["Last URI", last_uri]);
    }

    eprintln!("\n{table}");
    Ok(ExitCode::SUCCESS)
}
