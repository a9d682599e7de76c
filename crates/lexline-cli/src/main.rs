//! lexline - Resumable downloader for the Finlex Open Data API
//!
//! Pages the document-listing endpoints, fetches Akoma Ntoso documents and
//! their companion assets, and checkpoints progress so interrupted runs can
//! resume where they stopped.

use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "lexline")]
#[command(about = "Download Akoma Ntoso documents from the Finlex Open Data API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./lexline.toml or ~/.config/lexline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Download documents with checkpointed resume
    Fetch(cmd::fetch::FetchArgs),
    /// Summarize an output directory's manifest and checkpoint
    Status(cmd::status::StatusArgs),
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(lexline_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — status lines show activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    lexline_core::init_logging(quiet, cli.debug, multi);

    setup_signal_handler();

    let config = match cli.config {
        Some(path) => Config::from_file(&path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Fetch(args) => cmd::fetch::run(args, &config, &progress),
        Command::Status(args) => cmd::status::run(args, &config),
        Command::Config => {
            print_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_signal_handler() {
    // First signal: set graceful interrupt flag so recorded work is kept
    // Second signal: force exit
    // SAFETY: AtomicBool::swap and process::exit are async-signal-safe
    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, || {
            if lexline_core::interrupt_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .expect("Failed to register SIGTERM handler");
        signal_hook::low_level::register(signal_hook::consts::SIGINT, || {
            if lexline_core::interrupt_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .expect("Failed to register SIGINT handler");
    }
}

fn print_config(config: &Config) {
    use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec!["Output directory", &config.output.dir.display().to_string()]);
    table.add_row(vec!["API base URL", &config.http.base_url]);
    table.add_row(vec![
        "Request pacing",
        &format!("{}s", config.http.sleep_seconds),
    ]);
    table.add_row(vec!["Max retries", &config.http.max_retries.to_string()]);
    table.add_row(vec![
        "Request timeout",
        &format!("{}s", config.http.timeout_seconds),
    ]);
    table.add_row(vec!["Language", &config.listing.lang]);
    table.add_row(vec!["Page size", &config.listing.limit.to_string()]);

    eprintln!("\n{table}");
}
