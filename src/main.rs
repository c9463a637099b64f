//! Binary entry point for shelfscan.
//!
//! Reads decoder output line by line, deduplicates it and keeps a persisted
//! scan history.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use shelfscan::catalog::{Catalog, StaticCatalog};
use shelfscan::config::ShelfscanConfig;
use shelfscan::observability::{self, CounterRegistry, InitOptions};
use shelfscan::rendering::{
    Feedback, JsonLinesSink, NoFeedback, PresentationSink, TerminalBell, TerminalSink,
};
use shelfscan::services::{Recorder, ScanSession, compute_stats_now};
use shelfscan::source::LineSource;
use shelfscan::storage::{FilesystemStore, HistoryStore};
use shelfscan::{ScanHistory, ScanStats};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Shelfscan - barcode scan history for the terminal.
#[derive(Parser)]
#[command(name = "shelfscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Record scans from decoder output (stdin by default).
    ///
    /// Accepts JSON lines, zbar `TYPE:DATA` lines or bare codes.
    Scan {
        /// Read decoder output from a file instead of stdin.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print only the newest record after each scan.
        #[arg(long)]
        compact: bool,

        /// Emit JSON lines instead of text.
        #[arg(long)]
        json: bool,

        /// Do not ring the terminal bell.
        #[arg(long)]
        no_bell: bool,
    },

    /// Show the scan history.
    History {
        /// Print the history as JSON.
        #[arg(long)]
        json: bool,

        /// Maximum number of records to show.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show total, today and found counters.
    Stats {
        /// Print the counters as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Clear the scan history.
    Clear {
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Look up a code in the product catalog.
    Lookup {
        /// The barcode to look up.
        code: String,
    },

    /// Show the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match ShelfscanConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(
        &config.logging,
        InitOptions {
            verbose: cli.verbose,
        },
    ) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Scan {
            input,
            compact,
            json,
            no_bell,
        } => cmd_scan(&config, input, compact, json, no_bell).await,
        Commands::History { json, limit } => cmd_history(&config, json, limit),
        Commands::Stats { json } => cmd_stats(&config, json),
        Commands::Clear { yes } => cmd_clear(&config, yes),
        Commands::Lookup { code } => cmd_lookup(&code),
        Commands::Config => cmd_config(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Opens the history store named by the config.
fn open_store(config: &ShelfscanConfig) -> FilesystemStore {
    FilesystemStore::in_dir(&config.data_dir, &config.history_file)
}

/// Loads the persisted history, truncated to the configured cap.
fn load_history(config: &ShelfscanConfig) -> ScanHistory {
    let mut history = open_store(config).load();
    history.truncate(config.history_cap);
    history
}

/// Runs a scan session over decoder output.
async fn cmd_scan(
    config: &ShelfscanConfig,
    input: Option<PathBuf>,
    compact: bool,
    json: bool,
    no_bell: bool,
) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead + Send> = match &input {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path)
                .with_context(|| format!("cannot open input {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let sink: Box<dyn PresentationSink> = if json {
        Box::new(JsonLinesSink::new(io::stdout()))
    } else {
        Box::new(TerminalSink::new(io::stdout()).with_compact(compact))
    };
    let feedback: Box<dyn Feedback> = if config.feedback.bell && !no_bell && !json {
        Box::new(TerminalBell)
    } else {
        Box::new(NoFeedback)
    };

    let counters = CounterRegistry::new();
    if let Err(e) = counters.install() {
        tracing::warn!(error = %e, "Scan counters unavailable");
    }

    let mut session = ScanSession::open(
        config,
        Box::new(open_store(config)),
        Arc::new(StaticCatalog::builtin()),
        sink,
        feedback,
    );

    let stop = session.stop_handle();
    ctrlc::set_handler(move || stop.request_stop()).context("cannot install Ctrl-C handler")?;

    let mut source = LineSource::new(reader);
    let events = session.start(&mut source)?;
    let accepted = session.run(events).await;
    session.stop(&mut source);

    let stats = session.stats();
    let decoded = counters.get("scan_events_total");
    tracing::info!(
        accepted,
        decoded,
        rejected = counters.total("scan_rejected_total"),
        total = stats.total,
        "Scan session finished"
    );
    for (key, value) in counters.snapshot() {
        tracing::debug!(counter = %key, value, "Scan counter");
    }
    eprintln!(
        "Recorded {accepted} new scan(s) from {decoded} decode(s). Total: {}  Today: {}  Found: {}",
        stats.total, stats.today, stats.found
    );
    Ok(())
}

/// Prints the persisted history.
fn cmd_history(config: &ShelfscanConfig, json: bool, limit: Option<usize>) -> anyhow::Result<()> {
    let history = load_history(config);

    if json {
        let records: Vec<_> = history.iter().take(limit.unwrap_or(usize::MAX)).collect();
        let out = serde_json::to_string_pretty(&records).context("cannot serialize history")?;
        println!("{out}");
        return Ok(());
    }

    let mut sink = TerminalSink::new(io::stdout()).with_limit(limit);
    sink.render_history(&history)?;
    Ok(())
}

/// Prints the counters.
fn cmd_stats(config: &ShelfscanConfig, json: bool) -> anyhow::Result<()> {
    let stats: ScanStats = compute_stats_now(&load_history(config));

    if json {
        println!(
            "{}",
            serde_json::to_string(&stats).context("cannot serialize stats")?
        );
    } else {
        let mut sink = TerminalSink::new(io::stdout());
        sink.render_stats(&stats)?;
    }
    Ok(())
}

/// Clears the history after confirmation.
fn cmd_clear(config: &ShelfscanConfig, yes: bool) -> anyhow::Result<()> {
    if !yes && !confirm("Are you sure you want to clear all scan history?")? {
        eprintln!("Aborted.");
        return Ok(());
    }

    let mut recorder = Recorder::open(
        config.history_cap,
        Box::new(open_store(config)),
        Arc::new(StaticCatalog::builtin()),
        Box::new(TerminalSink::new(io::stdout())),
        Box::new(NoFeedback),
    );
    recorder.clear();
    Ok(())
}

/// Prints the catalog entry for a code.
fn cmd_lookup(code: &str) -> anyhow::Result<()> {
    let code = code.trim();
    if code.is_empty() {
        bail!("code must not be empty");
    }

    match StaticCatalog::builtin().lookup(code) {
        Some(product) => {
            println!("{}", product.name);
            println!("  Price: {}", product.price);
            println!("  Brand: {}", product.brand);
            println!("  {}", product.description);
        },
        None => println!("No product found for {code}"),
    }
    Ok(())
}

/// Prints the effective configuration.
fn cmd_config(config: &ShelfscanConfig) -> anyhow::Result<()> {
    let dedup = &config.dedup;
    let mut out = io::stdout().lock();

    writeln!(out, "history file:    {}", config.history_path().display())?;
    writeln!(out, "history cap:     {}", config.history_cap)?;
    writeln!(out, "min code length: {}", dedup.min_code_length)?;
    writeln!(
        out,
        "max error:       {}",
        dedup
            .max_error
            .map_or_else(|| "off".to_string(), |e| e.to_string())
    )?;
    writeln!(out, "confirmations:   {}", dedup.confirmations)?;
    writeln!(
        out,
        "cooldown:        {}",
        dedup.cooldown.map_or_else(
            || "until another code".to_string(),
            |d| format!("{}ms", d.as_millis())
        )
    )?;
    writeln!(
        out,
        "camera:          {} {} (min {}) @ {}fps",
        config.media.facing_mode, config.media.ideal, config.media.min, config.media.frame_rate
    )?;
    writeln!(out, "bell:            {}", config.feedback.bell)?;
    writeln!(
        out,
        "logging:         {} {}",
        config.logging.format, config.logging.level
    )?;
    Ok(())
}

/// Asks a yes/no question on stderr.
fn confirm(question: &str) -> anyhow::Result<bool> {
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("cannot read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
