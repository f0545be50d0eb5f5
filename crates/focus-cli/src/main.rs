//! Focus Replay - Main Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use focus_cli::{init_logging, replay};
use focus_engine::{EngineConfig, FocusEngine};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use tracing::{info, Level};

/// Replay recorded face observations through the focus engine
#[derive(Parser)]
#[command(name = "focus-replay")]
#[command(version)]
#[command(about = "Score recorded face observations tick by tick", long_about = None)]
struct Cli {
    /// Input file with one JSON record per line (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Engine configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the session summary after the last tick
    #[arg(long)]
    summary: bool,

    /// Seed for reproducible suggestion choice
    #[arg(long)]
    seed: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Maximum log level
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_json)?;

    info!("=== Focus Replay v{} ===", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let mut engine = match cli.seed {
        Some(seed) => FocusEngine::with_seed(config, seed)?,
        None => FocusEngine::new(config)?,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let stats = if cli.input.as_os_str() == "-" {
        replay(io::stdin().lock(), &mut out, &mut engine)?
    } else {
        let file = File::open(&cli.input)
            .with_context(|| format!("failed to open {}", cli.input.display()))?;
        replay(BufReader::new(file), &mut out, &mut engine)?
    };

    if cli.summary {
        let ended_at = stats.last_at.unwrap_or_else(chrono::Utc::now);
        let summary = engine.summary(ended_at);
        serde_json::to_writer(&mut out, &summary).context("failed to write summary")?;
        writeln!(out).context("failed to write summary")?;
    }

    Ok(())
}
