use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, bail};
use buy_vs_rent::{SimulationConfig, run};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Compare buying a home on a mortgage with renting and investing the difference
#[derive(Parser)]
#[command(name = "buy-vs-rent", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation and print the result as JSON
    Run {
        /// JSON configuration file. Missing fields take their defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },
    /// Print the default configuration as JSON
    Defaults,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli.command) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn execute(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run { config, compact } => {
            let config = match config {
                Some(path) => read_config(&path)?,
                None => SimulationConfig::default(),
            };
            let result = run(&config)?;
            info!(
                years = result.records.len(),
                buy_advantage = %result.buy_advantage(),
                "simulation complete"
            );
            print_json(&result, compact)
        }
        Commands::Defaults => print_json(&SimulationConfig::default(), false),
    }
}

/// Reads a JSON configuration file.
fn read_config(path: &Path) -> anyhow::Result<SimulationConfig> {
    if !path.is_file() {
        bail!("configuration file not found: {}", path.display());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse '{}'", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T, compact: bool) -> anyhow::Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}
