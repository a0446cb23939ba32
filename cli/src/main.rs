//! Trellis CLI - offline tooling for Trellis pages
//!
//! # Commands
//! - `trellis check <spec.json> [--page page.html]` - Validate an initializer spec
//! - `trellis apply --page page.html --zone id --payload reply.json` - Apply an update payload offline
//! - `trellis refresh --zone id --url /event` - Fetch a zone update from a live server

mod apply;
mod check;
mod refresh;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use trellis::RuntimeConfig;

/// Trellis CLI
#[derive(Parser)]
#[command(name = "trellis")]
#[command(author, version, about = "Command-line interface for Trellis pages")]
struct Cli {
    /// Runtime configuration (TOML); TRELLIS_* environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an initializer spec, optionally against a page
    Check {
        /// Initializer spec (JSON object of initializer name to invocations)
        spec: PathBuf,

        /// Page the spec is meant for; element ids are resolved against it
        #[arg(short, long)]
        page: Option<PathBuf>,
    },

    /// Apply an update payload to a zone of a saved page
    Apply {
        #[arg(short, long)]
        page: PathBuf,

        /// Zone element id
        #[arg(short, long)]
        zone: String,

        /// Update payload (JSON)
        #[arg(long)]
        payload: PathBuf,

        /// Initializer spec to run before the payload is applied
        #[arg(short, long)]
        init: Option<PathBuf>,

        /// Where to write the updated page (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load the configured location and refresh one of its zones
    Refresh {
        /// Zone element id
        #[arg(short, long)]
        zone: String,

        /// Component event url the zone is refreshed from
        #[arg(short, long)]
        url: String,

        /// Initializer spec to run after the page loads
        #[arg(short, long)]
        init: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    trellis::init_stdout_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { spec, page } => check::run_check_command(&spec, page.as_deref(), config),
        Commands::Apply {
            page,
            zone,
            payload,
            init,
            output,
        } => apply::run_apply_command(
            &page,
            &zone,
            &payload,
            init.as_deref(),
            output.as_deref(),
            config,
        ),
        Commands::Refresh { zone, url, init } => {
            refresh::run_refresh_command(&zone, &url, init.as_deref(), config)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    let config = match path {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    Ok(config.with_env_overrides())
}

pub(crate) fn read_json(path: &Path) -> Result<serde_json::Value> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("{} is not valid JSON", path.display()))
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Print what the page asked its host to do.
pub(crate) fn print_effects(effects: &[trellis::Effect]) {
    for effect in effects {
        eprintln!("  effect: {effect:?}");
    }
}
