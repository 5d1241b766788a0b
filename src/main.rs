//! Playstats CLI
//!
//! Runs the statistics engine over a JSON snapshot of the media library:
//! - Run: compute field updates and playlists
//! - Check: validate every token of a configuration
//! - Config: print the default configuration

use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use playstats::{generate_default_config, Config, Engine, EngineError, LoggingConfig, TokenError};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "playstats")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Play statistics and smart playlists for a media library")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: searched in the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute statistics and playlists for a library snapshot
    Run {
        /// JSON library snapshot
        #[arg(short, long)]
        library: PathBuf,
        /// Reference time (default: now). Supports ISO 8601 and "YYYY-MM-DD"
        #[arg(long)]
        now: Option<String>,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration and every token it uses
    Check {
        /// Reference time (default: now)
        #[arg(long)]
        now: Option<String>,
    },

    /// Print the default configuration
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_default(),
    };
    init_logging(&config.logging);

    match cli.command {
        Commands::Run {
            library,
            now,
            output,
        } => {
            let now = parse_now(now.as_deref())?;
            let engine = Engine::new(&config, now).context("Invalid configuration")?;
            let report = engine
                .run_snapshot(&library)
                .with_context(|| format!("Run over {} failed", library.display()))?;

            let json = serde_json::to_string_pretty(&report)?;
            write_output(output.as_deref(), &json)?;
            tracing::info!("{}", report);

            if report.total_events == 0 {
                tracing::error!(
                    field = %config.engine.history_field,
                    "No play events found; check the history field and format"
                );
                std::process::exit(1);
            }
        }

        Commands::Check { now } => {
            let now = parse_now(now.as_deref())?;
            match Engine::new(&config, now) {
                Ok(engine) => {
                    println!(
                        "Configuration OK: {} tokens, {} playlists",
                        engine.tokens().len(),
                        engine.playlists().len()
                    );
                }
                Err(EngineError::Token(TokenError::Invalid(errors))) => {
                    eprintln!("Invalid tokens in configuration:");
                    for e in errors {
                        eprintln!("  {}", e);
                    }
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            write_output(output.as_deref(), &generate_default_config())?;
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("playstats={}", config.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_now(value: Option<&str>) -> anyhow::Result<NaiveDateTime> {
    let Some(s) = value else {
        return Ok(chrono::Local::now().naive_local());
    };

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    bail!("Invalid reference time: {}", s)
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
