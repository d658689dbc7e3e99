//! `kariyer` — report job-application outcomes and browse reply rates.
//!
//! # Usage
//!
//! ```
//! kariyer signup --email ada@example.com
//! kariyer add --company "Acme" --role "Backend" --status NoReply --wait 2-4w
//! kariyer companies --search acme
//! kariyer company Acme
//! ```

mod commands;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use commands::Command;
use settings::{CliConfig, expand_tilde};
use kariyer_core::{repository::ExperienceRepository, session::SessionManager};
use kariyer_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kariyer", version, about = "Share and compare company reply rates")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "kariyer.toml")]
  config: PathBuf,

  /// SQLite file to use; overrides `store_path` from the config.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so command output stays clean.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let cfg = CliConfig::load(&cli.config)?;
  let store_path = expand_tilde(&cli.store.unwrap_or(cfg.store_path));

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  let mut sessions = SessionManager::new(store.clone());
  sessions
    .restore_session()
    .await
    .context("failed to restore session")?;
  let repo = ExperienceRepository::new(store);

  let mut stdout = std::io::stdout().lock();
  commands::run(cli.command, &mut sessions, &repo, &mut stdout).await
}
