//! `lendlog`: equipment loan desk backed by a spreadsheet.
//!
//! # Usage
//!
//! ```text
//! lendlog                               # interactive grid
//! lendlog status
//! lendlog loan 7 --person 123456 --supervisor "Prof. Molina" --subject Physics
//! lendlog return 7 --comment "charger missing"
//! lendlog history 7
//! ```
//!
//! Configuration is read from `lendlog.toml` (or `--config`) and
//! `LENDLOG__SECTION__KEY` environment variables.

mod app;
mod commands;
mod settings;
mod tui;
mod ui;

use std::{
  fs::OpenOptions,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lendlog_core::submission::LoanCandidate;
use lendlog_desk::Desk;
use lendlog_sheets::SheetsClient;
use settings::AppConfig;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lendlog", version, about = "Equipment loan desk")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(
    short,
    long,
    value_name = "FILE",
    default_value = "lendlog.toml",
    env = "LENDLOG_CONFIG"
  )]
  config: PathBuf,

  /// Append logs to this file. Without it the TUI does not log.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,

  /// Override `sheets.roster_url`.
  #[arg(long)]
  roster_url: Option<String>,

  /// Override `sheets.log_url`.
  #[arg(long)]
  log_url: Option<String>,

  /// Override `sheets.form_url`.
  #[arg(long)]
  form_url: Option<String>,

  /// Override `sync.sync_interval_ms`, in seconds.
  #[arg(long, value_name = "SECS")]
  interval: Option<u64>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
  /// Interactive unit grid (default).
  Tui,
  /// Refresh once and print the state of every unit.
  Status,
  /// Lend a unit.
  Loan {
    unit:       String,
    #[arg(long)]
    person:     String,
    #[arg(long)]
    supervisor: String,
    #[arg(long)]
    subject:    String,
  },
  /// Take a unit back.
  Return {
    unit:    String,
    #[arg(long, default_value = "")]
    comment: String,
  },
  /// List a unit's movements, most recent first.
  History { unit: String },
}

impl Cli {
  fn apply_overrides(&self, config: &mut AppConfig) {
    if let Some(url) = &self.roster_url {
      config.sheets.roster_url = url.clone();
    }
    if let Some(url) = &self.log_url {
      config.sheets.log_url = url.clone();
    }
    if let Some(url) = &self.form_url {
      config.sheets.form_url = url.clone();
    }
    if let Some(secs) = self.interval {
      config.sync.sync_interval_ms = secs.saturating_mul(1000);
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let command = cli.command.clone().unwrap_or(Command::Tui);
  let _log_guard =
    init_tracing(cli.log_file.as_deref(), matches!(command, Command::Tui))?;

  let mut config = AppConfig::load(&cli.config)?;
  cli.apply_overrides(&mut config);
  config.sync.validate().context("invalid [sync] configuration")?;

  let client = SheetsClient::new(config.sheets)
    .context("invalid [sheets] configuration")?;
  let desk = Desk::new(client, config.sync);

  let result = match command {
    Command::Tui => tui::run(desk.clone()).await,
    Command::Status => commands::status(&desk).await,
    Command::Loan { unit, person, supervisor, subject } => {
      let candidate = LoanCandidate {
        unit_id:         unit,
        person_id:       person,
        supervisor_name: supervisor,
        subject,
      };
      commands::loan(&desk, candidate).await
    }
    Command::Return { unit, comment } => {
      commands::give_back(&desk, &unit, &comment).await
    }
    Command::History { unit } => commands::history(&desk, &unit).await,
  };

  desk.shutdown();
  result
}

/// Log to `log_file` when given, otherwise to stderr for one-shot commands
/// and nowhere for the TUI.
fn init_tracing(
  log_file: Option<&Path>,
  tui: bool,
) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  if let Some(path) = log_file {
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(path)
      .with_context(|| format!("opening log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(writer)
      .with_ansi(false)
      .init();
    Ok(Some(guard))
  } else if tui {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::sink)
      .init();
    Ok(None)
  } else {
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(std::io::stderr)
      .init();
    Ok(None)
  }
}
