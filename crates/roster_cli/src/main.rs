//! Terminal front-end for the student roster.
//!
//! # Responsibility
//! - Resolve configuration (flags over environment over defaults).
//! - Connect to the record store; a connection failure ends the program.
//! - Hand stdin/stdout to the menu loop.

mod menu;

use anyhow::{Context, Result};
use clap::Parser;
use roster_core::{
    default_log_level, init_logging, BackendKind, RosterBackend, RosterConfig, StudentService,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "roster", version, about = "Student roster over a spreadsheet record store")]
struct Cli {
    /// Record store backend: sheets (default), sqlite or memory.
    #[arg(long)]
    backend: Option<BackendKind>,

    /// SQLite file used by the sqlite backend.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Spreadsheet name looked up through Drive.
    #[arg(long)]
    spreadsheet: Option<String>,

    /// Spreadsheet id; skips the name lookup.
    #[arg(long)]
    spreadsheet_id: Option<String>,

    /// Credential file holding an access token.
    #[arg(long)]
    credentials: Option<PathBuf>,

    #[arg(long)]
    log_level: Option<String>,

    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn apply(self, mut config: RosterConfig) -> RosterConfig {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(path) = self.db_path {
            config.db_path = path;
        }
        if let Some(name) = self.spreadsheet {
            config.spreadsheet_name = name;
        }
        if self.spreadsheet_id.is_some() {
            config.spreadsheet_id = self.spreadsheet_id;
        }
        if let Some(path) = self.credentials {
            config.credentials_path = path;
        }
        if self.log_level.is_some() {
            config.log_level = self.log_level;
        }
        if let Some(dir) = self.log_dir {
            config.log_dir = dir;
        }
        config
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Critical error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = RosterConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("invalid environment configuration")?;
    let config = Cli::parse().apply(config);

    let level = config.log_level.as_deref().unwrap_or(default_log_level());
    let log_dir = std::path::absolute(&config.log_dir).unwrap_or_else(|_| config.log_dir.clone());
    if let Err(err) = init_logging(level, &log_dir.to_string_lossy()) {
        eprintln!("warning: diagnostics disabled: {err}");
    }

    let backend = RosterBackend::connect(&config).context("failed to connect")?;
    let book = backend.book().context("failed to open roster tabs")?;
    let service = StudentService::new(book);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();
    menu::run_menu(&service, &mut input, &mut out).context("terminal i/o failed")
}
