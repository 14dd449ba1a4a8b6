//! Runtime configuration resolved from environment variables.
//!
//! # Responsibility
//! - Pick the record store backend and its location.
//! - Resolve credential and log paths relative to the executable.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - Resolution never fails; problems surface when connecting.

use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_SPREADSHEET_NAME: &str = "Banco-Alunos";
pub const DEFAULT_DB_FILE_NAME: &str = "roster.sqlite3";
pub const DEFAULT_CREDENTIALS_FILE_NAME: &str = "credentials.json";
/// Older deployments ship the key under this name.
pub const LEGACY_CREDENTIALS_FILE_NAME: &str = "credenciais.json";
pub const DEFAULT_LOG_DIR_NAME: &str = "logs";

pub const ENV_BACKEND: &str = "ROSTER_BACKEND";
pub const ENV_DB_PATH: &str = "ROSTER_DB_PATH";
pub const ENV_SPREADSHEET: &str = "ROSTER_SPREADSHEET";
pub const ENV_SPREADSHEET_ID: &str = "ROSTER_SPREADSHEET_ID";
pub const ENV_CREDENTIALS: &str = "ROSTER_CREDENTIALS";
pub const ENV_SHEETS_TOKEN: &str = "ROSTER_SHEETS_TOKEN";
pub const ENV_LOG_LEVEL: &str = "ROSTER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ROSTER_LOG_DIR";

/// Which record store the roster talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Google Sheets spreadsheet. The default.
    Sheets,
    /// Local SQLite file.
    Sqlite,
    /// Process-local, discarded on exit.
    Memory,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Sheets => "sheets",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "local" => Ok(Self::Sqlite),
            "sheets" | "google" | "gsheets" => Ok(Self::Sheets),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "unsupported backend `{other}`; expected sqlite|sheets|memory"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterConfig {
    pub backend: BackendKind,
    pub db_path: PathBuf,
    pub spreadsheet_name: String,
    pub spreadsheet_id: Option<String>,
    pub credentials_path: PathBuf,
    /// Token taking precedence over the credentials file.
    pub access_token: Option<String>,
    pub log_level: Option<String>,
    pub log_dir: PathBuf,
}

impl RosterConfig {
    /// Defaults rooted at `base_dir`.
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            backend: BackendKind::Sheets,
            db_path: base_dir.join(DEFAULT_DB_FILE_NAME),
            spreadsheet_name: DEFAULT_SPREADSHEET_NAME.to_string(),
            spreadsheet_id: None,
            credentials_path: default_credentials_path(base_dir),
            access_token: None,
            log_level: None,
            log_dir: base_dir.join(DEFAULT_LOG_DIR_NAME),
        }
    }

    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(&executable_dir(), |key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// - Returns an error when `ROSTER_BACKEND` names an unknown backend.
    pub fn from_lookup(
        base_dir: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::with_base_dir(base_dir);
        if let Some(backend) = var(ENV_BACKEND) {
            config.backend = backend.parse()?;
        }
        if let Some(path) = var(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(name) = var(ENV_SPREADSHEET) {
            config.spreadsheet_name = name;
        }
        config.spreadsheet_id = var(ENV_SPREADSHEET_ID);
        if let Some(path) = var(ENV_CREDENTIALS) {
            config.credentials_path = PathBuf::from(path);
        }
        config.access_token = var(ENV_SHEETS_TOKEN);
        config.log_level = var(ENV_LOG_LEVEL);
        if let Some(dir) = var(ENV_LOG_DIR) {
            config.log_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}

/// `credentials.json` under `base_dir`, unless only the legacy
/// `credenciais.json` is present.
pub fn default_credentials_path(base_dir: &Path) -> PathBuf {
    let preferred = base_dir.join(DEFAULT_CREDENTIALS_FILE_NAME);
    let legacy = base_dir.join(LEGACY_CREDENTIALS_FILE_NAME);
    if !preferred.is_file() && legacy.is_file() {
        legacy
    } else {
        preferred
    }
}

/// Directory holding the running executable, falling back to the working
/// directory.
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
