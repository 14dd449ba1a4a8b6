//! Startup connection to the configured record store.
//!
//! # Responsibility
//! - Load credential material for the Sheets backend, exchanging
//!   service-account keys for access tokens.
//! - Open the configured backend and hand out roster books over it.
//!
//! # Invariants
//! - Any failure here is fatal for the front-end that requested it.
//! - `book()` borrows the backend; no global store handle exists.

use crate::config::{BackendKind, RosterConfig};
use crate::db::open_db;
use crate::repo::google_auth::ServiceAccountKey;
use crate::repo::google_sheet::{build_agent, SheetsClient, SheetsClientConfig};
use crate::repo::memory_sheet::MemoryWorksheet;
use crate::repo::roster_book::{RosterBook, LOGS_TAB, STUDENTS_TAB};
use crate::repo::sqlite_sheet::SqliteWorksheet;
use crate::repo::worksheet::{RepoError, RepoResult, Worksheet};
use log::{error, info};
use rusqlite::Connection;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Roster book over a type-erased backend.
pub type DynRosterBook<'a> = RosterBook<Box<dyn Worksheet + 'a>>;

#[derive(Debug)]
pub enum ConnectionError {
    CredentialsMissing(PathBuf),
    InvalidCredentials(String),
    Store(RepoError),
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CredentialsMissing(path) => {
                write!(f, "credential file not found: {}", path.display())
            }
            Self::InvalidCredentials(message) => write!(f, "invalid credentials: {message}"),
            Self::Store(err) => write!(f, "failed to connect to record store: {err}"),
        }
    }
}

impl Error for ConnectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ConnectionError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Deserialize)]
struct CredentialFile {
    access_token: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Resolves a bearer token from a credential file.
///
/// A service-account key (`"type": "service_account"`) is exchanged at its
/// `token_uri` for a token granting
/// [`SHEETS_SCOPES`](crate::repo::google_sheet::SHEETS_SCOPES). A file with
/// an `access_token` field is used as is.
///
/// # Errors
/// - `CredentialsMissing` when `path` is not a file.
/// - `InvalidCredentials` when the file is unreadable, malformed or its key
///   cannot sign.
/// - `Store` when the token endpoint rejects the exchange.
pub fn load_access_token(path: &Path, agent: &ureq::Agent) -> Result<String, ConnectionError> {
    if !path.is_file() {
        return Err(ConnectionError::CredentialsMissing(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|err| {
        ConnectionError::InvalidCredentials(format!("failed to read {}: {err}", path.display()))
    })?;
    let invalid = |err: serde_json::Error| {
        ConnectionError::InvalidCredentials(format!("{}: {err}", path.display()))
    };
    let file: CredentialFile = serde_json::from_str(&text).map_err(invalid)?;

    if let Some(token) = file
        .access_token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
    {
        return Ok(token);
    }
    if file.kind.as_deref() != Some("service_account") {
        return Err(ConnectionError::InvalidCredentials(format!(
            "{} is neither a service-account key nor has an `access_token` field",
            path.display()
        )));
    }

    let key: ServiceAccountKey = serde_json::from_str(&text).map_err(invalid)?;
    let assertion = key
        .sign_assertion(chrono::Utc::now().timestamp())
        .map_err(|err| {
            ConnectionError::InvalidCredentials(format!(
                "failed to sign with the key in {}: {err}",
                path.display()
            ))
        })?;
    Ok(key.exchange_assertion(agent, &assertion)?)
}

/// An open record store.
pub enum RosterBackend {
    Sqlite(Connection),
    Sheets(SheetsClient),
    Memory {
        students: MemoryWorksheet,
        logs: MemoryWorksheet,
    },
}

impl RosterBackend {
    /// Opens the backend selected by `config`.
    ///
    /// # Errors
    /// - `CredentialsMissing` / `InvalidCredentials` for the Sheets backend.
    /// - `Store` when the database or spreadsheet cannot be opened.
    pub fn connect(config: &RosterConfig) -> Result<Self, ConnectionError> {
        info!(
            "event=store_connect module=connection status=start backend={}",
            config.backend.as_str()
        );
        let result = match config.backend {
            BackendKind::Sqlite => open_db(&config.db_path)
                .map(Self::Sqlite)
                .map_err(|err| ConnectionError::Store(err.into())),
            BackendKind::Sheets => connect_sheets(config).map(Self::Sheets),
            BackendKind::Memory => Ok(Self::in_memory()),
        };

        match &result {
            Ok(_) => info!(
                "event=store_connect module=connection status=ok backend={}",
                config.backend.as_str()
            ),
            Err(err) => error!(
                "event=store_connect module=connection status=error backend={} error={err}",
                config.backend.as_str()
            ),
        }
        result
    }

    pub fn in_memory() -> Self {
        Self::Memory {
            students: MemoryWorksheet::new(STUDENTS_TAB),
            logs: MemoryWorksheet::new(LOGS_TAB),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Sqlite(_) => BackendKind::Sqlite,
            Self::Sheets(_) => BackendKind::Sheets,
            Self::Memory { .. } => BackendKind::Memory,
        }
    }

    /// Opens the students and audit tabs.
    pub fn book(&self) -> RepoResult<DynRosterBook<'_>> {
        match self {
            Self::Sqlite(conn) => RosterBook::open(
                boxed(SqliteWorksheet::try_new(conn, STUDENTS_TAB)?),
                boxed(SqliteWorksheet::try_new(conn, LOGS_TAB)?),
            ),
            Self::Sheets(client) => RosterBook::open(
                boxed(client.sheet1()?),
                boxed(client.worksheet(LOGS_TAB)?),
            ),
            Self::Memory { students, logs } => RosterBook::open(boxed(students), boxed(logs)),
        }
    }
}

fn boxed<'a, W: Worksheet + 'a>(sheet: W) -> Box<dyn Worksheet + 'a> {
    Box::new(sheet)
}

fn connect_sheets(config: &RosterConfig) -> Result<SheetsClient, ConnectionError> {
    let mut client_config = SheetsClientConfig::new(String::new());
    client_config.access_token = match &config.access_token {
        Some(token) => token.clone(),
        None => load_access_token(&config.credentials_path, &build_agent(&client_config))?,
    };
    let client = match &config.spreadsheet_id {
        Some(id) => SheetsClient::open_by_key(client_config, id)?,
        None => SheetsClient::open_by_name(client_config, &config.spreadsheet_name)?,
    };
    // Both tabs must exist before the front-end starts.
    client.sheet1()?;
    client.worksheet(LOGS_TAB)?;
    Ok(client)
}
