//! Environment-driven server configuration.
//!
//! # Invariants
//! - Every setting has a default; only malformed values are errors.
//! - `log_dir` is always absolute (relative values resolve against the
//!   working directory).

use addressbook_core::{default_log_level, MissingFilePolicy};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const ENV_HTTP_BIND: &str = "ADDRESSBOOK_HTTP_BIND";
pub const ENV_LOG_LEVEL: &str = "ADDRESSBOOK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ADDRESSBOOK_LOG_DIR";
pub const ENV_CONTACTS_BACKEND: &str = "ADDRESSBOOK_CONTACTS_BACKEND";
pub const ENV_CONTACTS_PATH: &str = "ADDRESSBOOK_CONTACTS_PATH";
pub const ENV_CUSTOMERS_BACKEND: &str = "ADDRESSBOOK_CUSTOMERS_BACKEND";
pub const ENV_CUSTOMERS_PATH: &str = "ADDRESSBOOK_CUSTOMERS_PATH";
pub const ENV_JSON_CREATE_IF_MISSING: &str = "ADDRESSBOOK_JSON_CREATE_IF_MISSING";

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_CONTACTS_PATH: &str = "data/contacts.json";
const DEFAULT_CUSTOMERS_PATH: &str = "data/customers.sqlite3";

/// Storage substrate for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Json,
    Sqlite,
}

/// Where and how one resource is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub log_level: String,
    pub log_dir: PathBuf,
    /// Store behind `/api/addressbook`.
    pub contacts: StoreConfig,
    /// Store behind `/api/customer`.
    pub customers: StoreConfig,
    pub json_missing_file: MissingFilePolicy,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    CurrentDir(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "invalid {key} value `{value}`; expected {expected}"),
            Self::CurrentDir(err) => write!(f, "failed to resolve working directory: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CurrentDir(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cwd: &Path,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_text = get(ENV_HTTP_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_text
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: ENV_HTTP_BIND,
                value: bind_text.clone(),
                expected: "a socket address such as 127.0.0.1:8080",
            })?;

        let log_level = get(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string());
        let log_dir = cwd.join(get(ENV_LOG_DIR).unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()));

        let contacts = StoreConfig {
            backend: parse_backend(ENV_CONTACTS_BACKEND, get(ENV_CONTACTS_BACKEND))?
                .unwrap_or(BackendKind::Json),
            path: PathBuf::from(
                get(ENV_CONTACTS_PATH).unwrap_or_else(|| DEFAULT_CONTACTS_PATH.to_string()),
            ),
        };
        let customers = StoreConfig {
            backend: parse_backend(ENV_CUSTOMERS_BACKEND, get(ENV_CUSTOMERS_BACKEND))?
                .unwrap_or(BackendKind::Sqlite),
            path: PathBuf::from(
                get(ENV_CUSTOMERS_PATH).unwrap_or_else(|| DEFAULT_CUSTOMERS_PATH.to_string()),
            ),
        };

        let json_missing_file = match parse_bool(
            ENV_JSON_CREATE_IF_MISSING,
            get(ENV_JSON_CREATE_IF_MISSING),
        )? {
            Some(true) => MissingFilePolicy::Create,
            _ => MissingFilePolicy::Skip,
        };

        Ok(Self {
            bind,
            log_level,
            log_dir,
            contacts,
            customers,
            json_missing_file,
        })
    }
}

fn parse_backend(
    key: &'static str,
    value: Option<String>,
) -> Result<Option<BackendKind>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "json" => Ok(Some(BackendKind::Json)),
        "sqlite" => Ok(Some(BackendKind::Sqlite)),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            expected: "json|sqlite",
        }),
    }
}

fn parse_bool(key: &'static str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(Some(true)),
        "0" | "false" | "off" | "no" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            expected: "true|false",
        }),
    }
}
