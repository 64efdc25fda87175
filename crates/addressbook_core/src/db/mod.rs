//! SQLite bootstrap for the relational record store.
//!
//! One database file may back both resources: address book entries live in
//! `contacts`, customers in `customers`, and each `SqliteContactRepository`
//! only ever touches the table named by its `RecordKind`. Both tables carry
//! an `email_key` column with a `UNIQUE` constraint, which is what keeps two
//! connections (or two processes) from admitting the same email twice.
//!
//! Connections handed out here have foreign keys on, a busy timeout so that
//! concurrent writers wait instead of failing with `SQLITE_BUSY`, and every
//! known migration applied. A file written by a newer binary is refused with
//! `DbError::UnsupportedSchemaVersion` rather than opened read-write.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
