//! Record store contract shared by every storage backend.
//!
//! # Responsibility
//! - Define the CRUD contract over email-keyed records.
//! - Define the error taxonomy returned by every adapter.
//! - Hold the precondition checks adapters must apply identically.
//!
//! # Invariants
//! - At most one stored record matches any email under `email_key`.
//! - A mutation reports success only after its durable write succeeded.

use crate::db::DbError;
use crate::model::contact::{email_key, Contact, ContactValidationError, RecordKind};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

pub type RepoResult<T> = Result<T, RepoError>;

/// Failure to make a mutation durable, or to read durable state.
#[derive(Debug)]
pub enum PersistenceError {
    Db(DbError),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::Io { path, source } => {
                write!(f, "failed to access `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "failed to encode records: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
        }
    }
}

/// Error returned by record store operations.
#[derive(Debug)]
pub enum RepoError {
    /// A required field is missing on the candidate record.
    Validation(ContactValidationError),
    /// The lookup email is empty or whitespace-only.
    InvalidKey { kind: RecordKind },
    /// Another record already owns this email.
    DuplicateEmail { kind: RecordKind, email: String },
    /// No record matches the lookup email.
    NotFound { kind: RecordKind, email: String },
    Persistence(PersistenceError),
    /// Durable state violates the record invariants.
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Stable identifier used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidKey { .. } => "invalid_key",
            Self::DuplicateEmail { .. } => "duplicate_email",
            Self::NotFound { .. } => "not_found",
            Self::Persistence(_) => "persistence",
            Self::InvalidData(_) => "invalid_data",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) | Self::MissingRequiredColumn { .. } => "schema_mismatch",
        }
    }

    /// Returns whether the failure lies in the storage substrate rather than
    /// in the caller's request.
    pub fn is_persistence(&self) -> bool {
        !matches!(
            self,
            Self::Validation(_)
                | Self::InvalidKey { .. }
                | Self::DuplicateEmail { .. }
                | Self::NotFound { .. }
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidKey { kind } => write!(f, "{kind} email cannot be null or empty"),
            Self::DuplicateEmail { kind, email } => {
                write!(f, "{kind} with the email: {email} already exists")
            }
            Self::NotFound { kind, email } => {
                write!(f, "{kind} with the email: {email} cannot be found")
            }
            Self::Persistence(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistenceError> for RepoError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Persistence(PersistenceError::Db(value))
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(PersistenceError::Db(DbError::Sqlite(value)))
    }
}

/// Record store contract.
///
/// Every adapter must produce the same observable outcome for the same call
/// sequence; only the storage substrate differs.
pub trait ContactRepository: Send + Sync {
    /// Resource kind served by this store.
    fn kind(&self) -> RecordKind;

    /// Stores a new record and returns it as read back from storage.
    fn create_contact(&self, candidate: &Contact) -> RepoResult<Contact>;

    /// Returns every record in storage order.
    fn list_contacts(&self) -> RepoResult<Vec<Contact>>;

    /// Returns the record whose email matches case-insensitively.
    fn get_contact(&self, email: &str) -> RepoResult<Contact>;

    /// Overwrites all fields of the record addressed by `email`.
    ///
    /// The candidate's email becomes the record's new key.
    fn update_contact(&self, email: &str, candidate: &Contact) -> RepoResult<Contact>;

    /// Removes the record addressed by `email`.
    fn delete_contact(&self, email: &str) -> RepoResult<()>;
}

impl<R: ContactRepository + ?Sized> ContactRepository for Arc<R> {
    fn kind(&self) -> RecordKind {
        (**self).kind()
    }

    fn create_contact(&self, candidate: &Contact) -> RepoResult<Contact> {
        (**self).create_contact(candidate)
    }

    fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        (**self).list_contacts()
    }

    fn get_contact(&self, email: &str) -> RepoResult<Contact> {
        (**self).get_contact(email)
    }

    fn update_contact(&self, email: &str, candidate: &Contact) -> RepoResult<Contact> {
        (**self).update_contact(email, candidate)
    }

    fn delete_contact(&self, email: &str) -> RepoResult<()> {
        (**self).delete_contact(email)
    }
}

/// Rejects blank lookup emails and returns the comparison key.
pub(crate) fn require_lookup_key(kind: RecordKind, email: &str) -> RepoResult<String> {
    if email.trim().is_empty() {
        return Err(RepoError::InvalidKey { kind });
    }
    Ok(email_key(email))
}

pub(crate) fn not_found(kind: RecordKind, email: &str) -> RepoError {
    RepoError::NotFound {
        kind,
        email: email.to_string(),
    }
}

pub(crate) fn duplicate(kind: RecordKind, email: &str) -> RepoError {
    RepoError::DuplicateEmail {
        kind,
        email: email.to_string(),
    }
}
