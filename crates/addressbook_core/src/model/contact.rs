//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical record shared by the address book and customer
//!   resources.
//! - Provide field validation and the case-insensitive email key.
//!
//! # Invariants
//! - `first_name`, `last_name` and `email` are required; blank counts as
//!   missing.
//! - Email equality is decided by `email_key` only.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which resource a record belongs to.
///
/// Both kinds share one shape; the kind only selects storage location and
/// the noun used in user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Address book entry.
    Contact,
    /// Customer record.
    Customer,
}

impl RecordKind {
    /// Human-readable noun used in error messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Contact => "Contact",
            Self::Customer => "Customer",
        }
    }

    /// SQLite table holding records of this kind.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Contact => "contacts",
            Self::Customer => "customers",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.noun())
    }
}

/// One address book / customer record keyed by email.
///
/// Missing fields deserialize as empty strings so that callers get a
/// field-specific validation error instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, alias = "first_name")]
    pub first_name: String,
    #[serde(default, alias = "last_name")]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Natural key, compared case-insensitively.
    #[serde(default)]
    pub email: String,
}

/// Validation error for required contact fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactValidationError {
    MissingFirstName,
    MissingLastName,
    MissingEmail,
}

impl ContactValidationError {
    /// Wire name of the offending field.
    pub fn field(self) -> &'static str {
        match self {
            Self::MissingFirstName => "firstName",
            Self::MissingLastName => "lastName",
            Self::MissingEmail => "email",
        }
    }
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "the {} field is required", self.field())
    }
}

impl Error for ContactValidationError {}

impl Contact {
    /// Creates a contact from its four fields.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: Option<&str>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: phone.map(str::to_string),
            email: email.into(),
        }
    }

    /// Checks required fields, reporting the first missing one.
    ///
    /// Fields are checked in declaration order: first name, last name, email.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if is_blank(&self.first_name) {
            return Err(ContactValidationError::MissingFirstName);
        }
        if is_blank(&self.last_name) {
            return Err(ContactValidationError::MissingLastName);
        }
        if is_blank(&self.email) {
            return Err(ContactValidationError::MissingEmail);
        }
        Ok(())
    }

    /// Returns the lookup key for this record's email.
    pub fn email_key(&self) -> String {
        email_key(&self.email)
    }

    /// Returns whether `email` addresses this record.
    pub fn matches_email(&self, email: &str) -> bool {
        self.email_key() == email_key(email)
    }
}

/// Case-insensitive comparison key for an email address.
///
/// Each character is lowercased on its own, without the context-sensitive
/// final-sigma rule that `str::to_lowercase` applies.
pub fn email_key(email: &str) -> String {
    email.chars().flat_map(char::to_lowercase).collect()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
