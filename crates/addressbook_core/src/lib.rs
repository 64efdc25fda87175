//! Core domain logic for the address book service.
//! This crate is the single source of truth for record invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{email_key, Contact, ContactValidationError, RecordKind};
pub use repo::contact_repo::{ContactRepository, PersistenceError, RepoError, RepoResult};
pub use repo::json_repo::{JsonContactRepository, MissingFilePolicy};
pub use repo::sqlite_repo::SqliteContactRepository;
pub use service::contact_service::ContactService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
