//! Contact use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for boundary callers.
//! - Delegate persistence to repository implementations.
//! - Emit one metadata-only log event per operation.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.
//! - Record field values are never logged.

use crate::model::contact::{Contact, RecordKind};
use crate::repo::contact_repo::{ContactRepository, RepoResult};
use log::{error, info, warn};
use std::time::Instant;

/// Use-case service wrapper for record CRUD operations.
pub struct ContactService<R: ContactRepository> {
    repo: R,
}

impl<R: ContactRepository> ContactService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Resource kind served by the underlying repository.
    pub fn kind(&self) -> RecordKind {
        self.repo.kind()
    }

    /// Creates a record, rejecting duplicates by email.
    pub fn create_contact(&self, candidate: &Contact) -> RepoResult<Contact> {
        self.observe("record_create", || self.repo.create_contact(candidate))
    }

    /// Lists every record in storage order.
    pub fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        self.observe("record_list", || self.repo.list_contacts())
    }

    /// Gets one record by case-insensitive email.
    pub fn get_contact(&self, email: &str) -> RepoResult<Contact> {
        self.observe("record_get", || self.repo.get_contact(email))
    }

    /// Replaces all fields of the record addressed by `email`.
    pub fn update_contact(&self, email: &str, candidate: &Contact) -> RepoResult<Contact> {
        self.observe("record_update", || self.repo.update_contact(email, candidate))
    }

    /// Deletes the record addressed by `email`.
    pub fn delete_contact(&self, email: &str) -> RepoResult<()> {
        self.observe("record_delete", || self.repo.delete_contact(email))
    }

    fn observe<T>(&self, event: &str, op: impl FnOnce() -> RepoResult<T>) -> RepoResult<T> {
        let started_at = Instant::now();
        let result = op();
        let kind = self.repo.kind().noun();
        let duration_ms = started_at.elapsed().as_millis();

        match &result {
            Ok(_) => info!(
                "event={event} module=service status=ok kind={kind} duration_ms={duration_ms}"
            ),
            Err(err) if err.is_persistence() => error!(
                "event={event} module=service status=error kind={kind} duration_ms={duration_ms} error_code={} error={}",
                err.code(),
                err
            ),
            Err(err) => warn!(
                "event={event} module=service status=rejected kind={kind} duration_ms={duration_ms} error_code={}",
                err.code()
            ),
        }

        result
    }
}
