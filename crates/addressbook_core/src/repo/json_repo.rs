//! JSON-file record store.
//!
//! # Responsibility
//! - Keep the full record collection in memory behind one lock.
//! - Mirror the collection to a JSON array file after every mutation.
//!
//! # Invariants
//! - The write lock is held across check, mutation and file write.
//! - Mutations are applied to a copy and swapped in only after the write
//!   succeeded, so a failed write leaves the collection unchanged.
//! - File rewrites go through a sibling `.tmp` file and a rename.
//! - A store without a destination never touches the filesystem.

use crate::model::contact::{Contact, RecordKind};
use crate::repo::contact_repo::{
    duplicate, not_found, require_lookup_key, ContactRepository, PersistenceError, RepoError,
    RepoResult,
};
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What to do when the configured file does not exist at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingFilePolicy {
    /// Start empty and keep mutations in memory only.
    #[default]
    Skip,
    /// Create the file (and parent directories) and persist every mutation.
    Create,
}

/// Record store backed by an in-memory list and a JSON file mirror.
pub struct JsonContactRepository {
    kind: RecordKind,
    destination: Option<PathBuf>,
    contacts: RwLock<Vec<Contact>>,
}

impl JsonContactRepository {
    /// Opens a store over `path`.
    ///
    /// An existing file is loaded as the initial collection; an empty file
    /// counts as an empty collection. A missing file is handled per `policy`.
    ///
    /// # Errors
    /// - `InvalidData` when the file is not a record array, holds a record
    ///   missing a required field, or holds two records with the same email.
    /// - `Persistence` when the file cannot be read or created.
    pub fn open(
        kind: RecordKind,
        path: impl Into<PathBuf>,
        policy: MissingFilePolicy,
    ) -> RepoResult<Self> {
        let path = path.into();
        let started_at = Instant::now();

        let contacts = match fs::read_to_string(&path) {
            Ok(text) => parse_contacts(&path, &text)?,
            Err(err) if err.kind() == ErrorKind::NotFound => match policy {
                MissingFilePolicy::Skip => {
                    warn!(
                        "event=json_store_open module=repo status=ok kind={} persist=skipped reason=file_missing",
                        kind.noun()
                    );
                    return Ok(Self::in_memory(kind));
                }
                MissingFilePolicy::Create => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                            path: parent.to_path_buf(),
                            source,
                        })?;
                    }
                    write_atomically(&path, &[])?;
                    Vec::new()
                }
            },
            Err(source) => {
                error!(
                    "event=json_store_open module=repo status=error kind={} error_code=read_failed error={}",
                    kind.noun(),
                    source
                );
                return Err(PersistenceError::Io { path, source }.into());
            }
        };

        info!(
            "event=json_store_open module=repo status=ok kind={} records={} duration_ms={}",
            kind.noun(),
            contacts.len(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            kind,
            destination: Some(path),
            contacts: RwLock::new(contacts),
        })
    }

    /// Creates an empty store with no file mirror.
    pub fn in_memory(kind: RecordKind) -> Self {
        Self {
            kind,
            destination: None,
            contacts: RwLock::new(Vec::new()),
        }
    }

    /// File that mutations are written to, if any.
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Runs `apply` on a copy of the collection, persists the copy and
    /// commits it. `apply` returns the index of the touched record, which is
    /// read back from the committed collection.
    fn mutate(
        &self,
        op: &'static str,
        apply: impl FnOnce(&mut Vec<Contact>) -> RepoResult<Option<usize>>,
    ) -> RepoResult<Option<Contact>> {
        let mut guard = self.contacts.write();
        let mut next = guard.clone();
        let touched = apply(&mut next)?;
        self.persist(op, &next)?;
        *guard = next;
        Ok(touched.and_then(|index| guard.get(index).cloned()))
    }

    fn persist(&self, op: &'static str, contacts: &[Contact]) -> RepoResult<()> {
        let Some(path) = self.destination.as_deref() else {
            debug!(
                "event=json_persist module=repo status=skipped kind={} op={op}",
                self.kind.noun()
            );
            return Ok(());
        };

        let started_at = Instant::now();
        match write_atomically(path, contacts) {
            Ok(()) => {
                debug!(
                    "event=json_persist module=repo status=ok kind={} op={op} records={} duration_ms={}",
                    self.kind.noun(),
                    contacts.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=json_persist module=repo status=error kind={} op={op} duration_ms={} error={}",
                    self.kind.noun(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

impl ContactRepository for JsonContactRepository {
    fn kind(&self) -> RecordKind {
        self.kind
    }

    fn create_contact(&self, candidate: &Contact) -> RepoResult<Contact> {
        candidate.validate()?;
        let key = candidate.email_key();

        self.mutate("create", |contacts| {
            if contacts.iter().any(|c| c.email_key() == key) {
                return Err(duplicate(self.kind, &candidate.email));
            }
            contacts.push(candidate.clone());
            Ok(Some(contacts.len() - 1))
        })?
        .ok_or_else(|| RepoError::InvalidData("created record missing on read-back".to_string()))
    }

    fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        Ok(self.contacts.read().clone())
    }

    fn get_contact(&self, email: &str) -> RepoResult<Contact> {
        let key = require_lookup_key(self.kind, email)?;
        self.contacts
            .read()
            .iter()
            .find(|c| c.email_key() == key)
            .cloned()
            .ok_or_else(|| not_found(self.kind, email))
    }

    fn update_contact(&self, email: &str, candidate: &Contact) -> RepoResult<Contact> {
        let key = require_lookup_key(self.kind, email)?;
        candidate.validate()?;
        let new_key = candidate.email_key();

        self.mutate("update", |contacts| {
            let index = contacts
                .iter()
                .position(|c| c.email_key() == key)
                .ok_or_else(|| not_found(self.kind, email))?;
            let taken = contacts
                .iter()
                .enumerate()
                .any(|(other, c)| other != index && c.email_key() == new_key);
            if taken {
                return Err(duplicate(self.kind, &candidate.email));
            }
            contacts[index] = candidate.clone();
            Ok(Some(index))
        })?
        .ok_or_else(|| RepoError::InvalidData("updated record missing on read-back".to_string()))
    }

    fn delete_contact(&self, email: &str) -> RepoResult<()> {
        let key = require_lookup_key(self.kind, email)?;

        self.mutate("delete", |contacts| {
            let index = contacts
                .iter()
                .position(|c| c.email_key() == key)
                .ok_or_else(|| not_found(self.kind, email))?;
            contacts.remove(index);
            Ok(None)
        })
        .map(|_| ())
    }
}

fn parse_contacts(path: &Path, text: &str) -> RepoResult<Vec<Contact>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let contacts: Option<Vec<Contact>> = serde_json::from_str(text).map_err(|err| {
        RepoError::InvalidData(format!("`{}` is not a record array: {err}", path.display()))
    })?;
    let contacts = contacts.unwrap_or_default();

    let mut seen = HashSet::with_capacity(contacts.len());
    for (index, contact) in contacts.iter().enumerate() {
        contact.validate().map_err(|err| {
            RepoError::InvalidData(format!(
                "record {index} in `{}` is invalid: {err}",
                path.display()
            ))
        })?;
        if !seen.insert(contact.email_key()) {
            return Err(RepoError::InvalidData(format!(
                "record {index} in `{}` repeats email `{}`",
                path.display(),
                contact.email
            )));
        }
    }

    Ok(contacts)
}

fn write_atomically(path: &Path, contacts: &[Contact]) -> RepoResult<()> {
    let json = serde_json::to_string_pretty(contacts).map_err(PersistenceError::Json)?;
    let temp_path = temp_path_for(path);

    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    });

    if let Err(source) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
        .into());
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("records"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::{parse_contacts, temp_path_for};
    use crate::repo::contact_repo::RepoError;
    use std::path::Path;

    #[test]
    fn temp_path_is_a_sibling() {
        assert_eq!(
            temp_path_for(Path::new("/data/contacts.json")),
            Path::new("/data/contacts.json.tmp")
        );
    }

    #[test]
    fn blank_and_null_documents_are_empty() {
        let path = Path::new("contacts.json");
        assert!(parse_contacts(path, "  \n").unwrap().is_empty());
        assert!(parse_contacts(path, "null").unwrap().is_empty());
    }

    #[test]
    fn case_insensitive_duplicates_are_rejected_on_load() {
        let text = r#"[
            {"firstName":"David","lastName":"Platt","email":"david.platt@corrie.co.uk"},
            {"firstName":"Dave","lastName":"Platt","email":"DAVID.PLATT@corrie.co.uk"}
        ]"#;
        let err = parse_contacts(Path::new("contacts.json"), text).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("record 1")));
    }

    #[test]
    fn records_missing_required_fields_are_rejected_on_load() {
        let text = r#"[{"firstName":"Ken","email":"ken.barlow@corrie.co.uk"}]"#;
        let err = parse_contacts(Path::new("contacts.json"), text).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("lastName")));
    }
}
