//! SQLite record store.
//!
//! # Responsibility
//! - Express each record operation as SQL against a per-kind table.
//! - Commit every mutation in its own transaction before returning.
//!
//! # Invariants
//! - `email_key` carries a UNIQUE constraint; a constraint failure is the
//!   authoritative duplicate signal, the pre-insert lookup only a fast path.
//! - Reads query the table directly; create/update results are re-read
//!   after commit.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory};
use crate::model::contact::{email_key, Contact, RecordKind};
use crate::repo::contact_repo::{
    duplicate, not_found, require_lookup_key, ContactRepository, RepoError, RepoResult,
};
use log::debug;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 6] = ["id", "first_name", "last_name", "phone", "email", "email_key"];

/// Record store over one SQLite table.
pub struct SqliteContactRepository {
    kind: RecordKind,
    conn: Mutex<Connection>,
}

impl SqliteContactRepository {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema does
    ///   not carry the record table for `kind`.
    pub fn try_new(conn: Connection, kind: RecordKind) -> RepoResult<Self> {
        ensure_connection_ready(&conn, kind)?;
        Ok(Self {
            kind,
            conn: Mutex::new(conn),
        })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>, kind: RecordKind) -> RepoResult<Self> {
        Self::try_new(open_db(path)?, kind)
    }

    /// Opens a private in-memory database and wraps it.
    pub fn open_in_memory(kind: RecordKind) -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?, kind)
    }

    fn table(&self) -> &'static str {
        self.kind.table_name()
    }

    fn map_write_error(&self, err: rusqlite::Error, email: &str) -> RepoError {
        if is_unique_violation(&err) {
            return duplicate(self.kind, email);
        }
        err.into()
    }
}

impl ContactRepository for SqliteContactRepository {
    fn kind(&self) -> RecordKind {
        self.kind
    }

    fn create_contact(&self, candidate: &Contact) -> RepoResult<Contact> {
        candidate.validate()?;
        let key = candidate.email_key();
        let table = self.table();

        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if find_id(&tx, table, &key)?.is_some() {
            return Err(duplicate(self.kind, &candidate.email));
        }
        tx.execute(
            &format!(
                "INSERT INTO {table} (first_name, last_name, phone, email, email_key)
                 VALUES (?1, ?2, ?3, ?4, ?5);"
            ),
            params![
                candidate.first_name.as_str(),
                candidate.last_name.as_str(),
                candidate.phone.as_deref(),
                candidate.email.as_str(),
                key.as_str(),
            ],
        )
        .map_err(|err| self.map_write_error(err, &candidate.email))?;
        tx.commit()?;
        debug!("event=sqlite_write module=repo status=ok kind={} op=create", self.kind.noun());

        load_by_key(&conn, table, &key)?.ok_or_else(|| {
            RepoError::InvalidData(format!("created row missing from {table} on read-back"))
        })
    }

    fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        let table = self.table();
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{} ORDER BY id ASC;", select_sql(table)))?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();

        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row, table)?);
        }

        Ok(contacts)
    }

    fn get_contact(&self, email: &str) -> RepoResult<Contact> {
        let key = require_lookup_key(self.kind, email)?;
        let conn = self.conn.lock();
        load_by_key(&conn, self.table(), &key)?.ok_or_else(|| not_found(self.kind, email))
    }

    fn update_contact(&self, email: &str, candidate: &Contact) -> RepoResult<Contact> {
        let key = require_lookup_key(self.kind, email)?;
        candidate.validate()?;
        let new_key = candidate.email_key();
        let table = self.table();

        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = find_id(&tx, table, &key)?.ok_or_else(|| not_found(self.kind, email))?;
        if matches!(find_id(&tx, table, &new_key)?, Some(other) if other != id) {
            return Err(duplicate(self.kind, &candidate.email));
        }
        tx.execute(
            &format!(
                "UPDATE {table}
                 SET
                    first_name = ?1,
                    last_name = ?2,
                    phone = ?3,
                    email = ?4,
                    email_key = ?5,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?6;"
            ),
            params![
                candidate.first_name.as_str(),
                candidate.last_name.as_str(),
                candidate.phone.as_deref(),
                candidate.email.as_str(),
                new_key.as_str(),
                id,
            ],
        )
        .map_err(|err| self.map_write_error(err, &candidate.email))?;
        tx.commit()?;
        debug!("event=sqlite_write module=repo status=ok kind={} op=update", self.kind.noun());

        load_by_id(&conn, table, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("updated row {id} missing from {table} on read-back"))
        })
    }

    fn delete_contact(&self, email: &str) -> RepoResult<()> {
        let key = require_lookup_key(self.kind, email)?;
        let table = self.table();

        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(&format!("DELETE FROM {table} WHERE email_key = ?1;"), [&key])?;
        if changed == 0 {
            return Err(not_found(self.kind, email));
        }
        tx.commit()?;
        debug!("event=sqlite_write module=repo status=ok kind={} op=delete", self.kind.noun());

        Ok(())
    }
}

fn select_sql(table: &str) -> String {
    format!("SELECT id, first_name, last_name, phone, email, email_key FROM {table}")
}

fn find_id(conn: &Connection, table: &str, key: &str) -> RepoResult<Option<i64>> {
    let id = conn
        .query_row(
            &format!("SELECT id FROM {table} WHERE email_key = ?1;"),
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn load_by_key(conn: &Connection, table: &str, key: &str) -> RepoResult<Option<Contact>> {
    let mut stmt = conn.prepare(&format!("{} WHERE email_key = ?1;", select_sql(table)))?;
    let mut rows = stmt.query([key])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_contact_row(row, table)?));
    }
    Ok(None)
}

fn load_by_id(conn: &Connection, table: &str, id: i64) -> RepoResult<Option<Contact>> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?1;", select_sql(table)))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_contact_row(row, table)?));
    }
    Ok(None)
}

fn parse_contact_row(row: &Row<'_>, table: &str) -> RepoResult<Contact> {
    let id: i64 = row.get("id")?;
    let contact = Contact {
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
    };

    contact.validate().map_err(|err| {
        RepoError::InvalidData(format!("row {id} in {table} is invalid: {err}"))
    })?;

    let stored_key: String = row.get("email_key")?;
    if stored_key != email_key(&contact.email) {
        return Err(RepoError::InvalidData(format!(
            "row {id} in {table} has email_key `{stored_key}` out of sync with its email"
        )));
    }

    Ok(contact)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn ensure_connection_ready(conn: &Connection, kind: RecordKind) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table = kind.table_name();
    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
