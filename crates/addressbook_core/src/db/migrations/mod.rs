//! Numbered schema steps for the record tables.
//!
//! Step 1 creates the `contacts` and `customers` tables side by side, so a
//! freshly migrated file can serve either resource. `PRAGMA user_version`
//! holds the number of the last applied step; the repository's schema guard
//! compares against `latest_version()` before trusting a connection.
//!
//! Steps are append-only. Changing the shape of `email_key` (for instance
//! its folding rule) needs a new step that recomputes the column, since rows
//! whose stored key disagrees with the model are rejected on read.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_records.sql"),
}];

/// Schema version a fully migrated database reports.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to `latest_version()`.
///
/// Pending steps run in one transaction, so a failing step leaves the file at
/// its previous version. Up-to-date files are left untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    info!("event=db_migrate module=db status=start from_version={current_version} to_version={latest}");
    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;
    info!("event=db_migrate module=db status=ok version={latest}");

    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))
        .map_err(DbError::from)
}
