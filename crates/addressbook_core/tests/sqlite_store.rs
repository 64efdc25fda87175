use addressbook_core::db::migrations::latest_version;
use addressbook_core::db::open_db;
use addressbook_core::{Contact, ContactRepository, RecordKind, RepoError, SqliteContactRepository};
use rusqlite::Connection;

fn rita() -> Contact {
    Contact::new("Rita", "Sullivan", Some("01913478555"), "rita.sullivan@corrie.co.uk")
}

#[test]
fn committed_writes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customers.sqlite3");
    {
        let repo = SqliteContactRepository::open(&path, RecordKind::Customer).unwrap();
        repo.create_contact(&rita()).unwrap();
        repo.create_contact(&Contact::new("Ken", "Barlow", None, "ken.barlow@corrie.co.uk"))
            .unwrap();
        repo.delete_contact("ken.barlow@corrie.co.uk").unwrap();
    }

    let reopened = SqliteContactRepository::open(&path, RecordKind::Customer).unwrap();
    assert_eq!(reopened.list_contacts().unwrap(), vec![rita()]);
}

#[test]
fn separate_connections_share_the_uniqueness_guarantee() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customers.sqlite3");
    let first = SqliteContactRepository::open(&path, RecordKind::Customer).unwrap();
    let second = SqliteContactRepository::open(&path, RecordKind::Customer).unwrap();

    first.create_contact(&rita()).unwrap();

    let mut shouting = rita();
    shouting.email = "RITA.SULLIVAN@CORRIE.CO.UK".to_string();
    let err = second.create_contact(&shouting).unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateEmail {
            kind: RecordKind::Customer,
            ..
        }
    ));
    assert_eq!(second.get_contact("rita.sullivan@corrie.co.uk").unwrap(), rita());
}

#[test]
fn email_key_column_holds_lowercased_email() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customers.sqlite3");
    let repo = SqliteContactRepository::open(&path, RecordKind::Customer).unwrap();
    repo.create_contact(&Contact::new("Ken", "Barlow", None, "Ken.Barlow@Corrie.co.uk"))
        .unwrap();

    let conn = open_db(&path).unwrap();
    let (email, key): (String, String) = conn
        .query_row("SELECT email, email_key FROM customers;", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(email, "Ken.Barlow@Corrie.co.uk");
    assert_eq!(key, "ken.barlow@corrie.co.uk");
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteContactRepository::try_new(conn, RecordKind::Contact) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_record_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteContactRepository::try_new(conn, RecordKind::Customer);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("customers"))
    ));
}

#[test]
fn repository_rejects_connection_missing_email_key_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE contacts (
            id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            phone TEXT,
            email TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteContactRepository::try_new(conn, RecordKind::Contact);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "contacts",
            column: "email_key"
        })
    ));
}
