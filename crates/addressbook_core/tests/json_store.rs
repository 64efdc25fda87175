use addressbook_core::{
    Contact, ContactRepository, JsonContactRepository, MissingFilePolicy, PersistenceError,
    RecordKind, RepoError,
};
use serde_json::Value;
use std::fs;
use std::path::Path;

fn david() -> Contact {
    Contact::new("David", "Platt", Some("01913478234"), "david.platt@corrie.co.uk")
}

fn ken() -> Contact {
    Contact::new("Ken", "Barlow", None, "ken.barlow@corrie.co.uk")
}

fn read_document(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn existing_file_is_loaded_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.json");
    fs::write(
        &path,
        r#"[
            {"firstName":"Ken","lastName":"Barlow","phone":null,"email":"ken.barlow@corrie.co.uk"},
            {"first_name":"Rita","last_name":"Sullivan","phone":"01913478555","email":"rita.sullivan@corrie.co.uk"}
        ]"#,
    )
    .unwrap();

    let repo = JsonContactRepository::open(RecordKind::Contact, &path, MissingFilePolicy::Skip)
        .unwrap();
    assert_eq!(repo.destination(), Some(path.as_path()));

    let listed = repo.list_contacts().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], ken());
    assert_eq!(listed[1].first_name, "Rita");
    assert_eq!(listed[1].phone.as_deref(), Some("01913478555"));
}

#[test]
fn every_mutation_rewrites_the_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.json");
    let repo = JsonContactRepository::open(RecordKind::Contact, &path, MissingFilePolicy::Create)
        .unwrap();
    assert_eq!(read_document(&path), serde_json::json!([]));

    repo.create_contact(&david()).unwrap();
    repo.create_contact(&ken()).unwrap();
    let document = read_document(&path);
    let records = document.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["firstName"], "David");
    assert_eq!(records[0]["lastName"], "Platt");
    assert_eq!(records[0]["phone"], "01913478234");
    assert_eq!(records[0]["email"], "david.platt@corrie.co.uk");
    assert_eq!(records[1]["phone"], Value::Null);

    let mut renamed = ken();
    renamed.email = "kenneth.barlow@corrie.co.uk".to_string();
    repo.update_contact("KEN.BARLOW@corrie.co.uk", &renamed).unwrap();
    assert_eq!(read_document(&path)[1]["email"], "kenneth.barlow@corrie.co.uk");

    repo.delete_contact("david.platt@corrie.co.uk").unwrap();
    let document = read_document(&path);
    assert_eq!(document.as_array().unwrap().len(), 1);
    assert_eq!(document[0]["firstName"], "Ken");

    assert!(!dir.path().join("contacts.json.tmp").exists());
}

#[test]
fn reopening_restores_persisted_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("contacts.json");
    {
        let repo =
            JsonContactRepository::open(RecordKind::Contact, &path, MissingFilePolicy::Create)
                .unwrap();
        repo.create_contact(&david()).unwrap();
        repo.create_contact(&ken()).unwrap();
    }

    let reopened = JsonContactRepository::open(RecordKind::Contact, &path, MissingFilePolicy::Skip)
        .unwrap();
    assert_eq!(reopened.list_contacts().unwrap(), vec![david(), ken()]);
}

#[test]
fn skip_policy_keeps_mutations_in_memory_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");

    let repo = JsonContactRepository::open(RecordKind::Contact, &path, MissingFilePolicy::Skip)
        .unwrap();
    assert_eq!(repo.destination(), None);

    repo.create_contact(&david()).unwrap();
    assert_eq!(repo.get_contact("David.Platt@corrie.co.uk").unwrap(), david());
    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn empty_file_opens_as_empty_store_and_is_persisted_to() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.json");
    fs::write(&path, "").unwrap();

    let repo = JsonContactRepository::open(RecordKind::Contact, &path, MissingFilePolicy::Skip)
        .unwrap();
    assert!(repo.list_contacts().unwrap().is_empty());

    repo.create_contact(&ken()).unwrap();
    assert_eq!(read_document(&path).as_array().unwrap().len(), 1);
}

#[test]
fn file_with_duplicate_emails_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.json");
    fs::write(
        &path,
        r#"[
            {"firstName":"Ken","lastName":"Barlow","email":"ken.barlow@corrie.co.uk"},
            {"firstName":"Kenneth","lastName":"Barlow","email":"Ken.Barlow@Corrie.co.uk"}
        ]"#,
    )
    .unwrap();

    let result = JsonContactRepository::open(RecordKind::Contact, &path, MissingFilePolicy::Skip);
    assert!(matches!(result, Err(RepoError::InvalidData(_))));
}

#[test]
fn malformed_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.json");
    fs::write(&path, r#"{"contacts": []}"#).unwrap();

    let result = JsonContactRepository::open(RecordKind::Contact, &path, MissingFilePolicy::Skip);
    assert!(matches!(result, Err(RepoError::InvalidData(_))));
}

#[test]
fn failed_write_leaves_state_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let path = data_dir.join("contacts.json");
    let repo = JsonContactRepository::open(RecordKind::Contact, &path, MissingFilePolicy::Create)
        .unwrap();
    repo.create_contact(&david()).unwrap();

    fs::remove_dir_all(&data_dir).unwrap();

    let err = repo.create_contact(&ken()).unwrap_err();
    assert!(err.is_persistence());
    assert!(matches!(
        err,
        RepoError::Persistence(PersistenceError::Io { .. })
    ));
    assert!(matches!(
        repo.delete_contact("david.platt@corrie.co.uk").unwrap_err(),
        RepoError::Persistence(_)
    ));

    assert_eq!(repo.list_contacts().unwrap(), vec![david()]);
    assert!(matches!(
        repo.get_contact("ken.barlow@corrie.co.uk").unwrap_err(),
        RepoError::NotFound { .. }
    ));
}
