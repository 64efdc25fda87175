//! Store wiring for the HTTP layer.

use crate::config::{BackendKind, ServerConfig, StoreConfig};
use addressbook_core::{
    ContactRepository, ContactService, JsonContactRepository, MissingFilePolicy,
    PersistenceError, RecordKind, RepoResult, SqliteContactRepository,
};
use log::info;
use std::fs;
use std::sync::Arc;

/// Service shared by every request for one resource.
pub type SharedService = Arc<ContactService<Arc<dyn ContactRepository>>>;

/// Services behind each routed resource.
#[derive(Clone)]
pub struct AppState {
    pub contacts: SharedService,
    pub customers: SharedService,
}

impl AppState {
    /// Opens both configured stores.
    pub fn open(config: &ServerConfig) -> RepoResult<Self> {
        let contacts = open_store(&config.contacts, RecordKind::Contact, config.json_missing_file)?;
        let customers =
            open_store(&config.customers, RecordKind::Customer, config.json_missing_file)?;
        Ok(Self::from_repositories(contacts, customers))
    }

    pub fn from_repositories(
        contacts: Arc<dyn ContactRepository>,
        customers: Arc<dyn ContactRepository>,
    ) -> Self {
        Self {
            contacts: Arc::new(ContactService::new(contacts)),
            customers: Arc::new(ContactService::new(customers)),
        }
    }
}

fn open_store(
    store: &StoreConfig,
    kind: RecordKind,
    policy: MissingFilePolicy,
) -> RepoResult<Arc<dyn ContactRepository>> {
    let repo: Arc<dyn ContactRepository> = match store.backend {
        BackendKind::Json => Arc::new(JsonContactRepository::open(kind, &store.path, policy)?),
        BackendKind::Sqlite => {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            Arc::new(SqliteContactRepository::open(&store.path, kind)?)
        }
    };

    info!(
        "event=store_open module=server status=ok kind={} backend={:?}",
        kind.noun(),
        store.backend
    );
    Ok(repo)
}

#[cfg(test)]
mod tests {
    use super::AppState;
    use crate::config::{BackendKind, ServerConfig, StoreConfig};
    use addressbook_core::{Contact, MissingFilePolicy, RecordKind};

    #[test]
    fn open_wires_each_resource_to_its_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            log_level: "info".to_string(),
            log_dir: dir.path().join("logs"),
            contacts: StoreConfig {
                backend: BackendKind::Json,
                path: dir.path().join("data").join("contacts.json"),
            },
            customers: StoreConfig {
                backend: BackendKind::Sqlite,
                path: dir.path().join("db").join("customers.sqlite3"),
            },
            json_missing_file: MissingFilePolicy::Create,
        };

        let state = AppState::open(&config).unwrap();
        assert_eq!(state.contacts.kind(), RecordKind::Contact);
        assert_eq!(state.customers.kind(), RecordKind::Customer);

        state
            .customers
            .create_contact(&Contact::new("Ken", "Barlow", None, "ken@corrie.co.uk"))
            .unwrap();
        assert!(config.contacts.path.exists());
        assert!(config.customers.path.exists());
    }
}
