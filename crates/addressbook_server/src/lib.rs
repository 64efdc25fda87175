//! HTTP boundary for the address book record stores.
//!
//! # Responsibility
//! - Map HTTP verbs and query parameters onto record store operations.
//! - Translate store outcomes into status codes.
//!
//! # Invariants
//! - Status-code mapping lives here; stores never see transport types.

pub mod config;
pub mod routes;
pub mod state;

pub use config::{BackendKind, ConfigError, ServerConfig, StoreConfig};
pub use routes::router;
pub use state::{AppState, SharedService};
