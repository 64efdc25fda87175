//! Record store contract and its storage adapters.
//!
//! # Responsibility
//! - Define the email-keyed CRUD contract (`ContactRepository`).
//! - Provide a JSON-file adapter and a SQLite adapter with identical
//!   observable behavior.
//!
//! # Invariants
//! - Repository writes must enforce `Contact::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateEmail`) in
//!   addition to storage errors.

pub mod contact_repo;
pub mod json_repo;
pub mod sqlite_repo;
