//! Domain model for address book records.
//!
//! # Responsibility
//! - Define the record shape shared by every storage backend.
//! - Own field validation and the email comparison rule.
//!
//! # Invariants
//! - Every record is identified by its email under `email_key`.

pub mod contact;
