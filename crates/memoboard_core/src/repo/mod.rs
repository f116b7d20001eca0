//! Persistence gateway abstractions and implementations.
//!
//! # Responsibility
//! - Define the durable-storage contract consumed by the note store.
//! - Isolate SQLite query details from store orchestration.
//!
//! # Invariants
//! - Gateway writes must enforce `Note::validate()` before persistence.
//! - Gateway APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod note_gateway;
