//! Domain model for memory-board notes.
//!
//! # Responsibility
//! - Define the canonical note record shared by store, gateway and callers.
//! - Define emotion tags and the sentiment/color pair produced by enrichment.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - `sentiment` and `color` always come from the same enrichment result.

pub mod note;
pub mod sentiment;
