//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate gateway and classifier calls into note intents.
//! - Keep presentation layers decoupled from storage and network details.

pub mod cosmetics;
pub mod enrichment;
pub mod note_store;
