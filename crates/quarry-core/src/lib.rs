//! Quarry Core: shared types, traits, and errors.
//!
//! This crate provides the foundational types used across all Quarry crates.
//! It has no internal Quarry dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`record`]: Records, field values, and record type schemas
//! - [`store`]: The record storage collaborator contract
//! - [`state`]: Index lifecycle state tracking

pub mod error;
pub mod record;
pub mod state;
pub mod store;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use record::{
    Derivation, FieldKind, FieldSource, FieldValue, IndexedField, PrimaryKey, Record, RecordType,
};
pub use state::{IndexState, IndexStateHandle};
pub use store::{MemoryStore, RecordStore};
