//! Common types for the FTS module.
//!
//! These types are used across all search backends and are always available
//! regardless of feature flags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Search query mode.
///
/// Controls how multiple search terms are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Smart mode: AND for 1-2 terms, OR for 3+.
    #[default]
    Smart,
    /// All terms must match (AND).
    And,
    /// Any term can match (OR).
    Or,
}

impl QueryMode {
    /// Whether every one of `term_count` terms must match.
    pub fn require_all(&self, term_count: usize) -> bool {
        match self {
            Self::And => true,
            Self::Or => false,
            Self::Smart => term_count <= 2,
        }
    }
}

/// Backend-specific options.
///
/// Domain implementations provide this to configure search behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendOptions {
    /// Directory for persisted index data. In-memory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_path: Option<String>,

    /// Default query mode.
    #[serde(default)]
    pub query_mode: QueryMode,

    /// Default result limit for callers that do not slice.
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Index writer memory budget in bytes (Tantivy only).
    #[serde(default = "default_writer_buffer_bytes")]
    pub writer_buffer_bytes: usize,
}

fn default_limit() -> usize {
    10
}

fn default_writer_buffer_bytes() -> usize {
    50_000_000
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            index_path: None,
            query_mode: QueryMode::default(),
            default_limit: default_limit(),
            writer_buffer_bytes: default_writer_buffer_bytes(),
        }
    }
}

/// One configured backend: a locator plus its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend locator, e.g. `quarry_fts::database::DatabaseSearch`.
    pub backend: String,

    /// Options passed to the backend on construction.
    #[serde(flatten)]
    pub options: BackendOptions,
}

impl BackendConfig {
    /// Create a config entry for `locator` with default options.
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            backend: locator.into(),
            options: BackendOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: BackendOptions) -> Self {
        self.options = options;
        self
    }
}

/// Short backend name → backend configuration.
pub type BackendsConfig = BTreeMap<String, BackendConfig>;

// ============================================================================
// Tests
// ============================================================================
