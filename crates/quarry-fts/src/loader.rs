//! Backend registry and loader.
//!
//! Backends are a closed set of kinds, each reachable through one or more
//! locator strings (`quarry_fts::database::DatabaseSearch` or just the
//! module path `quarry_fts::database`). Configuration maps short names to a
//! locator plus options. [`get_backend`] resolves an identifier by short
//! name first, then as a locator, and either returns a fully constructed
//! backend or fails with [`Error::InvalidBackend`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use quarry_core::store::RecordStore;
use quarry_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::backend::SearchBackend;
use crate::database::DatabaseSearch;
use crate::types::{BackendConfig, BackendOptions, BackendsConfig};

/// Short name every configuration is expected to carry.
pub const DEFAULT_BACKEND: &str = "default";

const DATABASE_LOCATORS: &[&str] = &[
    "quarry_fts::database::DatabaseSearch",
    "quarry_fts::database",
];

const TANTIVY_LOCATORS: &[&str] = &[
    "quarry_fts::tantivy_search::TantivySearch",
    "quarry_fts::tantivy_search",
];

/// Concrete backend implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Embedded generational inverted index.
    Database,
    /// Tantivy index.
    Tantivy,
}

impl BackendKind {
    /// Every kind, available or not.
    pub const ALL: [BackendKind; 2] = [BackendKind::Database, BackendKind::Tantivy];

    /// Diagnostic name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Tantivy => "tantivy",
        }
    }

    /// Locator strings that resolve to this kind. The first is canonical.
    pub fn locators(&self) -> &'static [&'static str] {
        match self {
            Self::Database => DATABASE_LOCATORS,
            Self::Tantivy => TANTIVY_LOCATORS,
        }
    }

    /// Canonical locator.
    pub fn locator(&self) -> &'static str {
        self.locators()[0]
    }

    /// Whether this build can construct the kind.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Database => true,
            Self::Tantivy => cfg!(feature = "fts-tantivy"),
        }
    }

    /// Resolve a locator string to a kind.
    pub fn from_locator(locator: &str) -> Result<Self> {
        if !is_locator_syntax(locator) {
            return Err(Error::invalid_backend(
                locator,
                "not a short name or a `::`-separated locator",
            ));
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.locators().contains(&locator))
            .ok_or_else(|| Error::invalid_backend(locator, "no backend at this locator"))
    }

    /// Construct a backend of this kind.
    pub fn build(
        &self,
        options: BackendOptions,
        store: Arc<dyn RecordStore>,
    ) -> Result<Box<dyn SearchBackend>> {
        match self {
            Self::Database => Ok(Box::new(DatabaseSearch::new(options, store)?)),
            #[cfg(feature = "fts-tantivy")]
            Self::Tantivy => Ok(Box::new(crate::tantivy_search::TantivySearch::new(
                options, store,
            )?)),
            #[cfg(not(feature = "fts-tantivy"))]
            Self::Tantivy => Err(Error::invalid_backend(
                self.locator(),
                "built without the `fts-tantivy` feature",
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `::`-separated Rust identifiers, at least two segments.
fn is_locator_syntax(s: &str) -> bool {
    let segments: Vec<&str> = s.split("::").collect();
    segments.len() >= 2
        && segments.iter().all(|seg| {
            let mut chars = seg.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Read-only view of backend configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRegistry {
    entries: BackendsConfig,
}

impl Default for BackendRegistry {
    /// `default` → the database backend.
    fn default() -> Self {
        let mut entries = BackendsConfig::new();
        entries.insert(
            DEFAULT_BACKEND.to_string(),
            BackendConfig::new(BackendKind::Database.locator()),
        );
        Self { entries }
    }
}

impl BackendRegistry {
    /// Registry over configured entries.
    pub fn new(entries: BackendsConfig) -> Self {
        Self { entries }
    }

    /// Configuration of a short name.
    pub fn get(&self, name: &str) -> Option<&BackendConfig> {
        self.entries.get(name)
    }

    /// Configured short names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Every configured entry.
    pub fn entries(&self) -> &BackendsConfig {
        &self.entries
    }

    /// Resolve `identifier` to a kind and options without constructing.
    pub fn resolve(&self, identifier: &str) -> Result<(BackendKind, BackendOptions)> {
        if let Some(config) = self.entries.get(identifier) {
            let kind = BackendKind::from_locator(&config.backend).map_err(|e| {
                Error::invalid_backend(identifier, format!("configured locator is invalid: {e}"))
            })?;
            return Ok((kind, config.options.clone()));
        }
        let kind = BackendKind::from_locator(identifier)?;
        Ok((kind, BackendOptions::default()))
    }
}

/// Resolve and construct the backend named by `identifier`.
pub fn get_backend(
    identifier: &str,
    registry: &BackendRegistry,
    store: Arc<dyn RecordStore>,
) -> Result<Box<dyn SearchBackend>> {
    let (kind, options) = registry.resolve(identifier)?;
    if !kind.is_available() {
        return Err(Error::invalid_backend(
            identifier,
            format!("{kind} backend is not compiled into this build"),
        ));
    }

    let backend = kind.build(options, store).map_err(|e| match e {
        e @ Error::InvalidBackend { .. } => e,
        other => Error::invalid_backend(identifier, format!("construction failed: {other}")),
    })?;
    log::info!("Loaded {kind} search backend for '{identifier}'");
    Ok(backend)
}

/// Whether `dir` holds a persisted index of `kind`.
pub fn index_exists(kind: BackendKind, dir: &Path) -> bool {
    match kind {
        BackendKind::Database => crate::snapshot::Snapshot::exists_in(dir),
        BackendKind::Tantivy => dir.join("meta.json").exists(),
    }
}

// ============================================================================
// Tests
// ============================================================================
