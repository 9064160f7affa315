//! TOML configuration for the `quarry` binary.
//!
//! ```toml
//! records = "records.json"
//!
//! [backends.default]
//! backend = "quarry_fts::database::DatabaseSearch"
//! index_path = "/var/lib/quarry/index"
//!
//! [[record_types]]
//! name = "Page"
//!
//! [[record_types.fields]]
//! name = "title"
//! filterable = true
//! boost = 2.0
//!
//! [[record_types.fields]]
//! name = "live"
//! kind = "boolean"
//! ```
//!
//! Resolution order for the file: `--config`, then `$QUARRY_CONFIG`, then
//! `<config dir>/quarry/config.toml`.

use std::path::{Path, PathBuf};

use quarry_core::record::{FieldKind, FieldValue, IndexedField, RecordType};
use quarry_core::store::MemoryStore;
use quarry_core::{Error, Result};
use quarry_fts::{BackendRegistry, BackendsConfig};
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "QUARRY_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarryConfig {
    /// JSON file of stored records that seeds the record store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<PathBuf>,

    /// Short backend name → locator and options.
    #[serde(default)]
    pub backends: BackendsConfig,

    /// Searchable record types.
    #[serde(default)]
    pub record_types: Vec<RecordTypeConfig>,
}

/// One searchable record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTypeConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// One indexed field.
///
/// `searchable` and `filterable` add to what the kind enables by default:
/// text fields are searchable, boolean and integer fields filterable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
    /// Stored attribute to read, when it differs from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// Index this value for every record instead of reading an attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<FieldValue>,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f32>,
}

impl FieldConfig {
    /// Build the field descriptor.
    pub fn to_field(&self) -> IndexedField {
        let mut field = match (&self.constant, self.kind) {
            (Some(constant), kind) => {
                let constant = constant.clone();
                IndexedField::derived(&self.name, kind, move |_| constant.clone())
            }
            (None, FieldKind::Text) => IndexedField::text(&self.name),
            (None, FieldKind::Boolean) => IndexedField::boolean(&self.name),
            (None, FieldKind::Integer) => IndexedField::integer(&self.name),
        };
        if let (Some(attribute), None) = (&self.attribute, &self.constant) {
            field = field.from_attribute(attribute);
        }
        if self.searchable {
            field = field.searchable();
        }
        if self.filterable {
            field = field.filterable();
        }
        if let Some(boost) = self.boost {
            field = field.boost(boost);
        }
        field
    }
}

impl RecordTypeConfig {
    /// Build the schema descriptor.
    pub fn to_record_type(&self) -> RecordType {
        let mut record_type = RecordType::new(&self.name);
        if let Some(parent) = &self.parent {
            record_type = record_type.child_of(parent);
        }
        self.fields
            .iter()
            .fold(record_type, |rt, field| rt.field(field.to_field()))
    }
}

impl QuarryConfig {
    /// Load configuration from the resolved path.
    ///
    /// A missing file at the implicit default location yields the default
    /// configuration; a missing explicit file is an error.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let explicit = config_path.is_some() || std::env::var_os(CONFIG_ENV).is_some();
        let Some(path) = Self::resolve_config_path(config_path) else {
            log::debug!("No config directory on this platform, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            if explicit {
                return Err(Error::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let mut config = Self::from_file(&path)?;
        config.resolve_relative_paths(&path);
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_toml(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parse TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// The file `load` would read.
    pub fn resolve_config_path(config_path: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = config_path {
            return Some(PathBuf::from(path));
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// `<config dir>/quarry/config.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("quarry").join("config.toml"))
    }

    /// Backend registry over the configured entries, with `default` mapped
    /// to the database backend unless configured otherwise.
    pub fn backend_registry(&self) -> BackendRegistry {
        let mut entries = BackendRegistry::default().entries().clone();
        entries.extend(self.backends.clone());
        BackendRegistry::new(entries)
    }

    /// Configured record types, in declaration order.
    pub fn record_types(&self) -> Vec<RecordType> {
        self.record_types
            .iter()
            .map(RecordTypeConfig::to_record_type)
            .collect()
    }

    /// Record store seeded from the `records` file, or empty.
    pub fn record_store(&self) -> Result<MemoryStore> {
        match &self.records {
            Some(path) => MemoryStore::load_json(path),
            None => Ok(MemoryStore::new()),
        }
    }

    fn resolve_relative_paths(&mut self, config_file: &Path) {
        let Some(base) = config_file.parent() else {
            return;
        };
        if let Some(records) = &self.records
            && records.is_relative()
        {
            self.records = Some(base.join(records));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
