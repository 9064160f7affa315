//! Handler functions for `quarry config` subcommands.
//!
//! `config get` reads from the effective configuration rather than the raw
//! file: `backends` includes the implicit `default` entry, and record types
//! and their fields are addressed by name.
//!
//! ```text
//! quarry config get backends.default.backend
//! quarry config get record_types.Page.fields.title.boost
//! ```

use std::path::PathBuf;

use quarry_core::{Error, Result};
use quarry_fts::{BackendConfig, BackendKind};
use serde::Serialize;
use toml::{Table, Value};

use crate::cli::ConfigAction;
use crate::config::{FieldConfig, QuarryConfig, RecordTypeConfig};

/// Handle a config subcommand.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = QuarryConfig::resolve_config_path(config_path)
                .ok_or_else(|| Error::config("Could not determine config directory"))?;
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist; run `quarry config init` to create it)");
            }
        }
        ConfigAction::Get { key } => {
            let config = QuarryConfig::load(config_path)?;
            println!("{}", config_value(&config, &key)?);
        }
        ConfigAction::Init { file, force } => {
            let path = init_config(file.as_deref(), force)?;
            println!("Config file created at {}", path.display());
        }
    }
    Ok(())
}

/// Render the value at dotted `key` in the effective configuration.
pub fn config_value(config: &QuarryConfig, key: &str) -> Result<String> {
    let view = effective_view(config)?;
    let value = lookup(&view, key).ok_or_else(|| {
        let known: Vec<&str> = view.keys().map(String::as_str).collect();
        Error::config(format!(
            "Key '{key}' not found in configuration (top-level keys: {})",
            known.join(", ")
        ))
    })?;

    let label = key.rsplit('.').next().unwrap_or(key);
    render(label, value)
}

/// Write the starter configuration to `file` or the default location.
pub fn init_config(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => QuarryConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let toml_str = starter_config().to_toml_string()?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(path)
}

/// One database backend and one example record type.
fn starter_config() -> QuarryConfig {
    let mut config = QuarryConfig {
        records: Some(PathBuf::from("records.json")),
        ..Default::default()
    };
    config.backends.insert(
        "default".to_string(),
        BackendConfig::new(BackendKind::Database.locator()),
    );
    config.record_types.push(RecordTypeConfig {
        name: "Page".to_string(),
        parent: None,
        fields: vec![FieldConfig {
            name: "title".to_string(),
            kind: Default::default(),
            attribute: None,
            constant: None,
            searchable: true,
            filterable: false,
            boost: None,
        }],
    });
    config
}

/// The configuration as `load` callers see it.
fn effective_view(config: &QuarryConfig) -> Result<Table> {
    let mut view = Table::new();
    if let Some(records) = &config.records {
        view.insert(
            "records".to_string(),
            Value::String(records.display().to_string()),
        );
    }
    view.insert(
        "backends".to_string(),
        to_value(config.backend_registry().entries())?,
    );
    let record_types = config
        .record_types
        .iter()
        .map(|rt| Ok((rt.name.clone(), to_value(rt)?)))
        .collect::<Result<Table>>()?;
    view.insert("record_types".to_string(), Value::Table(record_types));
    Ok(view)
}

/// Walk a dotted key. Array entries are addressed by their `name`, or by
/// position.
fn lookup<'a>(view: &'a Table, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let first = view.get(parts.next()?)?;
    parts.try_fold(first, |current, part| match current {
        Value::Table(table) => table.get(part),
        Value::Array(items) => items
            .iter()
            .find(|item| item.get("name").and_then(Value::as_str) == Some(part))
            .or_else(|| part.parse::<usize>().ok().and_then(|i| items.get(i))),
        _ => None,
    })
}

fn render(label: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Table(_) | Value::Array(_) => {
            let mut wrapper = Table::new();
            wrapper.insert(label.to_string(), value.clone());
            toml::to_string_pretty(&wrapper).map_err(|e| Error::config(e.to_string()))
        }
        other => Ok(other.to_string()),
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    Value::try_from(value).map_err(|e| Error::config(e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
