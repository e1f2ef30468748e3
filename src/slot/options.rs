//! Flat engine option maps.
//!
//! Each slot runs with its own option map: the global options minus the keys
//! that configure the scheduler itself, overlaid with the slot's configuration
//! file. Nested TOML tables flatten to dotted keys (`[analysis] timeout = 5`
//! becomes `analysis.timeout = "5"`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{PortfolioError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineOptions {
    entries: BTreeMap<String, String>,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document into a flat option map.
    pub fn from_toml_str(source: &str) -> std::result::Result<Self, toml::de::Error> {
        let table: toml::Table = source.parse()?;
        let mut options = Self::new();
        flatten_into(&mut options.entries, "", &toml::Value::Table(table));
        Ok(options)
    }

    /// Load a slot configuration file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| PortfolioError::SlotConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source).map_err(|source| PortfolioError::SlotConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the isolated option map for one slot.
    ///
    /// The global map is copied, `scheduler_keys` are removed from the copy,
    /// and the slot file is overlaid on top. The global map is never mutated.
    pub fn isolated(global: &EngineOptions, scheduler_keys: &[String], slot_file: &Path) -> Result<Self> {
        let overlay = Self::load_file(slot_file)?;
        let mut options = global.clone();
        for key in scheduler_keys {
            options.entries.remove(key);
        }
        options.extend(overlay);
        Ok(options)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay another map; its values win on conflict.
    pub fn extend(&mut self, other: EngineOptions) {
        self.entries.extend(other.entries);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EngineOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn flatten_into(entries: &mut BTreeMap<String, String>, prefix: &str, value: &toml::Value) {
    match value {
        toml::Value::Table(table) => {
            for (key, nested) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(entries, &path, nested);
            }
        }
        toml::Value::Array(items) => {
            let joined = items.iter().map(scalar_to_string).collect::<Vec<_>>().join(",");
            entries.insert(prefix.to_string(), joined);
        }
        scalar => {
            entries.insert(prefix.to_string(), scalar_to_string(scalar));
        }
    }
}

fn scalar_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
