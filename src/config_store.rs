//! Persistence of the category configuration.
//!
//! The configuration file is a JSON object whose keys are category names and
//! whose values are arrays of extensions:
//!
//! ```json
//! {
//!     "Images": [".jpg", ".png"],
//!     "Documents": [".pdf"]
//! }
//! ```
//!
//! Key order is preserved and defines the category order. Saving writes to a
//! temporary file next to the target and then renames it over the target, so
//! a failed save never leaves a truncated file behind.

use crate::category::{ConfigEditError, Configuration};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Failure to read or parse a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("configuration {} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("configuration {} is malformed: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// Failure to write a configuration file. The previous file is left intact.
#[derive(Debug, Error)]
pub enum ConfigSaveError {
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The top-level entries of a configuration file, in file order and with
/// repeated names kept.
struct CategoryEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for CategoryEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = CategoryEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of categories")
            }

            fn visit_map<A>(self, mut map: A) -> Result<CategoryEntries, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, serde_json::Value>()? {
                    entries.push(entry);
                }
                Ok(CategoryEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Loads and saves [`Configuration`] values.
pub struct ConfigStore;

impl ConfigStore {
    /// Reads the configuration stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file is absent, `Io` if it cannot be read,
    /// `Parse` if it is not JSON and `Malformed` if it is not an object of
    /// string arrays or breaks a category invariant.
    pub fn load(path: &Path) -> Result<Configuration, ConfigLoadError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ConfigLoadError::NotFound(path.to_path_buf())
            } else {
                ConfigLoadError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let json: Value = serde_json::from_str(&content).map_err(|e| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        let malformed = |reason: String| ConfigLoadError::Malformed {
            path: path.to_path_buf(),
            reason,
        };

        if !json.is_object() {
            return Err(malformed(
                "top level must be an object of categories".to_string(),
            ));
        }
        // A JSON object collapses repeated keys, so read the entries again in
        // file order to catch a category defined twice.
        let CategoryEntries(entries) =
            serde_json::from_str(&content).map_err(|e| ConfigLoadError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut rules: Vec<(String, Vec<String>)> = Vec::with_capacity(entries.len());
        for (name, value) in &entries {
            let items = value
                .as_array()
                .ok_or_else(|| malformed(format!("category '{}' must map to an array", name)))?;
            let extensions = items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        malformed(format!("category '{}' contains a non-string entry", name))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rules.push((name.clone(), extensions));
        }

        Configuration::from_rules(rules).map_err(|e: ConfigEditError| malformed(e.to_string()))
    }

    /// Loads the configuration at `path`, falling back to the built-in defaults.
    pub fn load_or_default(path: &Path) -> Configuration {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "using default categories");
                Self::default()
            }
        }
    }

    /// Writes `config` to `path` atomically.
    ///
    /// # Errors
    ///
    /// Returns `ConfigSaveError::Io` if the temporary file cannot be created,
    /// written, or moved over `path`.
    pub fn save(config: &Configuration, path: &Path) -> Result<(), ConfigSaveError> {
        let mut object = Map::new();
        for rule in config.rules() {
            let extensions = rule
                .extensions()
                .iter()
                .cloned()
                .map(Value::String)
                .collect();
            object.insert(rule.name().to_string(), Value::Array(extensions));
        }
        let json_string = serde_json::to_string_pretty(&Value::Object(object))?;

        let io_err = |source: io::Error| ConfigSaveError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json_string.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// The built-in category mapping.
    pub fn default() -> Configuration {
        Configuration::default()
    }
}
