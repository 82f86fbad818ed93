//! Mapper configuration via `docmap.toml`
//!
//! Settings are read once when the mapper is built. A default file can be
//! written next to the application with `write_default_if_missing`.

use docmap_core::{Error, Result};
use docmap_document::DEFAULT_POPULATE_CONCURRENCY;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "docmap.toml";

/// Mapper configuration loaded from `docmap.toml`.
///
/// # Example
///
/// ```toml
/// version_key = true
/// skip_empty_writes = true
/// populate_concurrency = 8
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Expose the storage version as `__v` in snapshots of stored documents.
    #[serde(default = "default_true")]
    pub version_key: bool,
    /// Skip the storage call when saving a persisted document with no changes.
    #[serde(default = "default_true")]
    pub skip_empty_writes: bool,
    /// Upper bound on concurrent fetches when populating several references.
    #[serde(default = "default_populate_concurrency")]
    pub populate_concurrency: usize,
}

fn default_true() -> bool {
    true
}

fn default_populate_concurrency() -> usize {
    DEFAULT_POPULATE_CONCURRENCY
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            version_key: true,
            skip_empty_writes: true,
            populate_concurrency: default_populate_concurrency(),
        }
    }
}

impl MapperConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# docmap configuration
#
# Show the storage version as "__v" in document snapshots (default: true)
version_key = true

# Skip the storage write when a saved document has no changes (default: true)
skip_empty_writes = true

# Maximum concurrent fetches when populating several references (default: 8)
populate_concurrency = 8
"#
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `populate_concurrency` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.populate_concurrency == 0 {
            return Err(Error::Config(
                "populate_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MapperConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{} ({})", msg, path.display())),
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
