//! Configuration for the SCIM core.
//!
//! Configuration is plain data: where the schema registry is bootstrapped
//! from, and the limits applied to filter parsing. Everything has a working
//! default, and the whole structure can be deserialized from JSON.
//!
//! ```rust
//! use scim_core::config::{CoreConfig, SchemaSource};
//!
//! let config: CoreConfig = serde_json::from_str(
//!     r#"{ "filter": { "maxDepth": 8 }, "schemas": { "source": "embedded" } }"#,
//! ).unwrap();
//! assert_eq!(config.filter.max_depth, 8);
//! assert_eq!(config.schemas, SchemaSource::Embedded);
//! ```

use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default maximum filter length in characters.
pub const DEFAULT_MAX_FILTER_LENGTH: usize = 8192;

/// Default maximum nesting depth of parentheses, `not` and value filters.
pub const DEFAULT_MAX_FILTER_DEPTH: usize = 32;

/// Top-level core configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    /// Filter parsing limits
    pub filter: FilterConfig,
    /// Where schemas are loaded from
    pub schemas: SchemaSource,
}

impl CoreConfig {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Limits applied while parsing filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    /// Maximum filter length in characters
    pub max_length: usize,
    /// Maximum nesting depth
    pub max_depth: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_FILTER_LENGTH,
            max_depth: DEFAULT_MAX_FILTER_DEPTH,
        }
    }
}

/// Source of schema definitions for the registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum SchemaSource {
    /// The core schemas compiled into the crate
    #[default]
    Embedded,
    /// Every schema file in a directory
    Directory { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoreConfig::default();
        assert_eq!(config.filter.max_length, DEFAULT_MAX_FILTER_LENGTH);
        assert_eq!(config.filter.max_depth, DEFAULT_MAX_FILTER_DEPTH);
        assert_eq!(config.schemas, SchemaSource::Embedded);
    }

    #[test]
    fn test_directory_source_deserialization() {
        let config: CoreConfig = serde_json::from_str(
            r#"{ "schemas": { "source": "directory", "path": "/etc/scim/schemas" } }"#,
        )
        .unwrap();
        assert_eq!(
            config.schemas,
            SchemaSource::Directory {
                path: PathBuf::from("/etc/scim/schemas")
            }
        );
        assert_eq!(config.filter, FilterConfig::default());
    }
}
