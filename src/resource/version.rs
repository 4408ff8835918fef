//! Content-derived resource versions.
//!
//! A [`Version`] is an opaque identifier derived from a resource's content.
//! It is carried in `meta.version` as a weak ETag (`W/"..."`) and used by the
//! storage adapter for conditional replaces.
//!
//! ```rust
//! use scim_core::resource::Version;
//!
//! let version = Version::from_content(br#"{"userName":"bjensen"}"#);
//! let etag = version.to_etag();
//! assert!(etag.starts_with("W/\""));
//! assert_eq!(etag.parse::<Version>().unwrap(), version);
//! ```

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};
use thiserror::Error;

use super::document::Document;

/// Opaque version identifier for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    opaque: String,
}

impl Version {
    /// Create a version from resource content.
    ///
    /// Hashes the content with SHA-256 and keeps the first 8 bytes, base64
    /// encoded, for a short ETag.
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let hash = hasher.finalize();
        Self {
            opaque: BASE64.encode(&hash[..8]),
        }
    }

    /// Create a version from a document's attributes.
    ///
    /// `meta` is left out, so the version only changes when the data does.
    pub fn from_document(document: &Document) -> Self {
        let content = document.content_json().to_string();
        Self::from_content(content.as_bytes())
    }

    /// Create a version from a provider-specific identifier.
    pub fn from_hash(hash: impl AsRef<str>) -> Self {
        Self {
            opaque: hash.as_ref().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.opaque
    }

    /// Weak ETag form, `W/"<opaque>"`.
    pub fn to_etag(&self) -> String {
        format!("W/\"{}\"", self.opaque)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.opaque)
    }
}

/// Accepts a weak or strong ETag (`W/"abc"`, `"abc"`) or a bare opaque value.
impl FromStr for Version {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let unprefixed = trimmed.strip_prefix("W/").unwrap_or(trimmed);

        let opaque = if unprefixed.starts_with('"') {
            unprefixed
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .ok_or_else(|| VersionError::InvalidEtagFormat(input.to_string()))?
        } else if unprefixed.len() != trimmed.len() {
            // `W/` must be followed by a quoted value.
            return Err(VersionError::InvalidEtagFormat(input.to_string()));
        } else {
            unprefixed
        };

        if opaque.is_empty() {
            return Err(VersionError::InvalidEtagFormat(input.to_string()));
        }
        Ok(Self::from_hash(opaque))
    }
}

/// Errors that can occur during version operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VersionError {
    /// Invalid ETag format provided
    #[error("Invalid ETag format: {0}")]
    InvalidEtagFormat(String),
}
