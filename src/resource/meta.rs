//! Resource metadata.
//!
//! [`Meta`] holds the read-only `meta` attribute of a resource: its type,
//! creation and modification timestamps, canonical location and version.

use super::value::{Attributes, Value, parse_datetime};
use crate::error::{ValidationError, ValidationResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

/// A validated SCIM meta attribute.
///
/// ## Validation Rules
///
/// - Resource type must not be empty
/// - Last modified must not be before the created timestamp
///
/// ## Examples
///
/// ```rust
/// use scim_core::resource::Meta;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let meta = Meta::new_for_creation("User")?
///     .with_location("https://example.com/v2/Users/2819c223")
///     .with_version("W/\"a330bc54f0671c9\"");
/// assert_eq!(meta.resource_type(), "User");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    resource_type: String,
    created: DateTime<Utc>,
    last_modified: DateTime<Utc>,
    location: Option<String>,
    version: Option<String>,
}

impl Meta {
    /// Create a new Meta with full attributes.
    pub fn new(
        resource_type: impl Into<String>,
        created: DateTime<Utc>,
        last_modified: DateTime<Utc>,
        location: Option<String>,
        version: Option<String>,
    ) -> ValidationResult<Self> {
        let resource_type = resource_type.into();
        if resource_type.trim().is_empty() {
            return Err(ValidationError::InvalidMeta {
                details: "resourceType cannot be empty".to_string(),
            });
        }
        if last_modified < created {
            return Err(ValidationError::InvalidMeta {
                details: "lastModified cannot be before created".to_string(),
            });
        }

        Ok(Self {
            resource_type,
            created,
            last_modified,
            location,
            version,
        })
    }

    /// Create a Meta for a new resource with the current timestamp.
    pub fn new_for_creation(resource_type: impl Into<String>) -> ValidationResult<Self> {
        let now = Utc::now();
        Self::new(resource_type, now, now, None, None)
    }

    /// Parse the `meta` object of a SCIM resource.
    ///
    /// `resourceType`, `created` and `lastModified` are required.
    pub fn from_json(json: &JsonValue) -> ValidationResult<Self> {
        let obj = json.as_object().ok_or_else(|| ValidationError::InvalidMeta {
            details: "meta must be an object".to_string(),
        })?;

        let text = |name: &str| -> ValidationResult<Option<String>> {
            match obj.get(name) {
                None | Some(JsonValue::Null) => Ok(None),
                Some(JsonValue::String(s)) => Ok(Some(s.clone())),
                Some(_) => Err(ValidationError::InvalidMeta {
                    details: format!("'{}' must be a string", name),
                }),
            }
        };
        let required = |name: &str| -> ValidationResult<String> {
            text(name)?.ok_or_else(|| ValidationError::InvalidMeta {
                details: format!("'{}' is required", name),
            })
        };
        let timestamp = |name: &str| -> ValidationResult<DateTime<Utc>> {
            let raw = required(name)?;
            parse_datetime(&raw).ok_or(ValidationError::InvalidDateTimeFormat {
                attribute: format!("meta.{}", name),
                value: raw,
            })
        };

        Self::new(
            required("resourceType")?,
            timestamp("created")?,
            timestamp("lastModified")?,
            text("location")?,
            text("version")?,
        )
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// The version as a weak ETag, e.g. `W/"a330bc54f0671c9"`.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// A copy with `lastModified` set to now.
    pub fn with_updated_timestamp(&self) -> Self {
        Self {
            last_modified: Utc::now().max(self.created),
            ..self.clone()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// The meta attribute as sub-attribute values.
    ///
    /// Timestamps are rendered as RFC 3339 strings.
    pub fn to_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("resourceType", Value::from(self.resource_type.as_str()));
        attributes.insert("created", Value::from(format_datetime(self.created)));
        attributes.insert("lastModified", Value::from(format_datetime(self.last_modified)));
        if let Some(location) = &self.location {
            attributes.insert("location", Value::from(location.as_str()));
        }
        if let Some(version) = &self.version {
            attributes.insert("version", Value::from(version.as_str()));
        }
        attributes
    }

    pub fn to_json(&self) -> JsonValue {
        self.to_attributes().to_json()
    }
}

fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
