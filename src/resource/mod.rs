//! SCIM resource documents.
//!
//! # Key Components
//!
//! * [`Document`] - A resource instance: base attributes, extension attribute
//!   bags keyed by schema URI, and read-only metadata
//! * [`Value`] / [`Attributes`] - Typed attribute values
//! * [`Meta`] - The `meta` attribute (resource type, timestamps, location, version)
//! * [`Version`] - Content-derived version carried as a weak ETag

pub mod document;
pub mod meta;
pub mod value;
pub mod version;

pub use document::Document;
pub use meta::Meta;
pub use value::{Attributes, Value, parse_datetime};
pub use version::{Version, VersionError};
