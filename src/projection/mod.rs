//! Output projection and write-path validation.
//!
//! The read path ([`project`]) decides which attributes of a stored document
//! are visible in a response. The write path ([`validate_write`]) applies
//! mutability, requiredness and primary-uniqueness rules to client input and
//! returns the document to persist.
//!
//! ```rust
//! use scim_core::projection::{AttributeSelection, project_selection};
//! use scim_core::resource::Document;
//! use scim_core::schema::SchemaRegistry;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::new()?;
//! let users = registry.get_user_schema().expect("embedded User type");
//! let document = Document::parse(users, &json!({
//!     "id": "2819c223",
//!     "userName": "bjensen",
//!     "password": "t1meMa$heen",
//!     "name": { "givenName": "Barbara", "familyName": "Jensen" }
//! }))?;
//!
//! let selection = AttributeSelection::from_request(&["password", "name.givenName"], &[])?;
//! let visible = project_selection(users, &document, &selection)?;
//!
//! assert!(visible.attribute("password").is_none());
//! assert!(visible.attribute("userName").is_none());
//! assert_eq!(visible.id(), Some("2819c223"));
//! # Ok(())
//! # }
//! ```

pub mod read;
pub mod selection;
pub mod write;

pub use read::{project, project_selection};
pub use selection::AttributeSelection;
pub use write::{WriteOperation, validate_write};
