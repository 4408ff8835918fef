//! SCIM 2.0 identity provisioning core for Rust.
//!
//! The protocol-independent heart of a SCIM service: the attribute schema
//! model, the filter language, and the rules deciding which attributes a
//! client may write and which it gets to see.
//!
//! # Core Components
//!
//! - [`filter`] - Lexer, parser, AST and renderer for SCIM filter expressions
//! - [`schema`] - Schema model, [`SchemaRegistry`] and attribute path resolution
//! - [`predicate`] - Filters compiled against a schema, evaluable over documents
//! - [`projection`] - Read-path attribute projection and write-path validation
//! - [`resource`] - The [`Document`](resource::Document) value type
//! - [`storage`] - A reference async storage adapter built on the above
//!
//! # Quick Start
//!
//! ```rust
//! use scim_core::SchemaRegistry;
//! use scim_core::predicate::compile_filter;
//! use scim_core::projection::project;
//! use scim_core::resource::Document;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::new()?;
//! let users = registry.resource_schema("User").expect("embedded User type");
//!
//! let document = Document::parse(users, &json!({
//!     "id": "2819c223",
//!     "userName": "bjensen",
//!     "title": "Tour Guide"
//! }))?;
//!
//! let predicate = compile_filter(users, r#"title sw "tour" and userName pr"#)?;
//! assert!(predicate.matches(&document));
//!
//! let visible = project(users, &document, &["userName".parse()?], &[])?;
//! assert!(visible.attribute("title").is_none());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod predicate;
pub mod projection;
pub mod resource;
pub mod schema;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::{CoreConfig, FilterConfig};
pub use error::{ScimError, ScimResult};
pub use filter::{AttrPath, Filter};
pub use predicate::Predicate;
pub use projection::{AttributeSelection, WriteOperation};
pub use resource::Document;
pub use schema::{ResourceSchema, Schema, SchemaRegistry};
