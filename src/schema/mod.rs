//! Schema definitions, registry and attribute path resolution.
//!
//! This module implements the RFC 7643 schema model: attribute definitions
//! with their mutability, returned and uniqueness characteristics, schemas
//! composed into resource types with extensions, and the resolver that binds
//! filter and projection paths to those definitions.
//!
//! # Key Types
//!
//! - [`Schema`] - SCIM schema definition with attributes and metadata
//! - [`SchemaRegistry`] - Immutable registry of schemas and resource types
//! - [`ResourceSchema`] - A resource type composed with its base and extension schemas
//! - [`AttributeDefinition`] - Individual attribute specifications and constraints
//! - [`ResolvedPath`] - An attribute path bound to its definitions
//!
//! # Examples
//!
//! ```rust
//! use scim_core::schema::{SchemaRegistry, resolve};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::new()?;
//! let user_schema = registry.get_user_schema().expect("embedded User type");
//! let resolved = resolve(user_schema, &"name.familyName".parse()?)?;
//! assert_eq!(resolved.target().name, "familyName");
//! # Ok(())
//! # }
//! ```

pub mod embedded;
pub mod registry;
pub mod resolver;
pub mod types;


// Re-export the main types for convenience
pub use registry::{ExtensionSchema, ResourceSchema, SchemaRegistry, SchemaRegistryBuilder};
pub use resolver::{ResolvedPath, resolve, resolve_in_element, resolve_value_path};
pub use types::{
    AttributeDefinition, AttributeType, Mutability, ResourceType, Returned, Schema,
    SchemaExtension, Uniqueness,
};
