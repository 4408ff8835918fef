//! Reference storage adapter.
//!
//! The core never touches storage itself. This module shows the contract a
//! backend implements on top of it: documents go in through
//! [`validate_write`](crate::projection::validate_write), server-managed
//! values (`id`, `meta`, versions) are assigned here, and searches consume
//! compiled [`Predicate`]s, either by evaluating them in memory or by
//! walking their public tree and lowering each leaf to a native query.
//!
//! # Example Usage
//!
//! ```rust
//! use scim_core::schema::SchemaRegistry;
//! use scim_core::storage::{InMemoryStorage, StorageProvider};
//! use scim_core::resource::Document;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(SchemaRegistry::new()?);
//! let storage = InMemoryStorage::new(registry.clone());
//!
//! let users = registry.get_user_schema().expect("embedded User type");
//! let incoming = Document::parse(users, &json!({ "userName": "bjensen" }))?;
//! let stored = storage.create("User", incoming).await?;
//! assert!(stored.id().is_some());
//!
//! let found = storage.find("User", r#"userName eq "BJENSEN""#).await?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

pub use errors::StorageError;
pub use in_memory::{InMemoryStorage, InMemoryStorageStats};

use crate::predicate::Predicate;
use crate::resource::{Document, Version};
use std::fmt;
use std::future::Future;

/// Identifies one stored resource: `resource_type` → `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    resource_type: String,
    id: String,
}

impl StorageKey {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// Persistence for SCIM documents.
///
/// Implementations own the server-managed parts of a resource: they assign
/// ids, stamp `meta`, compute versions and enforce server-wide uniqueness.
/// Documents handed in are client input; documents handed out are what is
/// stored, before any read-path projection.
pub trait StorageProvider: Send + Sync {
    /// The error type returned by storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Validate and store a new resource, returning the stored document.
    fn create(
        &self,
        resource_type: &str,
        document: Document,
    ) -> impl Future<Output = Result<Document, Self::Error>> + Send;

    /// Retrieve a resource, `None` if it doesn't exist.
    fn get(
        &self,
        key: &StorageKey,
    ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send;

    /// Replace a resource.
    ///
    /// With `expected_version`, the replace only succeeds while the stored
    /// document still carries that version.
    fn replace(
        &self,
        key: &StorageKey,
        document: Document,
        expected_version: Option<&Version>,
    ) -> impl Future<Output = Result<Document, Self::Error>> + Send;

    /// Delete a resource. `true` if it existed.
    fn delete(&self, key: &StorageKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// All resources of a type matching `predicate` (every resource when
    /// `None`), ordered by id.
    fn search(
        &self,
        resource_type: &str,
        predicate: Option<&Predicate>,
    ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send;

    /// Number of stored resources of a type.
    fn count(&self, resource_type: &str) -> impl Future<Output = Result<usize, Self::Error>> + Send;
}
