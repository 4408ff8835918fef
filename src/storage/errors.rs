//! Storage adapter error types.
//!
//! Storage failures are kept apart from the core error families: they carry
//! the resource coordinates involved and wrap core errors (shape validation,
//! write rules, filter compilation) raised while a storage operation runs.

use crate::error::{ResolveError, ScimError, ValidationError, WriteError};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested resource was not found.
    #[error("Resource not found: {resource_type}/{id}")]
    ResourceNotFound { resource_type: String, id: String },

    /// The resource type is not registered with the schema registry.
    #[error("Unknown resource type: {name}")]
    UnknownResourceType { name: String },

    /// A `uniqueness = server` attribute value is already taken.
    #[error("Value '{value}' of attribute '{attribute}' is already used by {resource_type}/{existing_id}")]
    UniquenessViolation {
        resource_type: String,
        attribute: String,
        value: String,
        existing_id: String,
    },

    /// Concurrent modification detected (optimistic locking failure).
    #[error(
        "Version mismatch for {resource_type}/{id}: expected {expected_version}, found {}",
        .actual_version.as_deref().unwrap_or("none")
    )]
    ConcurrentModification {
        resource_type: String,
        id: String,
        expected_version: String,
        actual_version: Option<String>,
    },

    /// Document data doesn't conform to the schema shape.
    #[error("Invalid data: {0}")]
    Validation(#[from] ValidationError),

    /// Write rejected by mutability, requiredness or uniqueness rules.
    #[error("Write rejected: {0}")]
    Write(#[from] WriteError),

    /// Filter could not be parsed or compiled.
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] ScimError),

    /// Internal path resolution failure.
    #[error("Path resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

impl StorageError {
    pub fn resource_not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    pub fn unknown_resource_type(name: impl Into<String>) -> Self {
        Self::UnknownResourceType { name: name.into() }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::ResourceNotFound { .. } | StorageError::UnknownResourceType { .. }
        )
    }

    /// Check if this error indicates a conflict with stored state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::UniquenessViolation { .. }
                | StorageError::ConcurrentModification { .. }
                | StorageError::Write(WriteError::UniquenessConflict { .. })
        )
    }

    /// Check if this error was caused by the caller's input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            StorageError::Validation(_) | StorageError::Write(_) | StorageError::InvalidQuery(_)
        )
    }
}
