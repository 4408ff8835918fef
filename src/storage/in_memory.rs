//! In-memory storage implementation for SCIM resources.
//!
//! Thread-safe implementation of [`StorageProvider`] over a `HashMap` of
//! per-type `BTreeMap`s behind a tokio `RwLock`. Intended for tests,
//! development, and as a model for real backends.
//!
//! * Writes run through the write-path rules and are stamped with a fresh
//!   `meta` and a content-derived version.
//! * Attributes declared `uniqueness = server` or `global` are checked by
//!   compiling an `eq` filter for the incoming value and evaluating it
//!   against every stored resource of the type.
//! * Searches evaluate compiled predicates in memory: O(n) per query.

use super::{StorageError, StorageKey, StorageProvider};
use crate::filter::{AttrPath, CompareOp, Filter, Literal};
use crate::predicate::{Predicate, compile, compile_filter};
use crate::projection::{WriteOperation, validate_write};
use crate::resource::{Document, Meta, Value, Version};
use crate::schema::{AttributeDefinition, ResourceSchema, SchemaRegistry, Uniqueness};

use log::{debug, info};
use serde_json::Number;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

type TypeData = BTreeMap<String, Document>;

/// Thread-safe in-memory storage.
///
/// Structure: `resource_type` → `id` → document. Cloning shares the
/// underlying data.
#[derive(Clone)]
pub struct InMemoryStorage {
    registry: Arc<SchemaRegistry>,
    data: Arc<RwLock<HashMap<String, TypeData>>>,
}

impl InMemoryStorage {
    /// Create an empty storage validating against `registry`.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Parse, compile and run a filter against resources of a type.
    pub async fn find(
        &self,
        resource_type: &str,
        filter: &str,
    ) -> Result<Vec<Document>, StorageError> {
        let predicate = compile_filter(self.schema(resource_type)?, filter)?;
        debug!("Searching {} with {}", resource_type, predicate);
        self.search(resource_type, Some(&predicate)).await
    }

    /// Get storage statistics for debugging and monitoring.
    pub async fn stats(&self) -> InMemoryStorageStats {
        let data_guard = self.data.read().await;
        InMemoryStorageStats {
            resource_type_count: data_guard.values().filter(|docs| !docs.is_empty()).count(),
            total_resources: data_guard.values().map(BTreeMap::len).sum(),
        }
    }

    /// Clear all data (useful for testing).
    pub async fn clear(&self) {
        self.data.write().await.clear();
    }

    fn schema(&self, resource_type: &str) -> Result<&ResourceSchema, StorageError> {
        self.registry
            .resource_schema(resource_type)
            .ok_or_else(|| StorageError::unknown_resource_type(resource_type))
    }
}

impl StorageProvider for InMemoryStorage {
    type Error = StorageError;

    async fn create(&self, resource_type: &str, document: Document) -> Result<Document, Self::Error> {
        let schema = self.schema(resource_type)?;
        let effective = validate_write(schema, None, &document, WriteOperation::Create)?;

        let mut data_guard = self.data.write().await;
        let type_data = data_guard.entry(schema.name().to_string()).or_default();
        check_uniqueness(schema, &effective, type_data, None)?;

        let id = uuid::Uuid::new_v4().to_string();
        let meta = Meta::new_for_creation(schema.name())?
            .with_location(format!("{}/{}", schema.resource_type().endpoint, id));
        let stored = stamp(effective.with_id(id.clone()), meta);

        type_data.insert(id.clone(), stored.clone());
        info!("Created {} {}", schema.name(), id);
        Ok(stored)
    }

    async fn get(&self, key: &StorageKey) -> Result<Option<Document>, Self::Error> {
        let schema = self.schema(key.resource_type())?;
        let data_guard = self.data.read().await;

        let result = data_guard
            .get(schema.name())
            .and_then(|type_data| type_data.get(key.id()))
            .cloned();

        Ok(result)
    }

    async fn replace(
        &self,
        key: &StorageKey,
        document: Document,
        expected_version: Option<&Version>,
    ) -> Result<Document, Self::Error> {
        let schema = self.schema(key.resource_type())?;
        let mut data_guard = self.data.write().await;
        let type_data = data_guard.entry(schema.name().to_string()).or_default();

        let existing = type_data
            .get(key.id())
            .ok_or_else(|| StorageError::resource_not_found(schema.name(), key.id()))?;

        if let Some(expected) = expected_version {
            let actual = existing.version();
            if actual.as_ref() != Some(expected) {
                debug!(
                    "Version mismatch on {}: expected {}, found {:?}",
                    key, expected, actual
                );
                return Err(StorageError::ConcurrentModification {
                    resource_type: schema.name().to_string(),
                    id: key.id().to_string(),
                    expected_version: expected.to_etag(),
                    actual_version: actual.map(|version| version.to_etag()),
                });
            }
        }

        let effective = validate_write(schema, Some(existing), &document, WriteOperation::Replace)?;
        check_uniqueness(schema, &effective, type_data, Some(key.id()))?;

        let meta = match existing.meta() {
            Some(meta) => meta.with_updated_timestamp(),
            None => Meta::new_for_creation(schema.name())?,
        };
        let stored = stamp(effective.with_id(key.id()), meta);

        type_data.insert(key.id().to_string(), stored.clone());
        info!("Replaced {}", key);
        Ok(stored)
    }

    async fn delete(&self, key: &StorageKey) -> Result<bool, Self::Error> {
        let schema = self.schema(key.resource_type())?;
        let mut data_guard = self.data.write().await;

        let existed = data_guard
            .get_mut(schema.name())
            .is_some_and(|type_data| type_data.remove(key.id()).is_some());

        if existed {
            info!("Deleted {}", key);
        }
        Ok(existed)
    }

    async fn search(
        &self,
        resource_type: &str,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<Document>, Self::Error> {
        let schema = self.schema(resource_type)?;
        let data_guard = self.data.read().await;

        let Some(type_data) = data_guard.get(schema.name()) else {
            return Ok(Vec::new());
        };
        let matches: Vec<Document> = type_data
            .values()
            .filter(|document| predicate.is_none_or(|predicate| predicate.matches(document)))
            .cloned()
            .collect();

        debug!(
            "Search over {} {} resources matched {}",
            type_data.len(),
            schema.name(),
            matches.len()
        );
        Ok(matches)
    }

    async fn count(&self, resource_type: &str) -> Result<usize, Self::Error> {
        let schema = self.schema(resource_type)?;
        let data_guard = self.data.read().await;
        Ok(data_guard.get(schema.name()).map_or(0, BTreeMap::len))
    }
}

/// Statistics about the current state of in-memory storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryStorageStats {
    /// Number of resource types holding at least one resource
    pub resource_type_count: usize,
    /// Total number of individual resources
    pub total_resources: usize,
}

/// Attach `meta` carrying the version of the document's content.
fn stamp(document: Document, meta: Meta) -> Document {
    let version = Version::from_document(&document);
    document.with_meta(meta.with_version(version.to_etag()))
}

/// Reject `document` if a server-unique value is already used by another
/// stored resource.
fn check_uniqueness(
    schema: &ResourceSchema,
    document: &Document,
    stored: &TypeData,
    own_id: Option<&str>,
) -> Result<(), StorageError> {
    for (uri, definition) in unique_attributes(schema) {
        let value = match uri {
            None => document.attribute(&definition.name),
            Some(uri) => document
                .extension(uri)
                .and_then(|attributes| attributes.get(&definition.name)),
        };
        let Some(literal) = value.and_then(literal_for) else {
            continue;
        };

        let mut path = AttrPath::new(definition.name.clone());
        if let Some(uri) = uri {
            path = path.in_schema(uri);
        }
        let attribute = path.to_string();
        let predicate = compile(schema, &Filter::compare(path, CompareOp::Eq, literal.clone()))?;

        if let Some(taken) = stored
            .values()
            .filter(|other| other.id() != own_id)
            .find(|other| predicate.matches(other))
        {
            return Err(StorageError::UniquenessViolation {
                resource_type: schema.name().to_string(),
                attribute,
                value: literal.to_string(),
                existing_id: taken.id().unwrap_or_default().to_string(),
            });
        }
    }
    Ok(())
}

/// Single-valued simple attributes with a uniqueness constraint, with the
/// extension URI they belong to.
fn unique_attributes(
    schema: &ResourceSchema,
) -> impl Iterator<Item = (Option<&str>, &AttributeDefinition)> {
    let base = schema
        .base()
        .attributes
        .iter()
        .filter(|definition| !definition.name.eq_ignore_ascii_case("id"))
        .map(|definition| (None, definition));
    let extensions = schema.extensions().iter().flat_map(|extension| {
        extension
            .schema
            .attributes
            .iter()
            .map(move |definition| (Some(extension.schema.id.as_str()), definition))
    });
    base.chain(extensions).filter(|(_, definition)| {
        definition.uniqueness != Uniqueness::None
            && !definition.multi_valued
            && !definition.is_complex()
    })
}

fn literal_for(value: &Value) -> Option<Literal> {
    match value {
        Value::String(s) => Some(Literal::String(s.clone())),
        Value::Boolean(b) => Some(Literal::Bool(*b)),
        Value::Integer(i) => Some(Literal::Number(Number::from(*i))),
        Value::Decimal(d) => Number::from_f64(*d).map(Literal::Number),
        Value::Null | Value::List(_) | Value::Complex(_) => None,
    }
}
