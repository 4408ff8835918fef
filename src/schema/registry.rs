//! Schema registry for loading, composing, and accessing SCIM schemas.
//!
//! The registry has a two-phase lifecycle. A [`SchemaRegistryBuilder`] collects
//! schema and resource type definitions (embedded, from files, or added by
//! hand) and validates them once in [`SchemaRegistryBuilder::build`]. The
//! resulting [`SchemaRegistry`] is immutable: it is shared by reference (or
//! `Arc`) across threads and never written to while requests are served.

use super::embedded;
use super::types::{
    AttributeDefinition, AttributeType, Mutability, ResourceType, Returned, Schema,
    SchemaExtension, Uniqueness,
};
use crate::config::{CoreConfig, SchemaSource};
use crate::error::{SchemaError, SchemaResult};

use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// File name holding resource type definitions inside a schema directory.
pub const RESOURCE_TYPES_FILE: &str = "ResourceTypes.json";

/// An extension schema as attached to a composed resource schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionSchema {
    pub schema: Schema,
    pub required: bool,
}

/// A resource type composed with its schemas.
///
/// This is the view every core operation works against: the base schema
/// (with the common attributes `schemas`, `id`, `externalId` and `meta`
/// merged in) plus each extension schema in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    resource_type: ResourceType,
    base: Schema,
    extensions: Vec<ExtensionSchema>,
}

impl ResourceSchema {
    /// Compose a resource schema directly from its parts.
    ///
    /// Common attributes missing from `base` are added.
    pub fn new(resource_type: ResourceType, base: Schema, extensions: Vec<ExtensionSchema>) -> Self {
        Self {
            resource_type,
            base: with_common_attributes(base),
            extensions,
        }
    }

    /// Resource type name (e.g. "User").
    pub fn name(&self) -> &str {
        &self.resource_type.name
    }

    /// Base schema URI.
    pub fn id(&self) -> &str {
        &self.base.id
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    pub fn base(&self) -> &Schema {
        &self.base
    }

    pub fn extensions(&self) -> &[ExtensionSchema] {
        &self.extensions
    }

    /// Find an extension by URI (case-insensitive).
    pub fn extension(&self, uri: &str) -> Option<&ExtensionSchema> {
        self.extensions
            .iter()
            .find(|ext| ext.schema.id.eq_ignore_ascii_case(uri))
    }

    /// Whether `uri` names the base schema (case-insensitive).
    pub fn is_base_uri(&self, uri: &str) -> bool {
        self.base.id.eq_ignore_ascii_case(uri)
    }

    /// All schema URIs of this resource type, base first.
    pub fn schema_uris(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.base.id.as_str())
            .chain(self.extensions.iter().map(|ext| ext.schema.id.as_str()))
    }
}

/// Immutable registry of schemas and composed resource types.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    // Keys are lowercased: URIs and names are matched case-insensitively.
    schemas: HashMap<String, Schema>,
    resource_schemas: HashMap<String, ResourceSchema>,
    resource_order: Vec<String>,
}

impl SchemaRegistry {
    /// Create a new schema registry with the embedded core schemas.
    pub fn new() -> SchemaResult<Self> {
        Self::with_embedded_schemas()
    }

    /// Create a registry holding the embedded User, Group and enterprise
    /// extension schemas and their resource types.
    pub fn with_embedded_schemas() -> SchemaResult<Self> {
        let mut builder = SchemaRegistryBuilder::new();
        builder.add_embedded_schemas()?;
        builder.build()
    }

    /// Create a schema registry by loading schemas from a directory.
    ///
    /// Every `*.json` file holding a schema object is registered. Resource
    /// types come from [`RESOURCE_TYPES_FILE`] when present; otherwise one
    /// resource type is derived per schema.
    pub fn from_schema_dir<P: AsRef<Path>>(schema_dir: P) -> SchemaResult<Self> {
        let mut builder = SchemaRegistryBuilder::new();
        builder.load_dir(schema_dir)?;
        builder.build()
    }

    /// Bootstrap a registry from configuration.
    pub fn from_config(config: &CoreConfig) -> SchemaResult<Self> {
        match &config.schemas {
            SchemaSource::Embedded => Self::with_embedded_schemas(),
            SchemaSource::Directory { path } => Self::from_schema_dir(path),
        }
    }

    /// Get all registered schemas.
    pub fn get_schemas(&self) -> Vec<&Schema> {
        self.schemas.values().collect()
    }

    /// Get a specific schema by URI.
    pub fn get_schema(&self, id: &str) -> Option<&Schema> {
        self.schemas.get(&id.to_ascii_lowercase())
    }

    /// Get a schema by its short name (e.g. "EnterpriseUser").
    pub fn get_schema_by_name(&self, name: &str) -> Option<&Schema> {
        self.schemas
            .values()
            .find(|schema| schema.name.eq_ignore_ascii_case(name))
    }

    /// Get the composed schema for a resource type name.
    pub fn resource_schema(&self, resource_type: &str) -> Option<&ResourceSchema> {
        self.resource_schemas
            .get(&resource_type.to_ascii_lowercase())
    }

    /// Get the composed schema whose base schema has the given URI.
    pub fn resource_schema_by_uri(&self, uri: &str) -> Option<&ResourceSchema> {
        self.resource_schemas()
            .find(|resource| resource.is_base_uri(uri))
    }

    /// Composed resource schemas in registration order.
    pub fn resource_schemas(&self) -> impl Iterator<Item = &ResourceSchema> {
        self.resource_order
            .iter()
            .filter_map(|key| self.resource_schemas.get(key))
    }

    /// Get the composed User resource schema.
    pub fn get_user_schema(&self) -> Option<&ResourceSchema> {
        self.resource_schema("User")
    }

    /// Get the composed Group resource schema.
    pub fn get_group_schema(&self) -> Option<&ResourceSchema> {
        self.resource_schema("Group")
    }
}

/// Collects schema definitions before the registry is frozen.
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    schemas: Vec<Schema>,
    resource_types: Vec<ResourceType>,
}

impl SchemaRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the embedded core schemas and resource types.
    pub fn add_embedded_schemas(&mut self) -> SchemaResult<()> {
        self.add_schema(load_schema_from_str(embedded::core_user_schema())?)?;
        self.add_schema(load_schema_from_str(embedded::core_group_schema())?)?;
        self.add_schema(load_schema_from_str(embedded::enterprise_user_schema())?)?;
        for resource_type in load_resource_types_from_str(embedded::core_resource_types())? {
            self.add_resource_type(resource_type)?;
        }
        Ok(())
    }

    /// Add a schema to the registry.
    pub fn add_schema(&mut self, schema: Schema) -> SchemaResult<()> {
        validate_schema(&schema)?;
        if self
            .schemas
            .iter()
            .any(|existing| existing.id.eq_ignore_ascii_case(&schema.id))
        {
            return Err(SchemaError::DuplicateSchema { id: schema.id });
        }
        debug!(
            "Registered schema '{}' ({} attributes)",
            schema.id,
            schema.attributes.len()
        );
        self.schemas.push(schema);
        Ok(())
    }

    /// Add a resource type definition.
    pub fn add_resource_type(&mut self, resource_type: ResourceType) -> SchemaResult<()> {
        if self
            .resource_types
            .iter()
            .any(|existing| existing.name.eq_ignore_ascii_case(&resource_type.name))
        {
            return Err(SchemaError::DuplicateResourceType {
                name: resource_type.name,
            });
        }
        debug!("Registered resource type '{}'", resource_type.name);
        self.resource_types.push(resource_type);
        Ok(())
    }

    /// Load every schema file in a directory.
    pub fn load_dir<P: AsRef<Path>>(&mut self, schema_dir: P) -> SchemaResult<()> {
        let dir = schema_dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| SchemaError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut resource_types = None;
        for path in paths {
            let content = read_file(&path)?;
            let is_resource_types =
                path.file_name().and_then(|name| name.to_str()) == Some(RESOURCE_TYPES_FILE);
            if is_resource_types {
                resource_types = Some(load_resource_types_from_str(&content)?);
            } else {
                self.add_schema(load_schema_from_str(&content)?)?;
            }
        }

        let resource_types = match resource_types {
            Some(types) => types,
            None => self.derived_resource_types(),
        };
        for resource_type in resource_types {
            self.add_resource_type(resource_type)?;
        }
        Ok(())
    }

    /// One resource type per schema that no other resource type extends.
    fn derived_resource_types(&self) -> Vec<ResourceType> {
        self.schemas
            .iter()
            .filter(|schema| !schema.id.contains(":extension:"))
            .map(|schema| ResourceType {
                name: schema.name.clone(),
                endpoint: format!("/{}s", schema.name),
                description: schema.description.clone(),
                schema: schema.id.clone(),
                schema_extensions: Vec::new(),
            })
            .collect()
    }

    /// Validate cross references and freeze the registry.
    pub fn build(self) -> SchemaResult<SchemaRegistry> {
        let find = |uri: &str| {
            self.schemas
                .iter()
                .find(|schema| schema.id.eq_ignore_ascii_case(uri))
        };

        let mut resource_schemas = HashMap::new();
        let mut resource_order = Vec::new();
        for resource_type in &self.resource_types {
            let base = find(&resource_type.schema).ok_or_else(|| SchemaError::UnknownSchema {
                resource_type: resource_type.name.clone(),
                uri: resource_type.schema.clone(),
            })?;

            let mut extensions = Vec::new();
            for SchemaExtension { schema, required } in &resource_type.schema_extensions {
                let extension = find(schema).ok_or_else(|| SchemaError::UnknownSchema {
                    resource_type: resource_type.name.clone(),
                    uri: schema.clone(),
                })?;
                extensions.push(ExtensionSchema {
                    schema: extension.clone(),
                    required: *required,
                });
            }

            let key = resource_type.name.to_ascii_lowercase();
            resource_order.push(key.clone());
            resource_schemas.insert(
                key,
                ResourceSchema::new(resource_type.clone(), base.clone(), extensions),
            );
        }

        let schemas: HashMap<_, _> = self
            .schemas
            .into_iter()
            .map(|schema| (schema.id.to_ascii_lowercase(), schema))
            .collect();

        info!(
            "Schema registry ready: {} schemas, {} resource types",
            schemas.len(),
            resource_order.len()
        );

        Ok(SchemaRegistry {
            schemas,
            resource_schemas,
            resource_order,
        })
    }
}

/// Load a schema from a JSON string.
pub fn load_schema_from_str(content: &str) -> SchemaResult<Schema> {
    Ok(serde_json::from_str(content)?)
}

/// Load resource type definitions from a JSON array string.
pub fn load_resource_types_from_str(content: &str) -> SchemaResult<Vec<ResourceType>> {
    Ok(serde_json::from_str(content)?)
}

/// Load a schema from a JSON file.
pub fn load_schema_from_file<P: AsRef<Path>>(path: P) -> SchemaResult<Schema> {
    load_schema_from_str(&read_file(path.as_ref())?)
}

fn read_file(path: &Path) -> SchemaResult<String> {
    fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Check the structural rules a schema must satisfy before registration.
pub fn validate_schema(schema: &Schema) -> SchemaResult<()> {
    if schema.id.trim().is_empty() {
        return Err(SchemaError::invalid(&schema.name, "schema id cannot be empty"));
    }
    if !schema.id.contains(':') {
        return Err(SchemaError::invalid(&schema.id, "schema id must be a URI"));
    }
    validate_attributes(&schema.id, &schema.attributes, false)
}

fn validate_attributes(
    schema_id: &str,
    attributes: &[AttributeDefinition],
    nested: bool,
) -> SchemaResult<()> {
    for (index, attr) in attributes.iter().enumerate() {
        if attr.name.is_empty() {
            return Err(SchemaError::invalid(schema_id, "attribute name cannot be empty"));
        }
        if attributes[..index]
            .iter()
            .any(|other| other.name.eq_ignore_ascii_case(&attr.name))
        {
            return Err(SchemaError::invalid(
                schema_id,
                format!("duplicate attribute '{}'", attr.name),
            ));
        }

        match attr.data_type {
            AttributeType::Complex if nested => {
                return Err(SchemaError::invalid(
                    schema_id,
                    format!("sub-attribute '{}' cannot itself be complex", attr.name),
                ));
            }
            AttributeType::Complex => {
                validate_attributes(schema_id, &attr.sub_attributes, true)?;
            }
            _ if !attr.sub_attributes.is_empty() => {
                return Err(SchemaError::invalid(
                    schema_id,
                    format!("non-complex attribute '{}' declares sub-attributes", attr.name),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

/// The `schemas`, `id`, `externalId` and `meta` attributes shared by every
/// resource.
pub fn common_attributes() -> Vec<AttributeDefinition> {
    let schemas = AttributeDefinition {
        multi_valued: true,
        case_exact: true,
        returned: Returned::Always,
        ..AttributeDefinition::new("schemas", AttributeType::Reference)
    };

    let id = AttributeDefinition {
        case_exact: true,
        mutability: Mutability::ReadOnly,
        returned: Returned::Always,
        uniqueness: Uniqueness::Server,
        ..AttributeDefinition::new("id", AttributeType::String)
    };

    let external_id = AttributeDefinition {
        case_exact: true,
        ..AttributeDefinition::new("externalId", AttributeType::String)
    };

    let read_only = |name: &str, data_type: AttributeType| AttributeDefinition {
        mutability: Mutability::ReadOnly,
        ..AttributeDefinition::new(name, data_type)
    };
    let meta = AttributeDefinition {
        mutability: Mutability::ReadOnly,
        sub_attributes: vec![
            read_only("resourceType", AttributeType::String),
            read_only("created", AttributeType::DateTime),
            read_only("lastModified", AttributeType::DateTime),
            read_only("location", AttributeType::Reference),
            AttributeDefinition {
                case_exact: true,
                ..read_only("version", AttributeType::String)
            },
        ],
        ..AttributeDefinition::new("meta", AttributeType::Complex)
    };

    vec![schemas, id, external_id, meta]
}

fn with_common_attributes(mut base: Schema) -> Schema {
    let missing: Vec<_> = common_attributes()
        .into_iter()
        .filter(|common| base.attribute(&common.name).is_none())
        .collect();
    base.attributes.splice(0..0, missing);
    base
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        // Embedded schemas are compiled in and covered by tests.
        Self::new().expect("Failed to load embedded schemas")
    }
}
