//! Write-path validation.
//!
//! Applies mutability, requiredness and primary-uniqueness rules to an
//! incoming document and produces the document that should be persisted.

use super::read::is_lifted;
use crate::error::{WriteError, WriteResult};
use crate::resource::document::count_primary;
use crate::resource::{Attributes, Document, Value};
use crate::schema::{AttributeDefinition, AttributeType, Mutability, ResourceSchema};

use log::warn;
use std::collections::BTreeMap;
use std::fmt;

/// The kind of write being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOperation {
    Create,
    Replace,
}

impl fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOperation::Create => write!(f, "create"),
            WriteOperation::Replace => write!(f, "replace"),
        }
    }
}

/// Validate `incoming` against the write rules of `schema`.
///
/// - readOnly attributes in `incoming` are dropped. On replace, the existing
///   document's readOnly values, `id` and `meta` are carried over.
/// - Attribute names and schema URIs the resource type does not declare are
///   rejected.
/// - An immutable attribute that is already set in `existing` cannot change.
///   Only what a client can send is compared: readOnly sub-attributes are
///   ignored and strings follow `caseExact`. If `incoming` omits the value on
///   replace, the existing value is kept.
/// - Required attributes (other than readOnly ones) must be present,
///   including required sub-attributes of every present complex value.
/// - At most one element of a multi-valued complex attribute may be primary.
/// - Required extensions must carry at least one value.
///
/// Returns the effective document.
pub fn validate_write(
    schema: &ResourceSchema,
    existing: Option<&Document>,
    incoming: &Document,
    op: WriteOperation,
) -> WriteResult<Document> {
    let rules = WriteRules {
        existing_checked: existing.is_some(),
        carry_over: op == WriteOperation::Replace && existing.is_some(),
    };

    rules
        .apply(schema, existing, incoming)
        .inspect_err(|e| warn!("Rejected {} of {}: {}", op, schema.name(), e))
}

struct WriteRules {
    /// Immutable values can only be checked against an existing document.
    existing_checked: bool,
    /// Replace keeps server-managed values of the existing document.
    carry_over: bool,
}

impl WriteRules {
    fn apply(
        &self,
        schema: &ResourceSchema,
        existing: Option<&Document>,
        incoming: &Document,
    ) -> WriteResult<Document> {
        check_schema_uris(schema, incoming)?;

        let base = schema.base();
        let attributes = self.merge(
            &base.id,
            "",
            base.attributes.iter().filter(|def| !is_lifted(None, def)),
            existing.map(|document| &document.attributes),
            Some(&incoming.attributes),
        )?;

        let mut schemas = vec![base.id.clone()];
        let mut extensions = BTreeMap::new();
        for extension in schema.extensions() {
            let uri = &extension.schema.id;
            let values = self.merge(
                uri,
                &format!("{}:", uri),
                extension.schema.attributes.iter(),
                existing.and_then(|document| document.extension(uri)),
                incoming.extension(uri),
            )?;
            if values.is_empty() {
                if extension.required {
                    return Err(WriteError::required(uri.clone()));
                }
                continue;
            }
            schemas.push(uri.clone());
            extensions.insert(uri.clone(), values);
        }

        let (id, meta) = match existing {
            Some(existing) if self.carry_over => (existing.id.clone(), existing.meta.clone()),
            _ => (None, None),
        };

        Ok(Document {
            resource_type: schema.name().to_string(),
            id,
            schemas,
            attributes,
            extensions,
            meta,
        })
    }

    /// Merge one attribute bag. `prefix` qualifies the names used in errors
    /// and `schema_id` names the schema that owns the bag.
    fn merge<'d>(
        &self,
        schema_id: &str,
        prefix: &str,
        definitions: impl Iterator<Item = &'d AttributeDefinition>,
        existing: Option<&Attributes>,
        incoming: Option<&Attributes>,
    ) -> WriteResult<Attributes> {
        let definitions: Vec<_> = definitions.collect();
        if let Some((name, _)) = incoming.into_iter().flat_map(Attributes::iter).find(|(name, _)| {
            !definitions
                .iter()
                .any(|def| def.name.eq_ignore_ascii_case(name))
        }) {
            return Err(WriteError::unknown_attribute(
                format!("{}{}", prefix, name),
                schema_id,
            ));
        }

        let mut merged = Attributes::new();
        for definition in definitions {
            let path = format!("{}{}", prefix, definition.name);
            let old = present(existing, &definition.name);
            let new = present(incoming, &definition.name);

            let value = match definition.mutability {
                Mutability::ReadOnly => old.filter(|_| self.carry_over).cloned(),
                Mutability::Immutable => match (old, new) {
                    (Some(old), None) if self.carry_over => Some(old.clone()),
                    (old, Some(new)) => {
                        let value = self.merge_value(schema_id, &path, definition, old, new)?;
                        if let Some(old) = old.filter(|_| self.existing_checked) {
                            if !same_client_value(definition, old, &value) {
                                return Err(WriteError::mutability(path));
                            }
                        }
                        Some(value)
                    }
                    (_, None) => None,
                },
                Mutability::ReadWrite | Mutability::WriteOnly => match new {
                    Some(new) => Some(self.merge_value(schema_id, &path, definition, old, new)?),
                    None => None,
                },
            };

            match value.filter(Value::is_present) {
                Some(value) => {
                    merged.insert(definition.name.clone(), value);
                }
                None if definition.required && definition.mutability != Mutability::ReadOnly => {
                    return Err(WriteError::required(path));
                }
                None => {}
            }
        }
        Ok(merged)
    }

    /// Apply sub-attribute rules to a complex value.
    fn merge_value(
        &self,
        schema_id: &str,
        path: &str,
        definition: &AttributeDefinition,
        old: Option<&Value>,
        new: &Value,
    ) -> WriteResult<Value> {
        if !definition.is_complex() {
            return Ok(new.clone());
        }
        let prefix = format!("{}.", path);

        if definition.multi_valued {
            // Elements cannot be paired with existing ones, so only the
            // incoming element is checked.
            let mut items = Vec::new();
            for element in new.elements() {
                let Some(attributes) = element.as_complex() else {
                    items.push(element.clone());
                    continue;
                };
                let merged = self.merge(
                    schema_id,
                    &prefix,
                    definition.sub_attributes.iter(),
                    None,
                    Some(attributes),
                )?;
                if !merged.is_empty() {
                    items.push(Value::Complex(merged));
                }
            }
            if definition.primary_sub_attribute().is_some() && count_primary(&items) > 1 {
                return Err(WriteError::uniqueness(path));
            }
            return Ok(Value::List(items));
        }

        match new.as_complex() {
            Some(attributes) => {
                let existing = old.and_then(Value::as_complex);
                self.merge(
                    schema_id,
                    &prefix,
                    definition.sub_attributes.iter(),
                    existing,
                    Some(attributes),
                )
                .map(Value::Complex)
            }
            None => Ok(new.clone()),
        }
    }
}

/// Every schema URI the incoming document names, in `schemas` or as an
/// extension bag, must belong to the resource type.
fn check_schema_uris(schema: &ResourceSchema, incoming: &Document) -> WriteResult<()> {
    let declared = |uri: &str| schema.is_base_uri(uri) || schema.extension(uri).is_some();
    let named = incoming
        .schemas()
        .iter()
        .map(String::as_str)
        .chain(incoming.extensions().map(|(uri, _)| uri));
    for uri in named {
        if !declared(uri) {
            return Err(WriteError::UnknownSchemaUri {
                uri: uri.to_string(),
                resource_type: schema.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Whether two values look the same to a client: readOnly sub-attributes
/// are ignored and strings compare by the attribute's caseExact rule.
fn same_client_value(definition: &AttributeDefinition, old: &Value, new: &Value) -> bool {
    match (old, new) {
        (Value::List(old), Value::List(new)) => {
            old.len() == new.len()
                && old
                    .iter()
                    .zip(new)
                    .all(|(old, new)| same_client_value(definition, old, new))
        }
        (Value::Complex(old), Value::Complex(new)) => definition
            .sub_attributes
            .iter()
            .filter(|sub| sub.mutability != Mutability::ReadOnly)
            .all(|sub| match (present(Some(old), &sub.name), present(Some(new), &sub.name)) {
                (Some(old), Some(new)) => same_client_value(sub, old, new),
                (None, None) => true,
                _ => false,
            }),
        (Value::String(old), Value::String(new))
            if !definition.case_exact && definition.data_type != AttributeType::Binary =>
        {
            old.to_lowercase() == new.to_lowercase()
        }
        _ => old == new,
    }
}

fn present<'a>(attributes: Option<&'a Attributes>, name: &str) -> Option<&'a Value> {
    attributes?.get(name).filter(|value| value.is_present())
}
