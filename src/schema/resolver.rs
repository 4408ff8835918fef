//! Attribute path resolution.
//!
//! Binds a syntactic [`AttrPath`] to the attribute definitions it names in a
//! [`ResourceSchema`]. Resolution only reads the schema; it never changes it.

use super::registry::ResourceSchema;
use super::types::AttributeDefinition;
use crate::error::{ResolveError, ResolveResult};
use crate::filter::AttrPath;
use std::fmt;

/// An attribute path bound to its schema definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    /// Extension schema URI, or `None` for a base schema attribute
    pub extension: Option<String>,
    /// Top-level attribute definition
    pub attribute: AttributeDefinition,
    /// Sub-attribute definition for two-level paths
    pub sub_attribute: Option<AttributeDefinition>,
}

impl ResolvedPath {
    /// The definition the path ultimately addresses.
    pub fn target(&self) -> &AttributeDefinition {
        self.sub_attribute.as_ref().unwrap_or(&self.attribute)
    }

    pub fn is_extension(&self) -> bool {
        self.extension.is_some()
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(uri) = &self.extension {
            write!(f, "{}:", uri)?;
        }
        f.write_str(&self.attribute.name)?;
        if let Some(sub) = &self.sub_attribute {
            write!(f, ".{}", sub.name)?;
        }
        Ok(())
    }
}

/// Resolve `path` against `schema`.
///
/// A schema URI prefix may name the base schema or any extension. Unqualified
/// names are looked up in the base schema first, then in the extensions; an
/// unqualified name declared by more than one extension does not resolve.
pub fn resolve(schema: &ResourceSchema, path: &AttrPath) -> ResolveResult<ResolvedPath> {
    let (extension, attribute) = find_attribute(schema, path)?;

    let sub_attribute = match &path.sub_attribute {
        None => None,
        Some(sub) => Some(sub_attribute(attribute, sub, path)?.clone()),
    };

    Ok(ResolvedPath {
        extension,
        attribute: attribute.clone(),
        sub_attribute,
    })
}

/// Resolve the attribute of a value filter (`attr[...]`).
///
/// The attribute must be multi-valued and complex.
pub fn resolve_value_path(schema: &ResourceSchema, path: &AttrPath) -> ResolveResult<ResolvedPath> {
    let resolved = resolve(schema, path)?;
    if resolved.sub_attribute.is_some()
        || !(resolved.attribute.multi_valued && resolved.attribute.is_complex())
    {
        return Err(ResolveError::NotMultiValued {
            path: path.to_string(),
        });
    }
    Ok(resolved)
}

/// Resolve a path inside a value filter against the element's sub-attributes.
///
/// Element paths are single-level and unqualified: sub-attributes are never
/// complex themselves.
pub fn resolve_in_element<'a>(
    parent: &'a AttributeDefinition,
    path: &AttrPath,
) -> ResolveResult<&'a AttributeDefinition> {
    if path.uri.is_some() {
        return Err(ResolveError::unknown(path.to_string(), &parent.name));
    }
    let sub = sub_attribute(parent, &path.name, path)?;
    if let Some(nested) = &path.sub_attribute {
        return Err(ResolveError::type_mismatch(
            path.to_string(),
            format!("'{}' is not complex and has no sub-attribute '{}'", sub.name, nested),
        ));
    }
    Ok(sub)
}

fn find_attribute<'a>(
    schema: &'a ResourceSchema,
    path: &AttrPath,
) -> ResolveResult<(Option<String>, &'a AttributeDefinition)> {
    let unknown = |owner: &str| ResolveError::unknown(path.to_string(), owner);

    if let Some(uri) = &path.uri {
        if schema.is_base_uri(uri) {
            return schema
                .base()
                .attribute(&path.name)
                .map(|attr| (None, attr))
                .ok_or_else(|| unknown(schema.id()));
        }
        let extension = schema.extension(uri).ok_or_else(|| unknown(uri))?;
        return extension
            .schema
            .attribute(&path.name)
            .map(|attr| (Some(extension.schema.id.clone()), attr))
            .ok_or_else(|| unknown(&extension.schema.id));
    }

    if let Some(attr) = schema.base().attribute(&path.name) {
        return Ok((None, attr));
    }

    let mut candidates = schema.extensions().iter().filter_map(|extension| {
        extension
            .schema
            .attribute(&path.name)
            .map(|attr| (&extension.schema.id, attr))
    });
    match (candidates.next(), candidates.next()) {
        (Some((uri, attr)), None) => Ok((Some(uri.clone()), attr)),
        _ => Err(unknown(schema.name())),
    }
}

fn sub_attribute<'a>(
    parent: &'a AttributeDefinition,
    name: &str,
    path: &AttrPath,
) -> ResolveResult<&'a AttributeDefinition> {
    if !parent.is_complex() {
        return Err(ResolveError::type_mismatch(
            path.to_string(),
            format!(
                "'{}' is of type {} and has no sub-attributes",
                parent.name, parent.data_type
            ),
        ));
    }
    parent
        .sub_attribute(name)
        .ok_or_else(|| ResolveError::unknown(path.to_string(), &parent.name))
}
