//! `attributes` / `excludedAttributes` selections.

use crate::error::{ProjectionError, ProjectionResult};
use crate::filter::{AttrPath, parse_attr_path};
use crate::schema::{ResolvedPath, ResourceSchema, resolve};

/// The attribute paths a request asked to include or exclude.
///
/// At most one of the two lists is non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSelection {
    requested: Vec<AttrPath>,
    excluded: Vec<AttrPath>,
}

impl AttributeSelection {
    /// Parse request parameter values.
    ///
    /// Entries may themselves be comma-separated lists, as in the raw
    /// `attributes=userName,emails` query parameter. Blank entries are
    /// ignored.
    ///
    /// ```rust
    /// use scim_core::projection::AttributeSelection;
    ///
    /// let selection = AttributeSelection::from_request(&["userName,name.givenName"], &[]).unwrap();
    /// assert_eq!(selection.requested().len(), 2);
    /// assert!(AttributeSelection::from_request(&["userName"], &["emails"]).is_err());
    /// ```
    pub fn from_request(requested: &[&str], excluded: &[&str]) -> ProjectionResult<Self> {
        let requested = parse_paths(requested)?;
        let excluded = parse_paths(excluded)?;
        if !requested.is_empty() && !excluded.is_empty() {
            return Err(ProjectionError::ConflictingSelection);
        }
        Ok(Self {
            requested,
            excluded,
        })
    }

    pub fn requested(&self) -> &[AttrPath] {
        &self.requested
    }

    pub fn excluded(&self) -> &[AttrPath] {
        &self.excluded
    }

    pub fn is_empty(&self) -> bool {
        self.requested.is_empty() && self.excluded.is_empty()
    }
}

fn parse_paths(entries: &[&str]) -> ProjectionResult<Vec<AttrPath>> {
    entries
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            parse_attr_path(entry).map_err(|source| ProjectionError::InvalidPath {
                path: entry.to_string(),
                source,
            })
        })
        .collect()
}

/// A selection entry bound to the schema.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Selector {
    /// A whole extension schema, named by its URI alone
    Extension(String),
    Attribute(ResolvedPath),
}

pub(crate) fn bind(schema: &ResourceSchema, paths: &[AttrPath]) -> ProjectionResult<Vec<Selector>> {
    paths
        .iter()
        .map(|path| {
            // A bare extension URI lexes as `<prefix>:<last segment>`.
            let text = path.to_string();
            if let Some(extension) = schema.extension(&text) {
                return Ok(Selector::Extension(extension.schema.id.clone()));
            }
            Ok(Selector::Attribute(resolve(schema, path)?))
        })
        .collect()
}

/// Whether `path` lives in `scope` (`None` for the base schema).
fn same_scope(path: &ResolvedPath, scope: Option<&str>) -> bool {
    match (path.extension.as_deref(), scope) {
        (None, None) => true,
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

pub(crate) fn names_attribute(selectors: &[Selector], scope: Option<&str>, name: &str) -> bool {
    selectors.iter().any(|selector| match selector {
        Selector::Attribute(path) => {
            same_scope(path, scope)
                && path.sub_attribute.is_none()
                && path.attribute.name.eq_ignore_ascii_case(name)
        }
        Selector::Extension(_) => false,
    })
}

pub(crate) fn names_sub_attribute(
    selectors: &[Selector],
    scope: Option<&str>,
    name: &str,
    sub: Option<&str>,
) -> bool {
    selectors.iter().any(|selector| match selector {
        Selector::Attribute(path) => {
            same_scope(path, scope)
                && path.attribute.name.eq_ignore_ascii_case(name)
                && match (&path.sub_attribute, sub) {
                    (Some(selected), Some(sub)) => selected.name.eq_ignore_ascii_case(sub),
                    (Some(_), None) => true,
                    (None, _) => false,
                }
        }
        Selector::Extension(_) => false,
    })
}

pub(crate) fn names_extension(selectors: &[Selector], scope: Option<&str>) -> bool {
    let Some(scope) = scope else {
        return false;
    };
    selectors.iter().any(|selector| match selector {
        Selector::Extension(uri) => uri.eq_ignore_ascii_case(scope),
        Selector::Attribute(_) => false,
    })
}
