//! Read-path projection.
//!
//! Decides which attributes of a document appear in a response, from each
//! attribute's `returned` characteristic and the request's `attributes` /
//! `excludedAttributes` selection.

use super::selection::{
    AttributeSelection, Selector, bind, names_attribute, names_extension, names_sub_attribute,
};
use crate::error::{ProjectionError, ProjectionResult};
use crate::filter::AttrPath;
use crate::resource::{Attributes, Document, Value};
use crate::schema::{AttributeDefinition, ResourceSchema, Returned};

/// Project `document` for output.
///
/// Per attribute: `returned=always` is always included, `returned=never`
/// and writeOnly attributes never are, `returned=request` only when named in
/// `requested`, and `returned=default` unless named in `excluded` or left out
/// of a non-empty `requested`. Sub-attributes follow their parent unless
/// addressed themselves. `schemas` and `id` are always kept; `meta` is kept
/// or dropped as a whole.
///
/// Naming both `requested` and `excluded` paths is a
/// [`ProjectionError::ConflictingSelection`].
pub fn project(
    schema: &ResourceSchema,
    document: &Document,
    requested: &[AttrPath],
    excluded: &[AttrPath],
) -> ProjectionResult<Document> {
    if !requested.is_empty() && !excluded.is_empty() {
        return Err(ProjectionError::ConflictingSelection);
    }
    let projector = Projector {
        requested: bind(schema, requested)?,
        excluded: bind(schema, excluded)?,
    };

    let base = schema.base();
    let mut projected = Document::new(document.resource_type());
    projected.id = document.id.clone();
    projected.schemas.push(base.id.clone());

    if let Some(meta) = &document.meta {
        if let Some(definition) = base.attribute("meta") {
            if projector.decide(None, definition) != Decision::Omit {
                projected.meta = Some(meta.clone());
            }
        }
    }

    projected.attributes = projector.project_attributes(None, &base.attributes, &document.attributes);

    for extension in schema.extensions() {
        let uri = &extension.schema.id;
        let Some(values) = document.extension(uri) else {
            continue;
        };
        let attributes = projector.project_attributes(Some(uri), &extension.schema.attributes, values);
        if !attributes.is_empty() {
            projected.schemas.push(uri.clone());
            projected.extensions.insert(uri.clone(), attributes);
        }
    }

    Ok(projected)
}

/// Project with a parsed request selection.
pub fn project_selection(
    schema: &ResourceSchema,
    document: &Document,
    selection: &AttributeSelection,
) -> ProjectionResult<Document> {
    project(schema, document, selection.requested(), selection.excluded())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Omit,
    /// The attribute with every returnable sub-attribute
    Whole,
    /// Only the sub-attributes named in the request
    Named,
}

struct Projector {
    requested: Vec<Selector>,
    excluded: Vec<Selector>,
}

impl Projector {
    fn project_attributes(
        &self,
        scope: Option<&str>,
        definitions: &[AttributeDefinition],
        values: &Attributes,
    ) -> Attributes {
        let mut projected = Attributes::new();
        for definition in definitions {
            if is_lifted(scope, definition) {
                continue;
            }
            let Some(value) = values.get(&definition.name) else {
                continue;
            };
            let decision = self.decide(scope, definition);
            if decision == Decision::Omit {
                continue;
            }
            if let Some(value) = self.project_value(scope, definition, decision, value) {
                projected.insert(definition.name.clone(), value);
            }
        }
        projected
    }

    fn decide(&self, scope: Option<&str>, definition: &AttributeDefinition) -> Decision {
        if !definition.is_returnable() {
            return Decision::Omit;
        }
        if definition.returned == Returned::Always {
            return Decision::Whole;
        }

        let name = &definition.name;
        if !self.requested.is_empty() {
            let whole_extension = definition.returned != Returned::Request
                && names_extension(&self.requested, scope);
            if names_attribute(&self.requested, scope, name) || whole_extension {
                Decision::Whole
            } else if names_sub_attribute(&self.requested, scope, name, None) {
                Decision::Named
            } else {
                Decision::Omit
            }
        } else if definition.returned == Returned::Request
            || names_attribute(&self.excluded, scope, name)
            || names_extension(&self.excluded, scope)
        {
            Decision::Omit
        } else {
            Decision::Whole
        }
    }

    fn keep_sub_attribute(
        &self,
        scope: Option<&str>,
        parent: &AttributeDefinition,
        sub: &AttributeDefinition,
        decision: Decision,
    ) -> bool {
        if !sub.is_returnable() {
            return false;
        }
        if sub.returned == Returned::Always {
            return true;
        }
        if names_sub_attribute(&self.requested, scope, &parent.name, Some(&sub.name)) {
            return true;
        }
        if sub.returned == Returned::Request {
            return false;
        }
        decision == Decision::Whole
            && !names_sub_attribute(&self.excluded, scope, &parent.name, Some(&sub.name))
    }

    fn project_value(
        &self,
        scope: Option<&str>,
        definition: &AttributeDefinition,
        decision: Decision,
        value: &Value,
    ) -> Option<Value> {
        if !definition.is_complex() {
            return Some(value.clone());
        }

        let project_element = |element: &Value| -> Option<Value> {
            let attributes = element.as_complex()?;
            let kept: Attributes = definition
                .sub_attributes
                .iter()
                .filter(|sub| self.keep_sub_attribute(scope, definition, sub, decision))
                .filter_map(|sub| {
                    attributes
                        .get(&sub.name)
                        .map(|value| (sub.name.clone(), value.clone()))
                })
                .collect();
            (!kept.is_empty()).then_some(Value::Complex(kept))
        };

        match value {
            Value::List(items) => {
                let items: Vec<Value> = items.iter().filter_map(project_element).collect();
                (!items.is_empty()).then_some(Value::List(items))
            }
            element => project_element(element),
        }
    }
}

/// `schemas`, `id` and `meta` live in their own document fields.
pub(super) fn is_lifted(scope: Option<&str>, definition: &AttributeDefinition) -> bool {
    scope.is_none()
        && ["schemas", "id", "meta"]
            .iter()
            .any(|name| definition.name.eq_ignore_ascii_case(name))
}
