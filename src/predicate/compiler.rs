//! Filter to predicate compilation.
//!
//! Resolves every attribute path of a [`Filter`] against a resource schema
//! and checks each comparison against the attribute's type, so that a
//! compiled [`Predicate`] can no longer fail when evaluated.

use super::{Comparison, Operand, Predicate};
use crate::config::FilterConfig;
use crate::error::{ResolveError, ResolveResult, ScimResult};
use crate::filter::{self, AttrPath, CompareOp, Filter, Literal};
use crate::resource::parse_datetime;
use crate::schema::{
    AttributeType, ResolvedPath, ResourceSchema, resolve, resolve_in_element, resolve_value_path,
};

use log::trace;

/// Compile a parsed filter against `schema`.
///
/// Resolution errors surface unchanged; literal and operator checks fail with
/// [`ResolveError::TypeMismatch`].
pub fn compile(schema: &ResourceSchema, filter: &Filter) -> ResolveResult<Predicate> {
    Compiler {
        schema,
        element: None,
    }
    .compile(filter)
}

/// Parse and compile a filter string with default limits.
pub fn compile_filter(schema: &ResourceSchema, source: &str) -> ScimResult<Predicate> {
    compile_filter_with_config(schema, source, &FilterConfig::default())
}

/// Parse and compile a filter string.
pub fn compile_filter_with_config(
    schema: &ResourceSchema,
    source: &str,
    config: &FilterConfig,
) -> ScimResult<Predicate> {
    let filter = filter::parse_with_config(source, config)?;
    let predicate = compile(schema, &filter)?;
    trace!("Compiled filter '{}' for {}: {}", source, schema.name(), predicate);
    Ok(predicate)
}

struct Compiler<'a> {
    schema: &'a ResourceSchema,
    /// The multi-valued attribute whose elements are in scope, inside a value filter.
    element: Option<&'a ResolvedPath>,
}

impl<'a> Compiler<'a> {
    fn compile(&self, filter: &Filter) -> ResolveResult<Predicate> {
        match filter {
            Filter::Not(inner) => Ok(Predicate::not(self.compile(inner)?)),
            Filter::And(left, right) => Ok(Predicate::and(
                self.compile(left)?,
                self.compile(right)?,
            )),
            Filter::Or(left, right) => Ok(Predicate::or(
                self.compile(left)?,
                self.compile(right)?,
            )),
            Filter::Paren(inner) => self.compile(inner),
            Filter::Presence(path) => Ok(Predicate::Present(self.resolve(path)?)),
            Filter::Compare(path, op, literal) => {
                compile_comparison(self.resolve(path)?, *op, literal)
            }
            Filter::ValuePath(path, inner) => {
                if self.element.is_some() {
                    return Err(ResolveError::NotMultiValued {
                        path: path.to_string(),
                    });
                }
                let resolved = resolve_value_path(self.schema, path)?;
                let inner = Compiler {
                    schema: self.schema,
                    element: Some(&resolved),
                }
                .compile(inner)?;
                Ok(Predicate::ValuePath(resolved, Box::new(inner)))
            }
        }
    }

    fn resolve(&self, path: &AttrPath) -> ResolveResult<ResolvedPath> {
        match self.element {
            None => resolve(self.schema, path),
            Some(parent) => {
                let sub = resolve_in_element(&parent.attribute, path)?;
                Ok(ResolvedPath {
                    sub_attribute: Some(sub.clone()),
                    ..parent.clone()
                })
            }
        }
    }
}

fn compile_comparison(
    path: ResolvedPath,
    op: CompareOp,
    literal: &Literal,
) -> ResolveResult<Predicate> {
    let path = compare_target(path)?;

    if *literal == Literal::Null {
        return match op {
            CompareOp::Eq => Ok(Predicate::not(Predicate::Present(path))),
            CompareOp::Ne => Ok(Predicate::Present(path)),
            _ => Err(ResolveError::type_mismatch(
                path.to_string(),
                format!("null can only be compared with 'eq' or 'ne', not '{}'", op),
            )),
        };
    }

    let data_type = path.target().data_type;
    let supported = match op {
        CompareOp::Eq | CompareOp::Ne => true,
        CompareOp::Co | CompareOp::Sw | CompareOp::Ew => {
            matches!(data_type, AttributeType::String | AttributeType::Reference)
        }
        CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le => data_type.is_ordered(),
    };
    if !supported {
        return Err(ResolveError::type_mismatch(
            path.to_string(),
            format!("operator '{}' is not supported for {} attributes", op, data_type),
        ));
    }

    let operand = operand(&path, data_type, literal)?;
    Ok(Predicate::Compare(Comparison { path, op, operand }))
}

/// Comparing a complex attribute compares its `value` sub-attribute.
fn compare_target(path: ResolvedPath) -> ResolveResult<ResolvedPath> {
    if !path.target().is_complex() {
        return Ok(path);
    }
    match path.attribute.sub_attribute("value") {
        Some(value) => Ok(ResolvedPath {
            sub_attribute: Some(value.clone()),
            ..path
        }),
        None => Err(ResolveError::type_mismatch(
            path.to_string(),
            "complex attribute without a 'value' sub-attribute cannot be compared",
        )),
    }
}

fn operand(path: &ResolvedPath, data_type: AttributeType, literal: &Literal) -> ResolveResult<Operand> {
    let mismatch = || {
        ResolveError::type_mismatch(
            path.to_string(),
            format!("{} attribute cannot be compared with a {} literal", data_type, literal.kind()),
        )
    };

    match (data_type, literal) {
        (
            AttributeType::String | AttributeType::Reference | AttributeType::Binary,
            Literal::String(s),
        ) => Ok(Operand::String(s.clone())),
        (AttributeType::Boolean, Literal::Bool(b)) => Ok(Operand::Boolean(*b)),
        (AttributeType::Integer, Literal::Number(n)) => n.as_i64().map(Operand::Integer).ok_or_else(|| {
            ResolveError::type_mismatch(
                path.to_string(),
                format!("integer attribute cannot be compared with {}", n),
            )
        }),
        (AttributeType::Decimal, Literal::Number(n)) => {
            n.as_f64().map(Operand::Decimal).ok_or_else(mismatch)
        }
        (AttributeType::DateTime, Literal::String(s)) => {
            parse_datetime(s).map(Operand::DateTime).ok_or_else(|| {
                ResolveError::type_mismatch(
                    path.to_string(),
                    format!("'{}' is not an RFC 3339 timestamp", s),
                )
            })
        }
        _ => Err(mismatch()),
    }
}
