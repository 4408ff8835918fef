//! Filter abstract syntax tree.
//!
//! The AST is a faithful, schema-free image of the filter text. Parentheses
//! are kept as [`Filter::Paren`] so rendering reproduces the caller's grouping;
//! they have no effect on evaluation.

use serde_json::Number;
use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Not(Box<Filter>),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Paren(Box<Filter>),
    /// `attr pr`
    Presence(AttrPath),
    /// `attr op literal`
    Compare(AttrPath, CompareOp, Literal),
    /// `attr[filter]`, the inner filter applied to each element
    ValuePath(AttrPath, Box<Filter>),
}

impl Filter {
    pub fn not(inner: Filter) -> Self {
        Filter::Not(Box::new(inner))
    }

    pub fn and(left: Filter, right: Filter) -> Self {
        Filter::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Filter, right: Filter) -> Self {
        Filter::Or(Box::new(left), Box::new(right))
    }

    pub fn paren(inner: Filter) -> Self {
        Filter::Paren(Box::new(inner))
    }

    pub fn present(path: AttrPath) -> Self {
        Filter::Presence(path)
    }

    pub fn compare(path: AttrPath, op: CompareOp, value: impl Into<Literal>) -> Self {
        Filter::Compare(path, op, value.into())
    }

    pub fn value_path(path: AttrPath, inner: Filter) -> Self {
        Filter::ValuePath(path, Box::new(inner))
    }

    /// The filter with every `Paren` node removed.
    pub fn without_parens(&self) -> Filter {
        match self {
            Filter::Paren(inner) => inner.without_parens(),
            Filter::Not(inner) => Filter::not(inner.without_parens()),
            Filter::And(left, right) => Filter::and(left.without_parens(), right.without_parens()),
            Filter::Or(left, right) => Filter::or(left.without_parens(), right.without_parens()),
            Filter::ValuePath(path, inner) => Filter::value_path(path.clone(), inner.without_parens()),
            Filter::Presence(_) | Filter::Compare(..) => self.clone(),
        }
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        super::parse(input)
    }
}

/// Address of an attribute: optional schema URI, name, optional sub-attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrPath {
    pub uri: Option<String>,
    pub name: String,
    pub sub_attribute: Option<String>,
}

impl AttrPath {
    /// Unqualified single-level path.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uri: None,
            name: name.into(),
            sub_attribute: None,
        }
    }

    /// Two-level path `name.sub`.
    pub fn with_sub(name: impl Into<String>, sub_attribute: impl Into<String>) -> Self {
        Self {
            sub_attribute: Some(sub_attribute.into()),
            ..Self::new(name)
        }
    }

    /// Qualify the path with a schema URI.
    pub fn in_schema(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(uri) = &self.uri {
            write!(f, "{}:", uri)?;
        }
        f.write_str(&self.name)?;
        if let Some(sub) = &self.sub_attribute {
            write!(f, ".{}", sub)?;
        }
        Ok(())
    }
}

impl FromStr for AttrPath {
    type Err = FilterError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        super::parser::parse_attr_path(input)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Co,
    Sw,
    Ew,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Co => "co",
            CompareOp::Sw => "sw",
            CompareOp::Ew => "ew",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
        }
    }

    /// `gt`, `ge`, `lt` or `le`.
    pub fn is_ordering(self) -> bool {
        matches!(self, CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le)
    }

    /// `co`, `sw` or `ew`.
    pub fn is_substring(self) -> bool {
        matches!(self, CompareOp::Co | CompareOp::Sw | CompareOp::Ew)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

impl Literal {
    /// Kind name used in type mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Number(_) => "number",
            Literal::Bool(_) => "boolean",
            Literal::Null => "null",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(value) => {
                f.write_str("\"")?;
                for c in value.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("\"")
            }
            Literal::Number(value) => write!(f, "{}", value),
            Literal::Bool(value) => write!(f, "{}", value),
            Literal::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Number(Number::from(value))
    }
}
