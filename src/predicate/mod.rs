//! Compiled filter predicates.
//!
//! A [`Predicate`] is a filter whose attribute paths have been resolved
//! against a [`ResourceSchema`](crate::schema::ResourceSchema) and whose
//! literals have been checked and converted to the attribute's type. It keeps
//! the filter's shape, so it serves two kinds of consumer:
//!
//! - in-memory evaluation with [`Predicate::matches`]
//! - storage adapters that walk the public tree and lower each leaf into
//!   their own query language
//!
//! ```rust
//! use scim_core::predicate::compile_filter;
//! use scim_core::resource::Document;
//! use scim_core::schema::SchemaRegistry;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::new()?;
//! let users = registry.get_user_schema().expect("embedded User type");
//! let predicate = compile_filter(users, r#"emails[type eq "work" and primary eq true]"#)?;
//!
//! let document = Document::parse(users, &json!({
//!     "userName": "bjensen",
//!     "emails": [
//!         { "value": "bjensen@example.com", "type": "work", "primary": true },
//!         { "value": "babs@jensen.org", "type": "home" }
//!     ]
//! }))?;
//! assert!(predicate.matches(&document));
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod evaluator;

pub use compiler::{compile, compile_filter, compile_filter_with_config};

use crate::filter::CompareOp;
use crate::schema::ResolvedPath;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// A filter bound to a resource schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    /// The attribute holds an assigned value
    Present(ResolvedPath),
    Compare(Comparison),
    /// At least one element of a multi-valued complex attribute satisfies
    /// the inner predicate, whose leaves address that attribute's
    /// sub-attributes.
    ValuePath(ResolvedPath, Box<Predicate>),
}

impl Predicate {
    pub fn not(inner: Predicate) -> Self {
        Predicate::Not(Box::new(inner))
    }

    pub fn and(left: Predicate, right: Predicate) -> Self {
        Predicate::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Predicate, right: Predicate) -> Self {
        Predicate::Or(Box::new(left), Box::new(right))
    }

    /// Leaf predicates (presence tests and comparisons) in source order.
    pub fn leaves(&self) -> Vec<&Predicate> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a Predicate>) {
        match self {
            Predicate::Not(inner) | Predicate::ValuePath(_, inner) => inner.collect_leaves(leaves),
            Predicate::And(left, right) | Predicate::Or(left, right) => {
                left.collect_leaves(leaves);
                right.collect_leaves(leaves);
            }
            Predicate::Present(_) | Predicate::Compare(_) => leaves.push(self),
        }
    }
}

/// A comparison leaf: `path op operand`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub path: ResolvedPath,
    pub op: CompareOp,
    pub operand: Operand,
}

impl Comparison {
    /// Whether string comparison is case-sensitive for this leaf.
    pub fn case_exact(&self) -> bool {
        let target = self.path.target();
        target.case_exact || target.data_type == crate::schema::AttributeType::Binary
    }
}

/// A literal converted to the type of the attribute it is compared with.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    String(String),
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    DateTime(DateTime<Utc>),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::String(s) => write!(f, "{}", crate::filter::Literal::String(s.clone())),
            Operand::Boolean(b) => write!(f, "{}", b),
            Operand::Integer(i) => write!(f, "{}", i),
            Operand::Decimal(d) => write!(f, "{}", d),
            Operand::DateTime(dt) => {
                write!(f, "\"{}\"", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }
}

/// Renders the predicate as filter text with fully resolved paths. Leaves
/// inside a value filter are named by their sub-attribute, so the text
/// parses back.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = Rendered {
            predicate: self,
            in_element: false,
        };
        fmt::Display::fmt(&rendered, f)
    }
}

struct Rendered<'a> {
    predicate: &'a Predicate,
    in_element: bool,
}

impl Rendered<'_> {
    fn child<'b>(&self, predicate: &'b Predicate) -> Rendered<'b> {
        Rendered {
            predicate,
            in_element: self.in_element,
        }
    }

    fn path(&self, f: &mut fmt::Formatter<'_>, path: &ResolvedPath) -> fmt::Result {
        match (&path.sub_attribute, self.in_element) {
            (Some(sub), true) => f.write_str(&sub.name),
            _ => write!(f, "{}", path),
        }
    }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.predicate {
            Predicate::Not(inner) => write!(f, "not ({})", self.child(inner)),
            Predicate::And(left, right) => {
                write!(f, "({}) and ({})", self.child(left), self.child(right))
            }
            Predicate::Or(left, right) => {
                write!(f, "({}) or ({})", self.child(left), self.child(right))
            }
            Predicate::Present(path) => {
                self.path(f, path)?;
                f.write_str(" pr")
            }
            Predicate::Compare(c) => {
                self.path(f, &c.path)?;
                write!(f, " {} {}", c.op, c.operand)
            }
            Predicate::ValuePath(path, inner) => {
                let inner = Rendered {
                    predicate: inner,
                    in_element: true,
                };
                write!(f, "{}[{}]", path, inner)
            }
        }
    }
}
