//! In-memory predicate evaluation.

use super::{Comparison, Operand, Predicate};
use crate::filter::CompareOp;
use crate::resource::{Attributes, Document, Value, parse_datetime};
use crate::schema::ResolvedPath;
use std::borrow::Cow;
use std::cmp::Ordering;

/// What leaf paths are looked up in.
#[derive(Clone, Copy)]
enum Scope<'a> {
    Document(&'a Document),
    /// One element of a multi-valued complex attribute.
    Element(&'a Attributes),
}

impl<'a> Scope<'a> {
    fn lookup(self, path: &ResolvedPath) -> Option<Cow<'a, Value>> {
        match self {
            Scope::Document(document) => document.get(path),
            Scope::Element(element) => {
                let sub = path.sub_attribute.as_ref()?;
                element.get(&sub.name).map(Cow::Borrowed)
            }
        }
    }
}

impl Predicate {
    /// Evaluate the predicate against a document.
    pub fn matches(&self, document: &Document) -> bool {
        self.eval(Scope::Document(document))
    }

    fn eval(&self, scope: Scope<'_>) -> bool {
        match self {
            Predicate::Not(inner) => !inner.eval(scope),
            Predicate::And(left, right) => left.eval(scope) && right.eval(scope),
            Predicate::Or(left, right) => left.eval(scope) || right.eval(scope),
            Predicate::Present(path) => scope
                .lookup(path)
                .is_some_and(|value| value.is_present()),
            Predicate::Compare(comparison) => comparison.eval(scope),
            Predicate::ValuePath(path, inner) => {
                let Some(value) = scope.lookup(path) else {
                    return false;
                };
                value
                    .elements()
                    .iter()
                    .filter_map(Value::as_complex)
                    .any(|element| inner.eval(Scope::Element(element)))
            }
        }
    }
}

impl Comparison {
    fn eval(&self, scope: Scope<'_>) -> bool {
        // `ne` is the negation of `eq`, so it holds for absent attributes.
        let (op, negate) = match self.op {
            CompareOp::Ne => (CompareOp::Eq, true),
            op => (op, false),
        };
        let matched = scope.lookup(&self.path).is_some_and(|value| {
            value
                .elements()
                .iter()
                .any(|element| self.matches_value(op, element))
        });
        matched != negate
    }

    fn matches_value(&self, op: CompareOp, value: &Value) -> bool {
        match (&self.operand, value) {
            (Operand::String(expected), Value::String(actual)) => {
                compare_strings(op, actual, expected, self.case_exact())
            }
            (Operand::Boolean(expected), Value::Boolean(actual)) => {
                op == CompareOp::Eq && actual == expected
            }
            (Operand::Integer(expected), Value::Integer(actual)) => {
                ordering_matches(op, actual.cmp(expected))
            }
            (Operand::Integer(expected), Value::Decimal(actual)) => actual
                .partial_cmp(&(*expected as f64))
                .is_some_and(|ordering| ordering_matches(op, ordering)),
            (Operand::Decimal(expected), actual) => actual
                .as_f64()
                .and_then(|actual| actual.partial_cmp(expected))
                .is_some_and(|ordering| ordering_matches(op, ordering)),
            (Operand::DateTime(expected), Value::String(actual)) => parse_datetime(actual)
                .is_some_and(|actual| ordering_matches(op, actual.cmp(expected))),
            _ => false,
        }
    }
}

fn compare_strings(op: CompareOp, actual: &str, expected: &str, case_exact: bool) -> bool {
    let (actual, expected) = if case_exact {
        (Cow::Borrowed(actual), Cow::Borrowed(expected))
    } else {
        (
            Cow::Owned(actual.to_lowercase()),
            Cow::Owned(expected.to_lowercase()),
        )
    };
    match op {
        CompareOp::Eq => actual == expected,
        CompareOp::Co => actual.contains(expected.as_ref()),
        CompareOp::Sw => actual.starts_with(expected.as_ref()),
        CompareOp::Ew => actual.ends_with(expected.as_ref()),
        CompareOp::Ne | CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le => false,
    }
}

fn ordering_matches(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Ne | CompareOp::Co | CompareOp::Sw | CompareOp::Ew => false,
    }
}
