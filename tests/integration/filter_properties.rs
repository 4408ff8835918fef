//! Property tests for filter rendering.
//!
//! Rendering a filter tree and parsing the text back must give the same tree
//! (up to grouping parentheses), and the compiled forms of both must agree on
//! every document.

use crate::common::{self, fixtures};
use proptest::prelude::*;
use scim_core::filter::{self, AttrPath, CompareOp, Filter, Literal};
use scim_core::predicate::compile;
use scim_core::schema::embedded::ENTERPRISE_USER_SCHEMA_URI;

const KEYWORDS: &[&str] = &[
    "and", "or", "not", "pr", "eq", "ne", "co", "sw", "ew", "gt", "ge", "lt", "le", "true",
    "false", "null",
];

fn name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,8}"
        .prop_filter("keywords are not attribute names", |name| {
            !KEYWORDS.contains(&name.to_ascii_lowercase().as_str())
        })
}

fn attr_path() -> impl Strategy<Value = AttrPath> {
    prop_oneof![
        Just(AttrPath::new("userName")),
        Just(AttrPath::with_sub("name", "givenName")),
        Just(AttrPath::new("employeeNumber").in_schema(ENTERPRISE_USER_SCHEMA_URI)),
        name().prop_map(AttrPath::new),
        (name(), name()).prop_map(|(name, sub)| AttrPath::with_sub(name, sub)),
    ]
}

fn literal() -> impl Strategy<Value = Literal> {
    prop_oneof![
        "[a-zA-Z0-9 \"\\\\._@:-]{0,12}".prop_map(Literal::String),
        (-1_000_000i64..1_000_000).prop_map(Literal::from),
        any::<bool>().prop_map(Literal::Bool),
        Just(Literal::Null),
    ]
}

fn compare_op() -> impl Strategy<Value = CompareOp> {
    prop::sample::select(vec![
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Co,
        CompareOp::Sw,
        CompareOp::Ew,
        CompareOp::Gt,
        CompareOp::Ge,
        CompareOp::Lt,
        CompareOp::Le,
    ])
}

fn simple_leaf() -> impl Strategy<Value = Filter> {
    prop_oneof![
        attr_path().prop_map(Filter::present),
        (attr_path(), compare_op(), literal()).prop_map(|(path, op, value)| Filter::compare(path, op, value)),
    ]
}

fn leaf() -> impl Strategy<Value = Filter> {
    prop_oneof![
        3 => simple_leaf(),
        1 => (name(), name(), compare_op(), literal()).prop_map(|(name, sub, op, value)| {
            Filter::value_path(
                AttrPath::new(name),
                Filter::compare(AttrPath::new(sub), op, value),
            )
        }),
    ]
}

fn combine(leaf: BoxedStrategy<Filter>) -> BoxedStrategy<Filter> {
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(Filter::not),
            (inner.clone(), inner.clone()).prop_map(|(left, right)| Filter::and(left, right)),
            (inner.clone(), inner).prop_map(|(left, right)| Filter::or(left, right)),
        ]
    })
    .boxed()
}

/// Leaves that compile against the User schema.
fn user_leaf() -> BoxedStrategy<Filter> {
    prop::sample::select(vec![
        "title pr",
        "nickName pr",
        r#"userName sw "b""#,
        r#"title co "guide""#,
        "active eq true",
        r#"userType ne "Intern""#,
        r#"emails[type eq "work"]"#,
        r#"emails.value ew "example.com""#,
        r#"meta.lastModified gt "2011-01-01T00:00:00Z""#,
        "employeeNumber pr",
        "x509Certificates pr",
    ])
    .prop_map(|source| filter::parse(source).expect("leaf parses"))
    .boxed()
}

proptest! {
    #[test]
    fn rendered_filters_reparse_to_the_same_tree(tree in combine(leaf().boxed())) {
        let rendered = tree.to_string();
        let parsed = filter::parse(&rendered)
            .map_err(|e| TestCaseError::fail(format!("'{}' failed to parse: {}", rendered, e)))?;

        prop_assert_eq!(parsed.without_parens(), tree.without_parens());
        prop_assert_eq!(parsed.to_string(), rendered);
    }

    #[test]
    fn rendered_filters_evaluate_identically(tree in combine(user_leaf())) {
        let schema = common::user_schema();
        let documents: Vec<_> = fixtures::users().iter().map(common::user).collect();

        let original = compile(&schema, &tree).expect("tree compiles");
        let reparsed = filter::parse(&tree.to_string()).expect("rendered filter parses");
        let recompiled = compile(&schema, &reparsed).expect("reparsed tree compiles");

        for document in &documents {
            prop_assert_eq!(original.matches(document), recompiled.matches(document));
        }
    }
}
