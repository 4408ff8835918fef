//! Lowering compiled predicates into a storage query language.
//!
//! A storage adapter walks the public predicate tree instead of re-parsing
//! filter text. This module lowers predicates into a SQL-like `WHERE` clause
//! over a table with one column per attribute path and a joinable element
//! table per multi-valued attribute.

use crate::common;
use chrono::SecondsFormat;
use scim_core::filter::CompareOp;
use scim_core::predicate::{Comparison, Operand, Predicate, compile_filter};
use scim_core::schema::ResolvedPath;

fn lower(predicate: &Predicate, in_element: bool) -> String {
    match predicate {
        Predicate::Not(inner) => format!("NOT ({})", lower(inner, in_element)),
        Predicate::And(left, right) => format!(
            "({} AND {})",
            lower(left, in_element),
            lower(right, in_element)
        ),
        Predicate::Or(left, right) => format!(
            "({} OR {})",
            lower(left, in_element),
            lower(right, in_element)
        ),
        Predicate::Present(path) => format!("{} IS NOT NULL", column(path, in_element)),
        Predicate::Compare(comparison) => lower_comparison(comparison, in_element),
        Predicate::ValuePath(path, inner) => format!(
            "EXISTS (SELECT 1 FROM {} AS elem WHERE {})",
            quote_identifier(&path.to_string()),
            lower(inner, true)
        ),
    }
}

fn column(path: &ResolvedPath, in_element: bool) -> String {
    match (&path.sub_attribute, in_element) {
        (Some(sub), true) => format!("elem.{}", quote_identifier(&sub.name)),
        _ => quote_identifier(&path.to_string()),
    }
}

fn lower_comparison(comparison: &Comparison, in_element: bool) -> String {
    let mut column = column(&comparison.path, in_element);
    let fold = matches!(comparison.operand, Operand::String(_)) && !comparison.case_exact();
    if fold {
        column = format!("LOWER({})", column);
    }

    let value = match &comparison.operand {
        Operand::String(s) => {
            let s = if fold { s.to_lowercase() } else { s.clone() };
            match comparison.op {
                CompareOp::Co => quote_literal(&format!("%{}%", s)),
                CompareOp::Sw => quote_literal(&format!("{}%", s)),
                CompareOp::Ew => quote_literal(&format!("%{}", s)),
                _ => quote_literal(&s),
            }
        }
        Operand::Boolean(b) => b.to_string().to_uppercase(),
        Operand::Integer(i) => i.to_string(),
        Operand::Decimal(d) => d.to_string(),
        Operand::DateTime(dt) => quote_literal(&dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
    };

    let op = match comparison.op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Co | CompareOp::Sw | CompareOp::Ew => "LIKE",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
    };
    format!("{} {} {}", column, op, value)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn lower_filter(filter: &str) -> String {
    let schema = common::user_schema();
    let predicate = compile_filter(&schema, filter).expect("filter compiles");
    lower(&predicate, false)
}

#[test]
fn test_lower_case_insensitive_equality() {
    assert_eq!(
        lower_filter(r#"userName eq "BJensen""#),
        r#"LOWER("userName") = 'bjensen'"#
    );
    assert_eq!(
        lower_filter(r#"name.familyName co "O'Malley""#),
        r#"LOWER("name.familyName") LIKE '%o''malley%'"#
    );
}

#[test]
fn test_lower_logical_operators() {
    assert_eq!(
        lower_filter("title pr and not (active eq false)"),
        r#"("title" IS NOT NULL AND NOT ("active" = FALSE))"#
    );
    assert_eq!(
        lower_filter(r#"userType eq "Intern" or nickName eq null"#),
        r#"(LOWER("userType") = 'intern' OR NOT ("nickName" IS NOT NULL))"#
    );
}

#[test]
fn test_lower_value_path() {
    assert_eq!(
        lower_filter(r#"emails[type eq "work" and value ew "@example.com"]"#),
        concat!(
            r#"EXISTS (SELECT 1 FROM "emails" AS elem WHERE "#,
            r#"(LOWER(elem."type") = 'work' AND LOWER(elem."value") LIKE '%@example.com'))"#
        )
    );
}

#[test]
fn test_lower_typed_operands() {
    assert_eq!(
        lower_filter(r#"meta.lastModified gt "2011-05-13T04:42:34Z""#),
        r#""meta.lastModified" > '2011-05-13T04:42:34Z'"#
    );
    assert_eq!(
        lower_filter(r#"x509Certificates.value eq "TUlJRE9q""#),
        r#""x509Certificates.value" = 'TUlJRE9q'"#
    );
    assert_eq!(
        lower_filter(r#"emails co "example.org""#),
        r#"LOWER("emails.value") LIKE '%example.org%'"#
    );
}

#[test]
fn test_lower_extension_columns() {
    assert_eq!(
        lower_filter(r#"employeeNumber sw "70""#),
        r#"LOWER("urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:employeeNumber") LIKE '70%'"#
    );
}

#[test]
fn test_leaves_follow_source_order() {
    let schema = common::user_schema();
    let predicate = compile_filter(
        &schema,
        r#"title pr or (emails[type eq "work"] and not (userType eq "Intern"))"#,
    )
    .unwrap();

    let leaves: Vec<String> = predicate.leaves().iter().map(|leaf| leaf.to_string()).collect();
    assert_eq!(
        leaves,
        ["title pr", r#"emails.type eq "work""#, r#"userType eq "Intern""#]
    );
}
