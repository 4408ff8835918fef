//! Filter evaluation over a population of users.

use crate::common::{self, fixtures};
use scim_core::error::{FilterError, ResolveError, ScimError};
use scim_core::predicate::{compile_filter, compile_filter_with_config};
use scim_core::resource::Document;
use scim_core::FilterConfig;

fn population() -> Vec<Document> {
    fixtures::users().iter().map(common::user).collect()
}

/// User names of the population members matching `filter`.
fn search(filter: &str) -> Vec<String> {
    common::init_logging();
    let schema = common::user_schema();
    let predicate = compile_filter(&schema, filter)
        .unwrap_or_else(|e| panic!("'{}' should compile: {}", filter, e));
    population()
        .iter()
        .filter(|document| predicate.matches(document))
        .map(|document| {
            document
                .attribute("userName")
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

#[test]
fn test_rfc_filter_examples() {
    let cases: &[(&str, &[&str])] = &[
        (r#"userName Eq "bjensen@example.com""#, &["bjensen@example.com"]),
        (r#"name.familyName co "O'Malley""#, &[]),
        (r#"userName sw "J""#, &["jsmith"]),
        (
            r#"urn:ietf:params:scim:schemas:core:2.0:User:userName sw "J""#,
            &["jsmith"],
        ),
        ("title pr", &["bjensen@example.com", "jsmith"]),
        (
            r#"meta.lastModified gt "2011-05-13T04:42:34Z""#,
            &["jsmith", "intern42"],
        ),
        (
            r#"meta.lastModified ge "2011-05-13T04:42:34Z""#,
            &["bjensen@example.com", "jsmith", "intern42"],
        ),
        (r#"meta.lastModified lt "2011-05-13T04:42:34Z""#, &[]),
        (
            r#"meta.lastModified le "2011-05-13T04:42:34Z""#,
            &["bjensen@example.com"],
        ),
        (
            r#"title pr and userType eq "Employee""#,
            &["bjensen@example.com", "jsmith"],
        ),
        (
            r#"title pr or userType eq "Intern""#,
            &["bjensen@example.com", "jsmith", "intern42"],
        ),
        (
            r#"schemas eq "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User""#,
            &["bjensen@example.com"],
        ),
        (
            r#"userType eq "Employee" and (emails co "example.com" or emails.value co "example.org")"#,
            &["bjensen@example.com", "jsmith"],
        ),
        (
            r#"userType ne "Employee" and not (emails co "example.com" or emails.value co "example.org")"#,
            &[],
        ),
        (
            r#"userType eq "Employee" and (emails.type eq "work")"#,
            &["bjensen@example.com", "jsmith"],
        ),
        (
            r#"userType eq "Employee" and emails[type eq "work" and value co "@example.com"]"#,
            &["bjensen@example.com", "jsmith"],
        ),
        (
            r#"emails[type eq "work" and value co "@example.com"] or ims[type eq "xmpp" and value co "@foo.com"]"#,
            &["bjensen@example.com", "jsmith"],
        ),
    ];

    for (filter, expected) in cases {
        assert_eq!(&search(filter), expected, "filter: {}", filter);
    }
}

#[test]
fn test_extension_and_multi_valued_filters() {
    assert_eq!(search(r#"department eq "tour operations""#), ["bjensen@example.com"]);
    assert_eq!(
        search(r#"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:manager.value pr"#),
        ["bjensen@example.com"]
    );
    assert_eq!(
        search(r#"phoneNumbers[type eq "mobile" and value sw "555"]"#),
        ["bjensen@example.com"]
    );
    assert_eq!(search("active eq false"), ["intern42"]);
    assert_eq!(search("nickName eq null"), ["jsmith", "intern42"]);
}

#[test]
fn test_binary_attributes_are_case_exact() {
    assert_eq!(
        search(r#"x509Certificates.value eq "TUlJRE9qQ0NBcU9nQXdJQkFnSUpBSnBUZ1U=""#),
        ["bjensen@example.com"]
    );
    assert!(search(r#"x509Certificates.value eq "tuljre9qq0nbcu9nqxdjqkfnsupbsnbuz1u=""#).is_empty());
}

#[test]
fn test_compile_errors_are_typed() {
    let schema = common::user_schema();

    match compile_filter(&schema, "userName eq") {
        Err(ScimError::Filter(FilterError::Parse(e))) => assert_eq!(e.position.offset(), 11),
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(matches!(
        compile_filter(&schema, "shoeSize gt 9"),
        Err(ScimError::Resolve(ResolveError::UnknownAttribute { .. }))
    ));
    assert!(matches!(
        compile_filter(&schema, "active gt true"),
        Err(ScimError::Resolve(ResolveError::TypeMismatch { .. }))
    ));
    assert!(matches!(
        compile_filter(&schema, r#"title[value eq "x"]"#),
        Err(ScimError::Resolve(ResolveError::NotMultiValued { .. }))
    ));
}

#[test]
fn test_filter_limits() {
    let schema = common::user_schema();
    let config = FilterConfig {
        max_length: 16,
        ..FilterConfig::default()
    };
    assert!(compile_filter_with_config(&schema, "title pr", &config).is_ok());
    assert!(compile_filter_with_config(&schema, r#"userName eq "bjensen""#, &config).is_err());

    let shallow = FilterConfig {
        max_depth: 2,
        ..FilterConfig::default()
    };
    assert!(compile_filter_with_config(&schema, "((((title pr))))", &shallow).is_err());
}

#[test]
fn test_group_members_filter() {
    let schema = common::group_schema();
    let group = Document::parse(
        &schema,
        &serde_json::json!({
            "displayName": "Tour Guides",
            "members": [
                { "value": "2819c223-7f76-453a-919d-413861904646", "type": "User" }
            ]
        }),
    )
    .unwrap();

    let predicate = compile_filter(
        &schema,
        r#"members[value eq "2819c223-7f76-453a-919d-413861904646"]"#,
    )
    .unwrap();
    assert!(predicate.matches(&group));

    let predicate = compile_filter(&schema, r#"displayName eq "tour guides""#).unwrap();
    assert!(predicate.matches(&group));
}
