//! Response projection of stored users.

use crate::common::{self, fixtures};
use scim_core::error::ProjectionError;
use scim_core::projection::{AttributeSelection, project, project_selection};
use scim_core::schema::embedded::ENTERPRISE_USER_SCHEMA_URI;
use serde_json::json;

fn project_request(requested: &[&str], excluded: &[&str]) -> serde_json::Value {
    let schema = common::user_schema();
    let document = common::user(&fixtures::bjensen());
    let selection = AttributeSelection::from_request(requested, excluded).expect("valid selection");
    project_selection(&schema, &document, &selection)
        .expect("projection succeeds")
        .to_json()
}

#[test]
fn test_default_response_hides_password() {
    let json = project_request(&[], &[]);
    assert!(json.get("password").is_none());
    assert_eq!(json["userName"], "bjensen@example.com");
    assert_eq!(json["groups"][0]["display"], "Tour Guides");
    assert_eq!(json["meta"]["resourceType"], "User");
    assert_eq!(json[ENTERPRISE_USER_SCHEMA_URI]["employeeNumber"], "701984");
}

#[test]
fn test_attributes_parameter() {
    let json = project_request(&["userName,emails.value"], &[]);
    assert_eq!(
        json,
        json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "id": "2819c223-7f76-453a-919d-413861904646",
            "userName": "bjensen@example.com",
            "emails": [
                { "value": "bjensen@example.com" },
                { "value": "babs@jensen.org" }
            ]
        })
    );
}

#[test]
fn test_requesting_password_does_not_reveal_it() {
    let json = project_request(&["password"], &[]);
    assert!(json.get("password").is_none());
    assert_eq!(json["id"], "2819c223-7f76-453a-919d-413861904646");
}

#[test]
fn test_excluded_attributes_parameter() {
    let json = project_request(&[], &["id", "emails", "name.middleName", "meta"]);
    assert_eq!(json["id"], "2819c223-7f76-453a-919d-413861904646");
    assert!(json.get("emails").is_none());
    assert!(json.get("meta").is_none());
    assert_eq!(json["name"]["givenName"], "Barbara");
    assert!(json["name"].get("middleName").is_none());
}

#[test]
fn test_extension_attribute_selection() {
    let json = project_request(
        &["urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:manager.value"],
        &[],
    );
    assert_eq!(
        json[ENTERPRISE_USER_SCHEMA_URI],
        json!({ "manager": { "value": "26118915-6090-4610-87e4-49d8ca9f808d" } })
    );
    assert_eq!(json["schemas"].as_array().unwrap().len(), 2);
    assert!(json.get("userName").is_none());
}

#[test]
fn test_selection_errors() {
    assert!(matches!(
        AttributeSelection::from_request(&["userName"], &["title"]),
        Err(ProjectionError::ConflictingSelection)
    ));

    let schema = common::user_schema();
    let document = common::user(&fixtures::bjensen());
    let result = project(&schema, &document, &["shoeSize".parse().unwrap()], &[]);
    assert!(matches!(result, Err(ProjectionError::Resolve(_))));
}
