//! Write-path rules applied to client payloads.

use crate::common::{self, fixtures};
use scim_core::error::{ScimError, WriteError};
use scim_core::projection::{WriteOperation, validate_write};
use scim_core::resource::Document;
use scim_core::schema::embedded::ENTERPRISE_USER_SCHEMA_URI;
use serde_json::json;

#[test]
fn test_create_strips_server_managed_values() {
    common::init_logging();
    let schema = common::user_schema();
    let incoming = common::user(&fixtures::bjensen());

    let written = validate_write(&schema, None, &incoming, WriteOperation::Create).unwrap();
    let json = written.to_json();

    assert!(json.get("id").is_none());
    assert!(json.get("meta").is_none());
    assert!(json.get("groups").is_none());
    // Read-only sub-attribute inside an extension.
    assert!(json[ENTERPRISE_USER_SCHEMA_URI]["manager"].get("displayName").is_none());
    // Write-only values are accepted for storage.
    assert_eq!(json["password"], "t1meMa$heen");
}

#[test]
fn test_two_primary_emails_conflict() {
    let schema = common::user_schema();
    // Parsing already rejects the shape; hand-built documents reach the write rules.
    let payload = json!({
        "userName": "bjensen",
        "emails": [
            { "value": "a@example.com", "primary": true },
            { "value": "b@example.com", "primary": true }
        ]
    });
    assert!(Document::parse(&schema, &payload).is_err());

    let incoming = Document::from_value("User", &payload).unwrap();
    let error = validate_write(&schema, None, &incoming, WriteOperation::Create).unwrap_err();
    assert_eq!(error, WriteError::uniqueness("emails"));
    assert!(ScimError::from(error).to_string().contains("emails"));
}

#[test]
fn test_replace_requires_required_attributes() {
    let schema = common::user_schema();
    let existing = common::user(&fixtures::bjensen());
    let incoming = common::user(&json!({ "displayName": "Babs" }));

    assert_eq!(
        validate_write(&schema, Some(&existing), &incoming, WriteOperation::Replace),
        Err(WriteError::required("userName"))
    );
}

#[test]
fn test_replace_keeps_read_only_state() {
    let schema = common::user_schema();
    let existing = common::user(&fixtures::bjensen());
    let incoming = common::user(&json!({
        "userName": "bjensen@example.com",
        "groups": [{ "value": "forged", "display": "Admins" }]
    }));

    let written =
        validate_write(&schema, Some(&existing), &incoming, WriteOperation::Replace).unwrap();
    assert_eq!(written.id(), existing.id());
    assert_eq!(written.meta(), existing.meta());
    assert_eq!(written.attribute("groups"), existing.attribute("groups"));
    assert!(written.attribute("title").is_none());
}

#[test]
fn test_group_member_required_value() {
    let schema = common::group_schema();
    let incoming = Document::parse(
        &schema,
        &json!({ "displayName": "Tour Guides", "members": [{ "type": "User" }] }),
    )
    .unwrap();

    assert_eq!(
        validate_write(&schema, None, &incoming, WriteOperation::Create),
        Err(WriteError::required("members.value"))
    );
}

#[test]
fn test_unchecked_documents_cannot_smuggle_attributes() {
    let schema = common::user_schema();
    let payload = json!({ "userName": "x", "bogus": 1 });
    assert!(Document::parse(&schema, &payload).is_err());

    let incoming = Document::from_value("User", &payload).unwrap();
    assert_eq!(
        validate_write(&schema, None, &incoming, WriteOperation::Create),
        Err(WriteError::unknown_attribute(
            "bogus",
            "urn:ietf:params:scim:schemas:core:2.0:User"
        ))
    );
}
