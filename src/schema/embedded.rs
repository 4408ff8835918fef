//! Embedded core SCIM schemas and resource types.
//!
//! The core User and Group schemas, the enterprise User extension, and the
//! resource types composing them, embedded as static JSON so a registry can be
//! bootstrapped without any schema files on disk. The common attributes
//! `schemas`, `id`, `externalId` and `meta` are not declared here; the
//! registry supplies them for every resource type.

pub const USER_SCHEMA_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const GROUP_SCHEMA_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
pub const ENTERPRISE_USER_SCHEMA_URI: &str =
    "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";

/// Returns the core User schema as a JSON string.
pub fn core_user_schema() -> &'static str {
    r#"{
  "id": "urn:ietf:params:scim:schemas:core:2.0:User",
  "name": "User",
  "description": "User Account",
  "attributes": [
    {
      "name": "userName",
      "type": "string",
      "multiValued": false,
      "required": true,
      "caseExact": false,
      "mutability": "readWrite",
      "returned": "default",
      "uniqueness": "server"
    },
    {
      "name": "name",
      "type": "complex",
      "multiValued": false,
      "required": false,
      "mutability": "readWrite",
      "returned": "default",
      "uniqueness": "none",
      "subAttributes": [
        { "name": "formatted", "type": "string" },
        { "name": "familyName", "type": "string" },
        { "name": "givenName", "type": "string" },
        { "name": "middleName", "type": "string" },
        { "name": "honorificPrefix", "type": "string" },
        { "name": "honorificSuffix", "type": "string" }
      ]
    },
    { "name": "displayName", "type": "string" },
    { "name": "nickName", "type": "string" },
    {
      "name": "profileUrl",
      "type": "reference",
      "referenceTypes": ["external"]
    },
    { "name": "title", "type": "string" },
    { "name": "userType", "type": "string" },
    { "name": "preferredLanguage", "type": "string" },
    { "name": "locale", "type": "string" },
    { "name": "timezone", "type": "string" },
    { "name": "active", "type": "boolean" },
    {
      "name": "password",
      "type": "string",
      "caseExact": true,
      "mutability": "writeOnly",
      "returned": "never"
    },
    {
      "name": "emails",
      "type": "complex",
      "multiValued": true,
      "subAttributes": [
        { "name": "value", "type": "string", "required": true },
        { "name": "display", "type": "string" },
        {
          "name": "type",
          "type": "string",
          "canonicalValues": ["work", "home", "other"]
        },
        { "name": "primary", "type": "boolean" }
      ]
    },
    {
      "name": "phoneNumbers",
      "type": "complex",
      "multiValued": true,
      "subAttributes": [
        { "name": "value", "type": "string", "required": true },
        { "name": "display", "type": "string" },
        {
          "name": "type",
          "type": "string",
          "canonicalValues": ["work", "home", "mobile", "fax", "pager", "other"]
        },
        { "name": "primary", "type": "boolean" }
      ]
    },
    {
      "name": "ims",
      "type": "complex",
      "multiValued": true,
      "subAttributes": [
        { "name": "value", "type": "string" },
        { "name": "display", "type": "string" },
        {
          "name": "type",
          "type": "string",
          "canonicalValues": ["aim", "gtalk", "icq", "xmpp", "msn", "skype", "qq", "yahoo"]
        },
        { "name": "primary", "type": "boolean" }
      ]
    },
    {
      "name": "photos",
      "type": "complex",
      "multiValued": true,
      "subAttributes": [
        { "name": "value", "type": "reference", "referenceTypes": ["external"] },
        { "name": "display", "type": "string" },
        {
          "name": "type",
          "type": "string",
          "canonicalValues": ["photo", "thumbnail"]
        },
        { "name": "primary", "type": "boolean" }
      ]
    },
    {
      "name": "addresses",
      "type": "complex",
      "multiValued": true,
      "subAttributes": [
        { "name": "formatted", "type": "string" },
        { "name": "streetAddress", "type": "string" },
        { "name": "locality", "type": "string" },
        { "name": "region", "type": "string" },
        { "name": "postalCode", "type": "string" },
        { "name": "country", "type": "string" },
        {
          "name": "type",
          "type": "string",
          "canonicalValues": ["work", "home", "other"]
        },
        { "name": "primary", "type": "boolean" }
      ]
    },
    {
      "name": "groups",
      "type": "complex",
      "multiValued": true,
      "mutability": "readOnly",
      "subAttributes": [
        { "name": "value", "type": "string", "mutability": "readOnly" },
        {
          "name": "$ref",
          "type": "reference",
          "referenceTypes": ["User", "Group"],
          "mutability": "readOnly"
        },
        { "name": "display", "type": "string", "mutability": "readOnly" },
        {
          "name": "type",
          "type": "string",
          "canonicalValues": ["direct", "indirect"],
          "mutability": "readOnly"
        }
      ]
    },
    {
      "name": "roles",
      "type": "complex",
      "multiValued": true,
      "subAttributes": [
        { "name": "value", "type": "string" },
        { "name": "display", "type": "string" },
        { "name": "type", "type": "string" },
        { "name": "primary", "type": "boolean" }
      ]
    },
    {
      "name": "x509Certificates",
      "type": "complex",
      "multiValued": true,
      "subAttributes": [
        { "name": "value", "type": "binary", "caseExact": true },
        { "name": "display", "type": "string" },
        { "name": "type", "type": "string" },
        { "name": "primary", "type": "boolean" }
      ]
    }
  ]
}"#
}

/// Returns the core Group schema as a JSON string.
pub fn core_group_schema() -> &'static str {
    r#"{
  "id": "urn:ietf:params:scim:schemas:core:2.0:Group",
  "name": "Group",
  "description": "Group",
  "attributes": [
    {
      "name": "displayName",
      "type": "string",
      "required": true,
      "uniqueness": "none"
    },
    {
      "name": "members",
      "type": "complex",
      "multiValued": true,
      "subAttributes": [
        {
          "name": "value",
          "type": "string",
          "required": true,
          "mutability": "immutable"
        },
        {
          "name": "$ref",
          "type": "reference",
          "referenceTypes": ["User", "Group"],
          "mutability": "immutable"
        },
        { "name": "display", "type": "string", "mutability": "readOnly" },
        {
          "name": "type",
          "type": "string",
          "canonicalValues": ["User", "Group"],
          "mutability": "immutable"
        }
      ]
    }
  ]
}"#
}

/// Returns the enterprise User extension schema as a JSON string.
pub fn enterprise_user_schema() -> &'static str {
    r#"{
  "id": "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User",
  "name": "EnterpriseUser",
  "description": "Enterprise User",
  "attributes": [
    { "name": "employeeNumber", "type": "string" },
    { "name": "costCenter", "type": "string" },
    { "name": "organization", "type": "string" },
    { "name": "division", "type": "string" },
    { "name": "department", "type": "string" },
    {
      "name": "manager",
      "type": "complex",
      "subAttributes": [
        { "name": "value", "type": "string" },
        {
          "name": "$ref",
          "type": "reference",
          "referenceTypes": ["User"]
        },
        { "name": "displayName", "type": "string", "mutability": "readOnly" }
      ]
    }
  ]
}"#
}

/// Returns the core resource type definitions as a JSON array string.
pub fn core_resource_types() -> &'static str {
    r#"[
  {
    "name": "User",
    "endpoint": "/Users",
    "description": "User Account",
    "schema": "urn:ietf:params:scim:schemas:core:2.0:User",
    "schemaExtensions": [
      {
        "schema": "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User",
        "required": false
      }
    ]
  },
  {
    "name": "Group",
    "endpoint": "/Groups",
    "description": "Group",
    "schema": "urn:ietf:params:scim:schemas:core:2.0:Group"
  }
]"#
}
