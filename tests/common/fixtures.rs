//! Shared resource fixtures.

use scim_core::schema::embedded::{ENTERPRISE_USER_SCHEMA_URI, USER_SCHEMA_URI};
use serde_json::{Value, json};

/// RFC 7643 Section 8.2 full user, trimmed to the attributes the embedded
/// schema declares.
pub fn bjensen() -> Value {
    json!({
        "schemas": [USER_SCHEMA_URI, ENTERPRISE_USER_SCHEMA_URI],
        "id": "2819c223-7f76-453a-919d-413861904646",
        "externalId": "701984",
        "userName": "bjensen@example.com",
        "name": {
            "formatted": "Ms. Barbara J Jensen, III",
            "familyName": "Jensen",
            "givenName": "Barbara",
            "middleName": "Jane",
            "honorificPrefix": "Ms.",
            "honorificSuffix": "III"
        },
        "displayName": "Babs Jensen",
        "nickName": "Babs",
        "profileUrl": "https://login.example.com/bjensen",
        "emails": [
            { "value": "bjensen@example.com", "type": "work", "primary": true },
            { "value": "babs@jensen.org", "type": "home" }
        ],
        "addresses": [
            {
                "type": "work",
                "streetAddress": "100 Universal City Plaza",
                "locality": "Hollywood",
                "region": "CA",
                "postalCode": "91608",
                "country": "USA",
                "primary": true
            }
        ],
        "phoneNumbers": [
            { "value": "555-555-5555", "type": "work" },
            { "value": "555-555-4444", "type": "mobile" }
        ],
        "userType": "Employee",
        "title": "Tour Guide",
        "preferredLanguage": "en-US",
        "locale": "en-US",
        "timezone": "America/Los_Angeles",
        "active": true,
        "password": "t1meMa$heen",
        "groups": [
            { "value": "e9e30dba-f08f-4109-8486-d5c6a331660a", "display": "Tour Guides" }
        ],
        "x509Certificates": [{ "value": "TUlJRE9qQ0NBcU9nQXdJQkFnSUpBSnBUZ1U=" }],
        ENTERPRISE_USER_SCHEMA_URI: {
            "employeeNumber": "701984",
            "costCenter": "4130",
            "organization": "Universal Studios",
            "division": "Theme Park",
            "department": "Tour Operations",
            "manager": {
                "value": "26118915-6090-4610-87e4-49d8ca9f808d",
                "displayName": "John Smith"
            }
        },
        "meta": {
            "resourceType": "User",
            "created": "2010-01-23T04:56:22Z",
            "lastModified": "2011-05-13T04:42:34Z",
            "version": "W/\"3694e05e9dff591\"",
            "location": "https://example.com/v2/Users/2819c223-7f76-453a-919d-413861904646"
        }
    })
}

/// A small population of users for search tests.
pub fn users() -> Vec<Value> {
    vec![
        bjensen(),
        json!({
            "id": "c8596b90-7539-4f20-968d-1a36a1b2b4a7",
            "userName": "jsmith",
            "name": { "familyName": "Smith", "givenName": "John" },
            "title": "Manager",
            "userType": "Employee",
            "active": true,
            "emails": [{ "value": "jsmith@example.com", "type": "work", "primary": true }],
            "meta": {
                "resourceType": "User",
                "created": "2009-06-01T10:00:00Z",
                "lastModified": "2012-01-01T00:00:00Z"
            }
        }),
        json!({
            "id": "4a3f1a52-0a1d-4c7f-ae2b-4b1f3b5e2e11",
            "userName": "intern42",
            "userType": "Intern",
            "active": false,
            "emails": [{ "value": "intern42@example.org", "type": "other" }],
            "meta": {
                "resourceType": "User",
                "created": "2013-03-15T08:30:00Z",
                "lastModified": "2013-03-15T08:30:00Z"
            }
        }),
    ]
}
