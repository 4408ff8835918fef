//! Common test utilities.

use scim_core::resource::Document;
use scim_core::schema::{ResourceSchema, SchemaRegistry};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

pub mod fixtures;

/// Route library logging to the test output. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A registry with the embedded core schemas, shared across tests.
pub fn registry() -> Arc<SchemaRegistry> {
    static REGISTRY: OnceLock<Arc<SchemaRegistry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Arc::new(SchemaRegistry::new().expect("Failed to create registry")))
        .clone()
}

pub fn user_schema() -> ResourceSchema {
    registry()
        .get_user_schema()
        .expect("User resource type")
        .clone()
}

pub fn group_schema() -> ResourceSchema {
    registry()
        .get_group_schema()
        .expect("Group resource type")
        .clone()
}

/// Parse a user document, panicking on invalid input.
pub fn user(json: &Value) -> Document {
    Document::parse(&user_schema(), json).unwrap_or_else(|e| panic!("invalid user {}: {}", json, e))
}
