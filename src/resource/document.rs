//! SCIM resource documents.
//!
//! A [`Document`] is a self-contained resource instance: base attribute
//! values, one attribute bag per extension schema URI, and read-only
//! metadata. It holds no reference into the schema registry and converts to
//! and from SCIM JSON on its own.
//!
//! Documents are immutable values. The `with_*` methods consume a document
//! and return the updated one.

use super::meta::Meta;
use super::value::{Attributes, Value, parse_datetime};
use super::version::Version;
use crate::error::{ValidationError, ValidationResult};
use crate::schema::{AttributeDefinition, AttributeType, ResolvedPath, ResourceSchema};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A SCIM resource instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) resource_type: String,
    pub(crate) id: Option<String>,
    pub(crate) schemas: Vec<String>,
    pub(crate) attributes: Attributes,
    pub(crate) extensions: BTreeMap<String, Attributes>,
    pub(crate) meta: Option<Meta>,
}

impl Document {
    /// An empty document of the given resource type.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: None,
            schemas: Vec::new(),
            attributes: Attributes::new(),
            extensions: BTreeMap::new(),
            meta: None,
        }
    }

    /// Convert SCIM JSON into a document without consulting any schema.
    ///
    /// `schemas`, `id` and `meta` are lifted into their own fields, and
    /// top-level keys that are schema URNs become extension attribute bags.
    /// Everything else is kept as a base attribute.
    pub fn from_value(resource_type: impl Into<String>, json: &JsonValue) -> ValidationResult<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| ValidationError::custom("Resource must be a JSON object"))?;

        let mut document = Self::new(resource_type);
        for (name, value) in obj {
            if name.eq_ignore_ascii_case("schemas") {
                document.schemas = extract_schemas(value)?;
            } else if name.eq_ignore_ascii_case("id") {
                document.id = match value {
                    JsonValue::Null => None,
                    JsonValue::String(id) => Some(id.clone()),
                    other => {
                        return Err(ValidationError::invalid_type(
                            "id",
                            "string",
                            Value::from_json(other).kind(),
                        ));
                    }
                };
            } else if name.eq_ignore_ascii_case("meta") {
                if !value.is_null() {
                    document.meta = Some(Meta::from_json(value)?);
                }
            } else if is_schema_urn(name) {
                match value {
                    JsonValue::Null => {}
                    JsonValue::Object(map) => {
                        document
                            .extensions
                            .insert(name.clone(), Attributes::from_json(map));
                    }
                    other => {
                        return Err(ValidationError::invalid_type(
                            name.as_str(),
                            "object",
                            Value::from_json(other).kind(),
                        ));
                    }
                }
            } else {
                document
                    .attributes
                    .insert(name.clone(), Value::from_json(value));
            }
        }
        Ok(document)
    }

    /// Convert SCIM JSON into a document shaped by `schema`.
    ///
    /// Checks every attribute against its definition: known name, data type,
    /// single versus multi-valued, canonical values, and at most one primary
    /// element per multi-valued complex attribute. Attribute names and
    /// extension URIs are normalized to their declared spelling, null values
    /// are dropped as unassigned, and `schemas` is completed with the base URI
    /// and every extension present.
    ///
    /// Required attributes are a write-path concern and are not checked here.
    ///
    /// # Example
    /// ```rust
    /// use scim_core::resource::{Document, Value};
    /// use scim_core::schema::SchemaRegistry;
    /// use serde_json::json;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let registry = SchemaRegistry::new()?;
    /// let user = registry.get_user_schema().expect("embedded User type");
    /// let document = Document::parse(user, &json!({
    ///     "username": "bjensen",
    ///     "emails": [{ "value": "bjensen@example.com", "primary": true }]
    /// }))?;
    /// assert_eq!(document.attribute("userName"), Some(&Value::from("bjensen")));
    /// assert_eq!(document.schemas(), ["urn:ietf:params:scim:schemas:core:2.0:User"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse(schema: &ResourceSchema, json: &JsonValue) -> ValidationResult<Self> {
        Self::from_value(schema.name(), json)?.conform(schema)
    }

    fn conform(self, schema: &ResourceSchema) -> ValidationResult<Self> {
        let mut schemas = vec![schema.id().to_string()];
        for uri in &self.schemas {
            if schema.is_base_uri(uri) {
                continue;
            }
            let extension = schema
                .extension(uri)
                .ok_or_else(|| ValidationError::UnknownSchemaUri { uri: uri.clone() })?;
            push_unique(&mut schemas, &extension.schema.id);
        }

        let mut extensions = BTreeMap::new();
        for (uri, attributes) in self.extensions {
            let extension = schema
                .extension(&uri)
                .ok_or(ValidationError::UnknownSchemaUri { uri })?;
            let ext = &extension.schema;
            let attributes = conform_attributes(&ext.id, &ext.attributes, attributes)?;
            push_unique(&mut schemas, &ext.id);
            if !attributes.is_empty() {
                extensions.insert(ext.id.clone(), attributes);
            }
        }

        let base = schema.base();
        let attributes = conform_attributes(&base.id, &base.attributes, self.attributes)?;

        Ok(Self {
            resource_type: schema.name().to_string(),
            id: self.id,
            schemas,
            attributes,
            extensions,
            meta: self.meta,
        })
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn schemas(&self) -> &[String] {
        &self.schemas
    }

    /// Base schema attributes (excluding `schemas`, `id` and `meta`).
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// A base attribute by name (case-insensitive).
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// The attribute bag of an extension (URI matched case-insensitively).
    pub fn extension(&self, uri: &str) -> Option<&Attributes> {
        self.extensions
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(uri))
            .map(|(_, attributes)| attributes)
    }

    pub fn extensions(&self) -> impl Iterator<Item = (&str, &Attributes)> {
        self.extensions
            .iter()
            .map(|(uri, attributes)| (uri.as_str(), attributes))
    }

    pub fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    /// The version recorded in `meta.version`, if it parses.
    pub fn version(&self) -> Option<Version> {
        self.meta.as_ref()?.version()?.parse().ok()
    }

    /// The value addressed by a resolved path.
    ///
    /// `schemas`, `id` and `meta` are synthesized from their fields. For a
    /// sub-attribute of a multi-valued attribute the result is the list of
    /// that sub-attribute's values across all elements.
    pub fn get(&self, path: &ResolvedPath) -> Option<Cow<'_, Value>> {
        let value = self.top_level(path.extension.as_deref(), &path.attribute.name)?;
        match &path.sub_attribute {
            None => Some(value),
            Some(sub) => match value {
                Cow::Borrowed(value) => sub_value(value, &sub.name),
                Cow::Owned(value) => sub_value(&value, &sub.name).map(|v| Cow::Owned(v.into_owned())),
            },
        }
    }

    fn top_level(&self, extension: Option<&str>, name: &str) -> Option<Cow<'_, Value>> {
        if let Some(uri) = extension {
            return self.extension(uri)?.get(name).map(Cow::Borrowed);
        }
        if name.eq_ignore_ascii_case("id") {
            return self.id.as_deref().map(|id| Cow::Owned(Value::from(id)));
        }
        if name.eq_ignore_ascii_case("schemas") {
            let uris = self.schemas.iter().map(|uri| Value::from(uri.as_str()));
            return Some(Cow::Owned(Value::List(uris.collect())));
        }
        if name.eq_ignore_ascii_case("meta") {
            return self
                .meta
                .as_ref()
                .map(|meta| Cow::Owned(Value::Complex(meta.to_attributes())));
        }
        self.attributes.get(name).map(Cow::Borrowed)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_schemas(mut self, schemas: Vec<String>) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name, value.into());
        self
    }

    pub fn with_extension_attribute(
        mut self,
        uri: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let uri = uri.into();
        let key = self
            .extensions
            .keys()
            .find(|key| key.eq_ignore_ascii_case(&uri))
            .cloned()
            .unwrap_or(uri);
        self.extensions
            .entry(key)
            .or_default()
            .insert(name, value.into());
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// SCIM JSON form of the document.
    pub fn to_json(&self) -> JsonValue {
        self.json_object(true)
    }

    /// SCIM JSON without `meta`, the input to content versioning.
    pub(crate) fn content_json(&self) -> JsonValue {
        self.json_object(false)
    }

    fn json_object(&self, include_meta: bool) -> JsonValue {
        let mut obj = Map::new();
        obj.insert(
            "schemas".to_string(),
            JsonValue::Array(self.schemas.iter().cloned().map(JsonValue::String).collect()),
        );
        if let Some(id) = &self.id {
            obj.insert("id".to_string(), JsonValue::String(id.clone()));
        }
        for (name, value) in self.attributes.iter() {
            obj.insert(name.to_string(), value.to_json());
        }
        for (uri, attributes) in &self.extensions {
            obj.insert(uri.clone(), attributes.to_json());
        }
        if include_meta {
            if let Some(meta) = &self.meta {
                obj.insert("meta".to_string(), meta.to_json());
            }
        }
        JsonValue::Object(obj)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn is_schema_urn(name: &str) -> bool {
    name.get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("urn:"))
}

fn push_unique(schemas: &mut Vec<String>, uri: &str) {
    if !schemas.iter().any(|existing| existing.eq_ignore_ascii_case(uri)) {
        schemas.push(uri.to_string());
    }
}

fn extract_schemas(value: &JsonValue) -> ValidationResult<Vec<String>> {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ValidationError::invalid_type(
                        "schemas",
                        "array of strings",
                        Value::from_json(item).kind(),
                    )
                })
            })
            .collect(),
        JsonValue::Null => Ok(Vec::new()),
        _ => Err(ValidationError::ExpectedMultiValue {
            attribute: "schemas".to_string(),
        }),
    }
}

fn sub_value<'a>(value: &'a Value, name: &str) -> Option<Cow<'a, Value>> {
    match value {
        Value::Complex(attributes) => attributes.get(name).map(Cow::Borrowed),
        Value::List(items) => {
            let values: Vec<Value> = items
                .iter()
                .filter_map(|item| item.as_complex()?.get(name))
                .cloned()
                .collect();
            (!values.is_empty()).then_some(Cow::Owned(Value::List(values)))
        }
        _ => None,
    }
}

fn conform_attributes(
    schema_id: &str,
    definitions: &[AttributeDefinition],
    attributes: Attributes,
) -> ValidationResult<Attributes> {
    let mut conformed = Attributes::new();
    for (name, value) in attributes {
        let definition = definitions
            .iter()
            .find(|def| def.name.eq_ignore_ascii_case(&name))
            .ok_or_else(|| ValidationError::UnknownAttribute {
                attribute: name.clone(),
                schema_id: schema_id.to_string(),
            })?;
        if value.is_null() {
            continue;
        }
        let value = conform_value(schema_id, definition, value, &definition.name)?;
        conformed.insert(definition.name.clone(), value);
    }
    Ok(conformed)
}

fn conform_value(
    schema_id: &str,
    definition: &AttributeDefinition,
    value: Value,
    path: &str,
) -> ValidationResult<Value> {
    if !definition.multi_valued {
        if matches!(value, Value::List(_)) {
            return Err(ValidationError::ExpectedSingleValue {
                attribute: path.to_string(),
            });
        }
        return conform_single(schema_id, definition, value, path);
    }

    let Value::List(items) = value else {
        return Err(ValidationError::ExpectedMultiValue {
            attribute: path.to_string(),
        });
    };
    let items = items
        .into_iter()
        .filter(|item| !item.is_null())
        .map(|item| conform_single(schema_id, definition, item, path))
        .collect::<ValidationResult<Vec<_>>>()?;

    if definition.primary_sub_attribute().is_some() && count_primary(&items) > 1 {
        return Err(ValidationError::MultiplePrimaryValues {
            attribute: path.to_string(),
        });
    }
    Ok(Value::List(items))
}

fn conform_single(
    schema_id: &str,
    definition: &AttributeDefinition,
    value: Value,
    path: &str,
) -> ValidationResult<Value> {
    match (definition.data_type, value) {
        (AttributeType::String | AttributeType::Reference, Value::String(s)) => {
            check_canonical(definition, &s, path)?;
            Ok(Value::String(s))
        }
        (AttributeType::Binary, Value::String(s)) => match BASE64.decode(&s) {
            Ok(_) => Ok(Value::String(s)),
            Err(_) => Err(ValidationError::invalid_type(path, "binary", "non-base64 string")),
        },
        (AttributeType::DateTime, Value::String(s)) => match parse_datetime(&s) {
            Some(_) => Ok(Value::String(s)),
            None => Err(ValidationError::InvalidDateTimeFormat {
                attribute: path.to_string(),
                value: s,
            }),
        },
        (AttributeType::Boolean, value @ Value::Boolean(_)) => Ok(value),
        (AttributeType::Integer, value @ Value::Integer(_)) => Ok(value),
        (AttributeType::Decimal, Value::Integer(i)) => Ok(Value::Decimal(i as f64)),
        (AttributeType::Decimal, value @ Value::Decimal(_)) => Ok(value),
        (AttributeType::Complex, Value::Complex(attributes)) => {
            let mut conformed = Attributes::new();
            for (name, value) in attributes {
                let sub = definition.sub_attribute(&name).ok_or_else(|| {
                    ValidationError::UnknownAttribute {
                        attribute: format!("{}.{}", path, name),
                        schema_id: schema_id.to_string(),
                    }
                })?;
                if value.is_null() {
                    continue;
                }
                let sub_path = format!("{}.{}", path, sub.name);
                let value = conform_value(schema_id, sub, value, &sub_path)?;
                conformed.insert(sub.name.clone(), value);
            }
            Ok(Value::Complex(conformed))
        }
        (expected, value) => Err(ValidationError::invalid_type(
            path,
            expected.to_string(),
            value.kind(),
        )),
    }
}

fn check_canonical(definition: &AttributeDefinition, value: &str, path: &str) -> ValidationResult<()> {
    if definition.canonical_values.is_empty() {
        return Ok(());
    }
    let allowed = definition.canonical_values.iter().any(|canonical| {
        if definition.case_exact {
            canonical == value
        } else {
            canonical.eq_ignore_ascii_case(value)
        }
    });
    if allowed {
        Ok(())
    } else {
        Err(ValidationError::InvalidCanonicalValue {
            attribute: path.to_string(),
            value: value.to_string(),
            allowed: definition.canonical_values.clone(),
        })
    }
}

/// Number of elements whose `primary` sub-attribute is `true`.
pub(crate) fn count_primary(items: &[Value]) -> usize {
    items
        .iter()
        .filter(|item| {
            item.as_complex()
                .and_then(|attributes| attributes.get("primary"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;
    use crate::schema::embedded::{ENTERPRISE_USER_SCHEMA_URI, USER_SCHEMA_URI};
    use serde_json::json;

    fn user() -> ResourceSchema {
        SchemaRegistry::new()
            .expect("Failed to create registry")
            .get_user_schema()
            .expect("User resource type")
            .clone()
    }

    fn resolved(schema: &ResourceSchema, path: &str) -> ResolvedPath {
        crate::schema::resolve(schema, &path.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_from_value_splits_fields() {
        let document = Document::from_value(
            "User",
            &json!({
                "schemas": [USER_SCHEMA_URI, ENTERPRISE_USER_SCHEMA_URI],
                "id": "2819c223",
                "userName": "bjensen",
                ENTERPRISE_USER_SCHEMA_URI: { "employeeNumber": "701984" },
                "meta": {
                    "resourceType": "User",
                    "created": "2010-01-23T04:56:22Z",
                    "lastModified": "2011-05-13T04:42:34Z"
                }
            }),
        )
        .unwrap();

        assert_eq!(document.id(), Some("2819c223"));
        assert_eq!(document.schemas().len(), 2);
        assert_eq!(document.attributes().len(), 1);
        assert_eq!(
            document
                .extension(ENTERPRISE_USER_SCHEMA_URI)
                .unwrap()
                .get("employeeNumber"),
            Some(&Value::from("701984"))
        );
        assert_eq!(document.meta().unwrap().resource_type(), "User");
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(Document::from_value("User", &json!([1, 2])).is_err());
        assert!(Document::from_value("User", &json!({ "id": 7 })).is_err());
        assert!(Document::from_value("User", &json!({ "schemas": "urn:x" })).is_err());
    }

    #[test]
    fn test_parse_normalizes_names_and_schemas() {
        let document = Document::parse(
            &user(),
            &json!({
                "USERNAME": "bjensen",
                "name": { "FamilyName": "Jensen" },
                "urn:ietf:params:scim:schemas:extension:enterprise:2.0:user": {
                    "costcenter": "4130"
                },
                "nickName": null
            }),
        )
        .unwrap();

        assert!(document.attributes().entry("userName").is_some());
        assert_eq!(document.attributes().entry("userName").unwrap().0, "userName");
        assert!(document.attribute("nickName").is_none());
        assert_eq!(document.schemas(), [USER_SCHEMA_URI, ENTERPRISE_USER_SCHEMA_URI]);
        let extension = document.extension(ENTERPRISE_USER_SCHEMA_URI).unwrap();
        assert_eq!(extension.entry("costCenter").unwrap().0, "costCenter");
    }

    #[test]
    fn test_parse_type_errors() {
        let schema = user();
        let cases = [
            json!({ "userName": 42 }),
            json!({ "active": "yes" }),
            json!({ "emails": { "value": "a@example.com" } }),
            json!({ "userName": ["a", "b"] }),
            json!({ "shoeSize": 10 }),
            json!({ "name": { "middle": "x" } }),
            json!({ "emails": [{ "value": "a@example.com", "type": "carrier-pigeon" }] }),
            json!({ "x509Certificates": [{ "value": "not base64!" }] }),
            json!({ "schemas": ["urn:example:unknown"] }),
            json!({ "urn:example:unknown": { "a": 1 } }),
        ];
        for case in cases {
            assert!(Document::parse(&schema, &case).is_err(), "{} should be rejected", case);
        }
    }

    #[test]
    fn test_parse_multiple_primary_values() {
        let result = Document::parse(
            &user(),
            &json!({
                "userName": "bjensen",
                "emails": [
                    { "value": "a@example.com", "primary": true },
                    { "value": "b@example.com", "primary": true }
                ]
            }),
        );
        assert!(matches!(
            result,
            Err(ValidationError::MultiplePrimaryValues { attribute }) if attribute == "emails"
        ));
    }

    #[test]
    fn test_get_resolved_values() {
        let schema = user();
        let document = Document::parse(
            &schema,
            &json!({
                "id": "2819c223",
                "userName": "bjensen",
                "emails": [
                    { "value": "a@example.com", "type": "work" },
                    { "value": "b@example.com" }
                ],
                "meta": {
                    "resourceType": "User",
                    "created": "2010-01-23T04:56:22Z",
                    "lastModified": "2011-05-13T04:42:34Z"
                }
            }),
        )
        .unwrap();

        let id = document.get(&resolved(&schema, "id")).unwrap();
        assert_eq!(id.as_str(), Some("2819c223"));

        let values = document.get(&resolved(&schema, "emails.value")).unwrap();
        assert_eq!(values.elements().len(), 2);

        let types = document.get(&resolved(&schema, "emails.type")).unwrap();
        assert_eq!(types.elements(), [Value::from("work")]);

        let modified = document.get(&resolved(&schema, "meta.lastModified")).unwrap();
        assert_eq!(modified.as_str(), Some("2011-05-13T04:42:34Z"));

        let schemas = document.get(&resolved(&schema, "schemas")).unwrap();
        assert_eq!(schemas.elements(), [Value::from(USER_SCHEMA_URI)]);

        assert!(document.get(&resolved(&schema, "title")).is_none());
        assert!(document.get(&resolved(&schema, "employeeNumber")).is_none());
    }

    #[test]
    fn test_to_json_round_trip() {
        let json = json!({
            "schemas": [USER_SCHEMA_URI],
            "id": "2819c223",
            "userName": "bjensen",
            "emails": [{ "value": "a@example.com", "primary": true }]
        });
        let document = Document::parse(&user(), &json).unwrap();
        assert_eq!(document.to_json(), json);
        assert_eq!(serde_json::to_value(&document).unwrap(), json);
    }

    #[test]
    fn test_builders_return_new_documents() {
        let original = Document::new("User").with_attribute("userName", "bjensen");
        let updated = original
            .clone()
            .with_attribute("USERNAME", "babs")
            .with_extension_attribute(ENTERPRISE_USER_SCHEMA_URI, "department", "Tour");

        assert_eq!(original.attribute("userName"), Some(&Value::from("bjensen")));
        assert_eq!(updated.attribute("userName"), Some(&Value::from("babs")));
        assert_eq!(updated.attributes().len(), 1);
        assert!(updated.extension(ENTERPRISE_USER_SCHEMA_URI).is_some());
    }
}
