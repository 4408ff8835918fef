//! Error types for SCIM core operations.
//!
//! Every failure the core can produce is a typed, deterministic value: filter
//! syntax problems carry the offending source position, schema resolution
//! problems carry the attribute path, and write validation problems carry the
//! attribute that violated its mutability, requiredness or uniqueness rule.

use std::fmt;

/// Character offset into a filter or attribute path source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(pub usize);

impl Position {
    /// The character offset.
    pub fn offset(self) -> usize {
        self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}", self.0)
    }
}

/// Main error type for SCIM core operations.
///
/// Wraps each error family so callers that drive a whole request (parse,
/// compile, project, validate) can use a single `?` chain.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// Malformed filter or attribute path
    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    /// Attribute path did not resolve against the schema
    #[error("Invalid path: {0}")]
    Resolve(#[from] ResolveError),

    /// Resource data doesn't conform to the schema shape
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Write rejected by mutability, requiredness or uniqueness rules
    #[error("Write rejected: {0}")]
    Write(#[from] WriteError),

    /// Invalid attributes/excludedAttributes selection
    #[error("Invalid projection: {0}")]
    Projection(#[from] ProjectionError),

    /// Schema loading or registration failure
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Resource type is not registered
    #[error("Resource type not found: {name}")]
    ResourceTypeNotFound { name: String },
}

/// Reason a character sequence could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// String literal without a closing quote
    UnterminatedString,
    /// Backslash followed by anything other than `"` or `\`
    InvalidEscape(char),
    /// Character that cannot start any token
    UnexpectedCharacter(char),
    /// Digits that do not form a valid number
    InvalidNumber(String),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            LexErrorKind::InvalidEscape(c) => write!(f, "invalid escape sequence '\\{}'", c),
            LexErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            LexErrorKind::InvalidNumber(n) => write!(f, "invalid number '{}'", n),
        }
    }
}

/// Tokenization failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} at {position}")]
pub struct LexError {
    pub position: Position,
    pub reason: LexErrorKind,
}

/// Grammar violation while parsing a filter or attribute path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, found {found} at {position}")]
pub struct ParseError {
    pub position: Position,
    pub expected: String,
    pub found: String,
}

/// Any failure turning filter source text into an AST.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FilterError {
    /// Source position of the failure.
    pub fn position(&self) -> Position {
        match self {
            FilterError::Lex(e) => e.position,
            FilterError::Parse(e) => e.position,
        }
    }
}

/// Semantic failure binding an attribute path to a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Path has no match in the base schema or any extension
    #[error("Unknown attribute '{path}' in schema '{schema}'")]
    UnknownAttribute { path: String, schema: String },

    /// Operation not applicable to the attribute's declared type
    #[error("Type mismatch on '{path}': {details}")]
    TypeMismatch { path: String, details: String },

    /// Value filter applied to an attribute that is not multi-valued complex
    #[error("Attribute '{path}' is not a multi-valued complex attribute")]
    NotMultiValued { path: String },
}

impl ResolveError {
    /// Create an unknown attribute error
    pub fn unknown(path: impl Into<String>, schema: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            path: path.into(),
            schema: schema.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(path: impl Into<String>, details: impl Into<String>) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            details: details.into(),
        }
    }
}

/// Validation errors for document shape checking.
///
/// These occur when resource data doesn't conform to the declared schema
/// structure, independent of any write-path policy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Attribute value doesn't match expected type
    #[error("Attribute '{attribute}' has invalid type, expected {expected}, got {actual}")]
    InvalidDataType {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// Multi-valued attribute provided as single value
    #[error("Attribute '{attribute}' must be multi-valued (array)")]
    ExpectedMultiValue { attribute: String },

    /// Single-valued attribute provided as array
    #[error("Attribute '{attribute}' must be single-valued (not array)")]
    ExpectedSingleValue { attribute: String },

    /// Unknown attribute in resource
    #[error("Unknown attribute '{attribute}' in schema '{schema_id}'")]
    UnknownAttribute {
        attribute: String,
        schema_id: String,
    },

    /// Schema URI not declared by the resource type
    #[error("Unknown schema URI: {uri}")]
    UnknownSchemaUri { uri: String },

    /// Invalid value for attribute with canonical values
    #[error("Attribute '{attribute}' has invalid value '{value}', allowed values: {allowed:?}")]
    InvalidCanonicalValue {
        attribute: String,
        value: String,
        allowed: Vec<String>,
    },

    /// Multiple primary values in multi-valued attribute
    #[error("Attribute '{attribute}' cannot have multiple primary values")]
    MultiplePrimaryValues { attribute: String },

    /// Invalid datetime format
    #[error("Attribute '{attribute}' has invalid datetime format: {value}")]
    InvalidDateTimeFormat { attribute: String, value: String },

    /// Invalid meta structure
    #[error("Invalid 'meta' structure: {details}")]
    InvalidMeta { details: String },

    /// General validation error with custom message
    #[error("Validation failed: {message}")]
    Custom { message: String },
}

impl ValidationError {
    /// Create an invalid type error
    pub fn invalid_type(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidDataType {
            attribute: attribute.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a custom validation error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

/// Write-path validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    /// Attempt to change an immutable value that is already set
    #[error("Attribute '{attribute}' is immutable and cannot be modified after it is set")]
    Mutability { attribute: String },

    /// Required attribute missing from the incoming resource
    #[error("Required attribute '{attribute}' is missing")]
    RequiredField { attribute: String },

    /// More than one element flagged as primary
    #[error("Attribute '{attribute}' cannot have more than one primary value")]
    UniquenessConflict { attribute: String },

    /// Incoming attribute not declared by the resource type's schemas
    #[error("Attribute '{attribute}' is not defined in schema '{schema_id}'")]
    UnknownAttribute { attribute: String, schema_id: String },

    /// Incoming schema URI not declared by the resource type
    #[error("Schema '{uri}' is not declared by resource type '{resource_type}'")]
    UnknownSchemaUri { uri: String, resource_type: String },
}

impl WriteError {
    pub fn mutability(attribute: impl Into<String>) -> Self {
        Self::Mutability {
            attribute: attribute.into(),
        }
    }

    pub fn required(attribute: impl Into<String>) -> Self {
        Self::RequiredField {
            attribute: attribute.into(),
        }
    }

    pub fn uniqueness(attribute: impl Into<String>) -> Self {
        Self::UniquenessConflict {
            attribute: attribute.into(),
        }
    }

    pub fn unknown_attribute(attribute: impl Into<String>, schema_id: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            attribute: attribute.into(),
            schema_id: schema_id.into(),
        }
    }
}

/// Invalid `attributes` / `excludedAttributes` request parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    /// Both requested and excluded attribute sets were supplied
    #[error("'attributes' and 'excludedAttributes' cannot both be specified")]
    ConflictingSelection,

    /// A selected path is syntactically invalid
    #[error("Invalid attribute path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: FilterError,
    },

    /// A selected path does not resolve against the schema
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Errors raised while loading schemas or building the registry.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Schema file could not be read
    #[error("Failed to read schema file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Schema document is not valid JSON for a schema definition
    #[error("Failed to parse schema: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema definition violates a structural rule
    #[error("Invalid schema '{id}': {message}")]
    InvalidSchema { id: String, message: String },

    /// Two schemas registered under the same URI
    #[error("Duplicate schema URI: {id}")]
    DuplicateSchema { id: String },

    /// Two resource types registered under the same name
    #[error("Duplicate resource type: {name}")]
    DuplicateResourceType { name: String },

    /// Resource type references a schema that was never registered
    #[error("Resource type '{resource_type}' references unknown schema '{uri}'")]
    UnknownSchema { resource_type: String, uri: String },
}

impl SchemaError {
    /// Create an invalid schema error
    pub fn invalid(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            id: id.into(),
            message: message.into(),
        }
    }
}

// Result type aliases for convenience
pub type ScimResult<T> = Result<T, ScimError>;
pub type FilterResult<T> = Result<T, FilterError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type WriteResult<T> = Result<T, WriteError>;
pub type ProjectionResult<T> = Result<T, ProjectionError>;
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_display() {
        let error = LexError {
            position: Position(7),
            reason: LexErrorKind::InvalidEscape('n'),
        };
        assert_eq!(error.to_string(), "invalid escape sequence '\\n' at offset 7");
    }

    #[test]
    fn test_filter_error_position() {
        let error = FilterError::from(ParseError {
            position: Position(11),
            expected: "literal".to_string(),
            found: "end of input".to_string(),
        });
        assert_eq!(error.position(), Position(11));
    }

    #[test]
    fn test_error_chain() {
        let write_error = WriteError::required("userName");
        let scim_error = ScimError::from(write_error);
        assert!(scim_error.to_string().contains("Write rejected"));
        assert!(scim_error.to_string().contains("userName"));
    }

    #[test]
    fn test_resolve_error_creation() {
        let error = ResolveError::unknown("nickname.first", "User");
        assert!(error.to_string().contains("nickname.first"));
    }
}
