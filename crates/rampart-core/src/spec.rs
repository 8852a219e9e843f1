//! The parsed API specification tree.
//!
//! Rampart does not parse RAML or OpenAPI itself. It consumes the JSON that a
//! specification parser emits, deserialized into [`ApiSpec`]:
//!
//! ```json
//! {
//!   "baseUri": "https://api.foo.com/v2/",
//!   "resources": [{
//!     "relativeUri": "/person",
//!     "methods": [{"method": "get"}, {"method": "post", "body": {
//!       "application/json": {"schema": "{\"type\": \"object\"}"}
//!     }}],
//!     "resources": [{
//!       "relativeUri": "/{id}",
//!       "methods": [{"method": "get", "is": ["authenticated"]}]
//!     }]
//!   }]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The only media type Rampart reads schemas from.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Errors loading a specification document.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The document could not be read.
    #[error("failed to read specification {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not a valid specification tree.
    #[error("malformed specification: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Root of a specification document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpec {
    /// API title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Base URI, e.g. `https://api.foo.com/v2/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,
    /// Top-level resources.
    #[serde(default)]
    pub resources: Vec<ResourceNode>,
}

impl ApiSpec {
    /// Creates an empty specification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URI.
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Adds a top-level resource.
    pub fn with_resource(mut self, resource: ResourceNode) -> Self {
        self.resources.push(resource);
        self
    }

    /// Parses a specification from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a specification file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SpecError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

/// A node in the resource tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNode {
    /// Path relative to the parent, e.g. `/person` or `/{id}`.
    pub relative_uri: String,
    /// Operations declared on this node.
    #[serde(default)]
    pub methods: Vec<Operation>,
    /// Child resources.
    #[serde(default)]
    pub resources: Vec<ResourceNode>,
}

impl ResourceNode {
    /// Creates a node with no operations or children.
    #[must_use]
    pub fn new(relative_uri: impl Into<String>) -> Self {
        Self {
            relative_uri: relative_uri.into(),
            methods: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Declares an operation.
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.methods.push(operation);
        self
    }

    /// Adds a child node.
    pub fn with_child(mut self, child: ResourceNode) -> Self {
        self.resources.push(child);
        self
    }
}

/// An HTTP operation declared on a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// HTTP method, in any case.
    pub method: String,
    /// Trait labels applied to the operation.
    #[serde(default)]
    pub is: Vec<String>,
    /// Request bodies keyed by media type.
    #[serde(default)]
    pub body: IndexMap<String, BodyDefinition>,
    /// Responses keyed by status code.
    #[serde(default)]
    pub responses: IndexMap<String, ResponseDefinition>,
}

impl Operation {
    /// Creates an operation with no traits, body or responses.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// Applies a trait label.
    pub fn with_trait(mut self, label: impl Into<String>) -> Self {
        self.is.push(label.into());
        self
    }

    /// Declares a JSON request body schema.
    pub fn with_request_schema(mut self, schema: impl Into<SchemaSource>) -> Self {
        self.body.insert(
            JSON_MEDIA_TYPE.to_string(),
            BodyDefinition {
                schema: Some(schema.into()),
            },
        );
        self
    }

    /// Declares a JSON response body schema for a status code.
    pub fn with_response_schema(
        mut self,
        status: impl Into<String>,
        schema: impl Into<SchemaSource>,
    ) -> Self {
        let mut body = IndexMap::new();
        body.insert(
            JSON_MEDIA_TYPE.to_string(),
            BodyDefinition {
                schema: Some(schema.into()),
            },
        );
        self.responses.insert(status.into(), ResponseDefinition { body });
        self
    }

    /// Returns the JSON request body schema, if declared.
    #[must_use]
    pub fn request_schema(&self) -> Option<&SchemaSource> {
        json_schema(&self.body)
    }

    /// Returns the JSON body schema of the first 2xx response that has one.
    #[must_use]
    pub fn success_schema(&self) -> Option<&SchemaSource> {
        self.responses
            .iter()
            .filter(|(code, _)| is_success_code(code))
            .find_map(|(_, response)| json_schema(&response.body))
    }
}

/// A request or response body definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyDefinition {
    /// JSON Schema of the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaSource>,
}

/// A response definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseDefinition {
    /// Response bodies keyed by media type.
    #[serde(default)]
    pub body: IndexMap<String, BodyDefinition>,
}

/// A schema as it appears in the document.
///
/// Specification parsers usually inline JSON schemas as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaSource {
    /// Schema embedded as JSON text.
    Text(String),
    /// Schema embedded as a JSON document.
    Document(Value),
}

impl SchemaSource {
    /// Returns the schema as a JSON document, parsing text if needed.
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Text(text) => serde_json::from_str(text),
            Self::Document(document) => Ok(document.clone()),
        }
    }
}

impl From<Value> for SchemaSource {
    fn from(document: Value) -> Self {
        Self::Document(document)
    }
}

impl From<&str> for SchemaSource {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for SchemaSource {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

fn json_schema(bodies: &IndexMap<String, BodyDefinition>) -> Option<&SchemaSource> {
    bodies
        .iter()
        .find(|(media_type, _)| media_type.eq_ignore_ascii_case(JSON_MEDIA_TYPE))
        .and_then(|(_, body)| body.schema.as_ref())
}

fn is_success_code(code: &str) -> bool {
    code.len() == 3 && code.starts_with('2') && code.bytes().all(|b| b.is_ascii_digit())
}
