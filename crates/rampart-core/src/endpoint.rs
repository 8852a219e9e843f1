//! Compiled endpoint records.

use std::fmt;
use std::sync::Arc;

use http::Method;
use indexmap::IndexSet;
use regex::Regex;

use crate::handler::Handler;
use crate::schema::JsonSchema;

/// One routable `(method, path)` pair with everything the pipeline needs.
///
/// Records are produced by the endpoint compiler and never mutated after.
#[derive(Clone)]
pub struct EndpointRecord {
    method: Method,
    path: String,
    structural_path: String,
    pattern: Regex,
    param_names: Vec<String>,
    traits: IndexSet<String>,
    request_schema: Option<Arc<JsonSchema>>,
    response_schema: Option<Arc<JsonSchema>>,
    handler: Arc<dyn Handler>,
}

impl EndpointRecord {
    /// Creates a record with no traits or schemas.
    ///
    /// `pattern` must capture one group per entry of `param_names`.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        structural_path: impl Into<String>,
        pattern: Regex,
        param_names: Vec<String>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            structural_path: structural_path.into(),
            pattern,
            param_names,
            traits: IndexSet::new(),
            request_schema: None,
            response_schema: None,
            handler,
        }
    }

    /// Sets the trait labels.
    pub fn with_traits(mut self, traits: impl IntoIterator<Item = String>) -> Self {
        self.traits = traits.into_iter().collect();
        self
    }

    /// Sets the request body schema.
    pub fn with_request_schema(mut self, schema: Option<Arc<JsonSchema>>) -> Self {
        self.request_schema = schema;
        self
    }

    /// Sets the success response schema.
    pub fn with_response_schema(mut self, schema: Option<Arc<JsonSchema>>) -> Self {
        self.response_schema = schema;
        self
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Route template, e.g. `/v2/person/:id`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Literal path with parameter segments elided, e.g. `/person`.
    #[must_use]
    pub fn structural_path(&self) -> &str {
        &self.structural_path
    }

    /// The compiled, anchored matcher.
    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Capture names in path order.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Trait labels in declaration order.
    #[must_use]
    pub fn traits(&self) -> &IndexSet<String> {
        &self.traits
    }

    /// The request body schema.
    #[must_use]
    pub fn request_schema(&self) -> Option<&JsonSchema> {
        self.request_schema.as_deref()
    }

    /// The success response schema.
    #[must_use]
    pub fn response_schema(&self) -> Option<&JsonSchema> {
        self.response_schema.as_deref()
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl PartialEq for EndpointRecord {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.path == other.path
            && self.structural_path == other.structural_path
            && self.pattern.as_str() == other.pattern.as_str()
            && self.param_names == other.param_names
            && self.traits == other.traits
            && self.request_schema == other.request_schema
            && self.response_schema == other.response_schema
            && Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl fmt::Debug for EndpointRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointRecord")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("structural_path", &self.structural_path)
            .field("pattern", &self.pattern.as_str())
            .field("traits", &self.traits)
            .field("request_schema", &self.request_schema.is_some())
            .field("response_schema", &self.response_schema.is_some())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for EndpointRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
