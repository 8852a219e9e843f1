//! Specification tree to endpoint list compiler.
//!
//! The tree is walked depth-first. Each node extends three prefixes:
//!
//! | segment   | structural path | pattern      | template |
//! |-----------|-----------------|--------------|----------|
//! | `person`  | `/person`       | `/person`    | `/person`|
//! | `{id}`    | (unchanged)     | `/([^/]+)`   | `/:id`   |
//!
//! The structural path keys controller lookup; the pattern keys URL matching.
//! Only the pattern and template carry the base path.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use rampart_core::{ApiSpec, EndpointRecord, HandlerSet, JsonSchema, ResourceNode, SchemaSource};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::CompileError;
use crate::resolver::{ControllerResolver, ResolveError};

/// Compiles a specification into endpoint records in traversal order.
///
/// `base_path` is prepended to every route (e.g. `/v2`); pass `""` for none.
///
/// # Errors
///
/// Fails if a node with operations has no controller, if resolution fails,
/// or if a method, schema or pattern is malformed.
pub fn compile(
    spec: &ApiSpec,
    base_path: &str,
    resolver: &dyn ControllerResolver,
) -> Result<Vec<EndpointRecord>, CompileError> {
    let mut compiler = Compiler {
        resolver,
        cache: HashMap::new(),
        records: Vec::new(),
    };
    let root = Prefix::root(base_path);
    for node in &spec.resources {
        compiler.visit(node, &root)?;
    }
    debug!(endpoints = compiler.records.len(), "specification compiled");
    Ok(compiler.records)
}

struct Compiler<'r> {
    resolver: &'r dyn ControllerResolver,
    cache: HashMap<String, HandlerSet>,
    records: Vec<EndpointRecord>,
}

impl Compiler<'_> {
    fn visit(&mut self, node: &ResourceNode, parent: &Prefix) -> Result<(), CompileError> {
        let prefix = parent.extend(&node.relative_uri);

        if !node.methods.is_empty() {
            self.emit(node, &prefix)?;
        }

        for child in &node.resources {
            self.visit(child, &prefix)?;
        }
        Ok(())
    }

    fn emit(&mut self, node: &ResourceNode, prefix: &Prefix) -> Result<(), CompileError> {
        let structural_path = prefix.structural_path();
        let template = prefix.template();
        let pattern = prefix.regex()?;
        let handlers = self.handlers_for(&structural_path)?;

        for operation in &node.methods {
            let method = Method::from_bytes(operation.method.to_ascii_uppercase().as_bytes())
                .map_err(|_| CompileError::InvalidMethod {
                    method: operation.method.clone(),
                    path: template.clone(),
                })?;

            let Some(handler) = handlers.handler(&method) else {
                warn!(
                    method = %method,
                    path = %template,
                    controller = %structural_path,
                    "declared method has no handler, skipping"
                );
                continue;
            };

            let endpoint = format!("{method} {template}");
            let request_schema = operation
                .request_schema()
                .map(|source| compile_schema(source, &endpoint))
                .transpose()?;
            let response_schema = operation
                .success_schema()
                .map(|source| compile_schema(source, &endpoint))
                .transpose()?;

            info!(method = %method, path = %template, "endpoint registered");

            self.records.push(
                EndpointRecord::new(
                    method,
                    template.clone(),
                    structural_path.clone(),
                    pattern.clone(),
                    prefix.params.clone(),
                    handler,
                )
                .with_traits(operation.is.iter().cloned())
                .with_request_schema(request_schema)
                .with_response_schema(response_schema),
            );
        }
        Ok(())
    }

    fn handlers_for(&mut self, structural_path: &str) -> Result<HandlerSet, CompileError> {
        if let Some(handlers) = self.cache.get(structural_path) {
            return Ok(handlers.clone());
        }
        let handlers = self
            .resolver
            .resolve(structural_path)
            .map_err(|error| match error {
                ResolveError::NotFound(_) => CompileError::ControllerNotFound {
                    path: structural_path.to_string(),
                },
                ResolveError::Other(source) => CompileError::Resolver {
                    path: structural_path.to_string(),
                    source,
                },
            })?;
        self.cache.insert(structural_path.to_string(), handlers.clone());
        Ok(handlers)
    }
}

fn compile_schema(source: &SchemaSource, endpoint: &str) -> Result<Arc<JsonSchema>, CompileError> {
    let document = source
        .to_document()
        .map_err(|source| CompileError::MalformedSchema {
            endpoint: endpoint.to_string(),
            source,
        })?;
    let schema = JsonSchema::compile(document).map_err(|source| CompileError::InvalidSchema {
        endpoint: endpoint.to_string(),
        source,
    })?;
    Ok(Arc::new(schema))
}

/// Accumulated path state at one depth of the traversal.
#[derive(Debug, Clone, Default)]
struct Prefix {
    literal: String,
    pattern: String,
    template: String,
    params: Vec<String>,
}

impl Prefix {
    fn root(base_path: &str) -> Self {
        let base = base_path.trim_end_matches('/');
        Self {
            literal: String::new(),
            pattern: regex::escape(base),
            template: base.to_string(),
            params: Vec::new(),
        }
    }

    fn extend(&self, relative_uri: &str) -> Self {
        let mut next = self.clone();
        for segment in relative_uri.split('/').filter(|s| !s.is_empty()) {
            match parameter_name(segment) {
                Some(name) => {
                    next.pattern.push_str("/([^/]+)");
                    next.template.push_str("/:");
                    next.template.push_str(name);
                    next.params.push(name.to_string());
                }
                None => {
                    next.literal.push('/');
                    next.literal.push_str(segment);
                    next.pattern.push('/');
                    next.pattern.push_str(&regex::escape(segment));
                    next.template.push('/');
                    next.template.push_str(segment);
                }
            }
        }
        next
    }

    fn structural_path(&self) -> String {
        or_root(&self.literal)
    }

    fn template(&self) -> String {
        or_root(&self.template)
    }

    fn regex(&self) -> Result<Regex, CompileError> {
        let body = if self.pattern.is_empty() { "/" } else { &self.pattern };
        Regex::new(&format!("(?i)^{body}$")).map_err(|source| CompileError::InvalidPattern {
            path: self.template(),
            source,
        })
    }
}

fn parameter_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|name| !name.is_empty())
}

fn or_root(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
