//! Controller lookup.
//!
//! The compiler asks a [`ControllerResolver`] for the handlers of each
//! structural path (the resource path with `{param}` segments removed), so
//! `/person` and `/person/{id}` share one controller.

use std::collections::HashMap;

use rampart_core::HandlerSet;
use thiserror::Error;

/// Why a controller could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Nothing is registered for the path.
    #[error("no controller registered for {0}")]
    NotFound(String),

    /// The resolver itself failed.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Looks up handler sets by structural path.
pub trait ControllerResolver: Send + Sync {
    /// Returns the handlers for `structural_path`.
    fn resolve(&self, structural_path: &str) -> Result<HandlerSet, ResolveError>;
}

impl<F> ControllerResolver for F
where
    F: Fn(&str) -> Result<HandlerSet, ResolveError> + Send + Sync,
{
    fn resolve(&self, structural_path: &str) -> Result<HandlerSet, ResolveError> {
        self(structural_path)
    }
}

/// An in-memory resolver.
///
/// # Example
///
/// ```rust
/// use rampart_core::{handler_fn, HandlerSet, RequestContext};
/// use rampart_router::{ControllerRegistry, ControllerResolver};
///
/// let registry = ControllerRegistry::new().controller(
///     "/person",
///     HandlerSet::new().get(handler_fn(|_ctx: &mut RequestContext| Box::pin(async { Ok(()) }))),
/// );
///
/// assert!(registry.resolve("/person").is_ok());
/// assert!(registry.resolve("/people").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, HandlerSet>,
}

impl ControllerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a controller, builder style.
    pub fn controller(mut self, structural_path: impl Into<String>, handlers: HandlerSet) -> Self {
        self.insert(structural_path, handlers);
        self
    }

    /// Registers a controller, replacing any previous one for the path.
    pub fn insert(&mut self, structural_path: impl Into<String>, handlers: HandlerSet) {
        self.controllers.insert(structural_path.into(), handlers);
    }

    /// Number of registered controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl ControllerResolver for ControllerRegistry {
    fn resolve(&self, structural_path: &str) -> Result<HandlerSet, ResolveError> {
        self.controllers
            .get(structural_path)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(structural_path.to_string()))
    }
}
