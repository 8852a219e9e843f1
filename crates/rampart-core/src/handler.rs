//! Handler traits and per-controller handler sets.
//!
//! A handler is an async function that receives the [`RequestContext`],
//! writes its output into it, and returns `Ok(())` or a [`HandlerError`].
//!
//! ```rust
//! use rampart_core::{handler_fn, HandlerSet, RequestContext};
//! use serde_json::json;
//!
//! let handlers = HandlerSet::new()
//!     .get(handler_fn(|ctx: &mut RequestContext| {
//!         Box::pin(async move {
//!             let id = ctx.param("id").unwrap_or("all").to_string();
//!             ctx.set_data(json!({ "id": id }));
//!             Ok(())
//!         })
//!     }));
//!
//! assert!(handlers.handler(&http::Method::GET).is_some());
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;

use crate::context::RequestContext;
use crate::error::HandlerError;

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler returns.
pub type HandlerResult = Result<(), HandlerError>;

/// Business logic bound to one method of one resource.
pub trait Handler: Send + Sync + 'static {
    /// Handles a request, writing output into `ctx`.
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, HandlerResult>;
}

/// A closure-backed [`Handler`].
pub struct FnHandler<F> {
    func: F,
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, HandlerResult> {
        (self.func)(ctx)
    }
}

/// Wraps a closure as a [`Handler`].
pub fn handler_fn<F>(func: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    FnHandler { func }
}

/// The handlers a controller exposes, keyed by HTTP method.
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: IndexMap<Method, Arc<dyn Handler>>,
}

impl HandlerSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a handler to a method, replacing any previous binding.
    pub fn on(mut self, method: Method, handler: impl Handler) -> Self {
        self.handlers.insert(method, Arc::new(handler));
        self
    }

    /// Binds a `GET` handler.
    pub fn get(self, handler: impl Handler) -> Self {
        self.on(Method::GET, handler)
    }

    /// Binds a `POST` handler.
    pub fn post(self, handler: impl Handler) -> Self {
        self.on(Method::POST, handler)
    }

    /// Binds a `PUT` handler.
    pub fn put(self, handler: impl Handler) -> Self {
        self.on(Method::PUT, handler)
    }

    /// Binds a `PATCH` handler.
    pub fn patch(self, handler: impl Handler) -> Self {
        self.on(Method::PATCH, handler)
    }

    /// Binds a `DELETE` handler.
    pub fn delete(self, handler: impl Handler) -> Self {
        self.on(Method::DELETE, handler)
    }

    /// Returns the handler for a method.
    #[must_use]
    pub fn handler(&self, method: &Method) -> Option<Arc<dyn Handler>> {
        self.handlers.get(method).cloned()
    }

    /// Iterates over the bound methods in insertion order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.handlers.keys()
    }

    /// Number of bound methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no methods are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop() -> impl Handler {
        handler_fn(|_ctx: &mut RequestContext| Box::pin(async { Ok(()) }))
    }

    #[test]
    fn test_methods_in_insertion_order() {
        let set = HandlerSet::new().post(noop()).get(noop()).delete(noop());
        let methods: Vec<_> = set.methods().cloned().collect();
        assert_eq!(methods, vec![Method::POST, Method::GET, Method::DELETE]);
        assert!(set.handler(&Method::PUT).is_none());
    }

    #[test]
    fn test_rebinding_replaces() {
        let set = HandlerSet::new().get(noop()).get(noop());
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn test_fn_handler_writes_data() {
        let handler = handler_fn(|ctx: &mut RequestContext| {
            Box::pin(async move {
                ctx.set_data(json!({"hello": "world"}));
                Ok(())
            })
        });

        let mut ctx = RequestContext::mock();
        handler.call(&mut ctx).await.unwrap();
        assert_eq!(ctx.data(), &json!({"hello": "world"}));
    }

    #[tokio::test]
    async fn test_fn_handler_propagates_errors() {
        let handler = handler_fn(|_ctx: &mut RequestContext| {
            Box::pin(async move { Err(HandlerError::forbidden("nope")) })
        });

        let mut ctx = RequestContext::mock();
        let error = handler.call(&mut ctx).await.unwrap_err();
        assert!(matches!(error, HandlerError::Status { status: 403, .. }));
    }
}
