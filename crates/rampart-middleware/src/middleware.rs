//! Core middleware trait and chain types.
//!
//! Each stage receives the context, the request and a [`Next`] it may call
//! to continue the chain. Returning without calling `next` short-circuits
//! the request.

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};

pub use rampart_core::BoxFuture;

/// A pipeline stage.
///
/// # Example
///
/// ```rust
/// use rampart_middleware::{BoxFuture, Middleware, MiddlewareContext, Next, Request, Response};
///
/// struct Passthrough;
///
/// impl Middleware for Passthrough {
///     fn name(&self) -> &'static str {
///         "passthrough"
///     }
///
///     fn process<'a>(
///         &'a self,
///         ctx: &'a mut MiddlewareContext,
///         request: Request,
///         next: Next<'a>,
///     ) -> BoxFuture<'a, Response> {
///         Box::pin(next.run(ctx, request))
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    /// Stage name, used in logs and metrics labels.
    fn name(&self) -> &'static str;

    /// Processes a request.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The end of the chain. It borrows the context only for the duration of
/// the returned future.
pub type Terminal<'a> = Box<
    dyn for<'c> FnOnce(&'c mut MiddlewareContext, Request) -> BoxFuture<'c, Response> + Send + 'a,
>;

/// The remainder of the chain after the current stage.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(Terminal<'a>),
}

impl<'a> Next<'a> {
    /// Wraps `next` with another stage.
    pub fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates the terminal link of a chain.
    pub fn handler<F>(handler: F) -> Self
    where
        F: for<'c> FnOnce(&'c mut MiddlewareContext, Request) -> BoxFuture<'c, Response>
            + Send
            + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(handler)),
        }
    }

    /// Runs the rest of the chain.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                middleware.process(ctx, request, *next).await
            }
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}

/// A closure-backed [`Middleware`].
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut MiddlewareContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    /// Creates a named middleware from a closure.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut MiddlewareContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        (self.func)(ctx, request, next)
    }
}
