//! # Rampart Middleware
//!
//! The request pipeline that sits in front of every Rampart handler.
//!
//! ```text
//! Request → RequestId → Telemetry → Routing → ContentType → Validation → Authentication → Handler
//!                                      │           │             │              │            │
//!                                     404         415           400         401/400    coded/500
//! ```
//!
//! Every rejection is rendered by the [`ErrorMapper`] as
//! `{status, message, data: {}}`. Successful handler output is wrapped as
//! `{statusCode: 200, message: "", data}` unless the handler set an
//! explicit body.
//!
//! ## Example
//!
//! ```
//! use rampart_middleware::pipeline::{Pipeline, PipelineOptions, Stage};
//! use rampart_router::Router;
//! use std::sync::Arc;
//!
//! let pipeline = Pipeline::standard(Arc::new(Router::default()), PipelineOptions::default());
//! assert_eq!(pipeline.stage_names()[2], Stage::Routing.name());
//! ```

#![doc(html_root_url = "https://docs.rs/rampart-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod mapper;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use mapper::ErrorMapper;
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineOptions, Stage};
pub use types::{Request, Response, ResponseExt};
