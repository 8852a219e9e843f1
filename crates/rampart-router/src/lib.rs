//! Route table compilation and matching for Rampart.
//!
//! Startup:
//!
//! ```text
//! ApiSpec ──compile()──▶ Vec<EndpointRecord> ──Router::new()──▶ Router
//!              ▲
//!              └── ControllerResolver (structural path → HandlerSet)
//! ```
//!
//! Per request, [`Router::match_route`] scans the endpoints in declaration
//! order and returns the first one whose method and anchored,
//! case-insensitive pattern match.

#![doc(html_root_url = "https://docs.rs/rampart-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod compiler;
mod error;
mod resolver;
mod router;

pub use compiler::compile;
pub use error::CompileError;
pub use rampart_core::PathParams;
pub use resolver::{ControllerRegistry, ControllerResolver, ResolveError};
pub use router::{RouteMatch, Router};
