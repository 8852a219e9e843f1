//! # Rampart Server
//!
//! HTTP/1.1 server (HTTP/2 optional) that feeds buffered requests into a
//! Rampart [`Pipeline`](rampart_middleware::Pipeline).
//!
//! - task per connection on the tokio runtime
//! - request body limit, answered with 413
//! - coarse request timeout, answered with 503
//! - graceful shutdown on SIGINT/SIGTERM with connection draining
//! - optional HTTPS through rustls, with certificates loaded at startup

#![doc(html_root_url = "https://docs.rs/rampart-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod server;
mod shutdown;
mod tls;

pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use error::ServerError;
pub use server::{local_addr, Server, PAYLOAD_TOO_LARGE_MESSAGE, TIMEOUT_MESSAGE};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownReceiver, ShutdownSignal};
pub use tls::{load_tls_acceptor, TlsPaths};
