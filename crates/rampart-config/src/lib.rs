//! # Rampart Config
//!
//! Typed, layered configuration for Rampart services.
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_secs = 10800
//!
//! [api]
//! base_path = "/v2"
//! debug = false
//!
//! [auth]
//! jwt_secret = "change-me"
//! traits = ["authenticated"]
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! Any field can be overridden with `RAMPART__SECTION__KEY`, e.g.
//! `RAMPART__AUTH__JWT_SECRET`.
//!
//! A `[server.tls]` table with `cert_path` and `key_path` switches the server
//! to HTTPS. Both files must exist or loading fails.

#![doc(html_root_url = "https://docs.rs/rampart-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod base_uri;
mod config;
mod error;
mod loader;
mod schema;

pub use base_uri::process_base_uri;
pub use config::RampartConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::*;
