//! # Rampart
//!
//! Rampart turns a declarative resource tree into a running HTTP service.
//! Every resource path and method in the tree becomes a route, and every
//! request passes through a fixed pipeline before reaching a controller:
//!
//! ```text
//! Request → RequestId → Telemetry → Routing → ContentType → Validation
//!         → Authentication → Handler → success/error envelope
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use rampart::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let config = ConfigLoader::new()
//!         .with_optional_file("rampart.toml")?
//!         .with_dotenv()?
//!         .with_env_prefix("RAMPART")
//!         .load()?;
//!     init_telemetry(&config)?;
//!
//!     let people = HandlerSet::new().get(handler_fn(|ctx: &mut RequestContext| {
//!         Box::pin(async move {
//!             ctx.set_data(serde_json::json!([]));
//!             Ok(())
//!         })
//!     }));
//!
//!     App::builder()
//!         .spec_file("api.json")?
//!         .controllers(ControllerRegistry::new().controller("/person", people))
//!         .config(config)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/rampart/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;

pub use app::{init_telemetry, App, AppBuilder};
pub use error::AppError;

pub use rampart_config as config;
pub use rampart_core as core;
pub use rampart_middleware as middleware;
pub use rampart_router as router;
pub use rampart_server as server;
pub use rampart_telemetry as telemetry;

/// Common imports.
///
/// ```rust,ignore
/// use rampart::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{init_telemetry, App, AppBuilder, AppError};

    pub use rampart_config::{ConfigLoader, RampartConfig};
    pub use rampart_core::{
        handler_fn, ApiSpec, Claims, Handler, HandlerError, HandlerResult, HandlerSet, Operation,
        RequestContext, ResourceNode,
    };
    pub use rampart_router::{ControllerRegistry, ControllerResolver, ResolveError};
    pub use rampart_server::ShutdownSignal;
}
