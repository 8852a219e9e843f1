//! Application assembly.
//!
//! ```text
//! ApiSpec + ControllerResolver + RampartConfig
//!     ──compile──▶ Router ──Pipeline::standard──▶ Pipeline ──▶ Server
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rampart_config::{process_base_uri, RampartConfig};
use rampart_core::ApiSpec;
use rampart_middleware::{ErrorMapper, Pipeline, PipelineOptions};
use rampart_router::{compile, ControllerRegistry, ControllerResolver, Router};
use rampart_server::{Server, ServerConfig, ShutdownSignal};
use rampart_telemetry::{init_logging, init_metrics, LogConfig};

use crate::error::AppError;

/// A compiled application, ready to serve.
#[derive(Debug, Clone)]
pub struct App {
    config: RampartConfig,
    base_path: String,
    router: Arc<Router>,
    pipeline: Pipeline,
}

impl App {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    /// The configuration the app was built with.
    #[must_use]
    pub fn config(&self) -> &RampartConfig {
        &self.config
    }

    /// The prefix every route was compiled under.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// The compiled route table.
    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// The request pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Builds the HTTP server for this app.
    #[must_use]
    pub fn server(&self) -> Server {
        let settings = &self.config.server;
        let mut builder = ServerConfig::builder()
            .http_addr(settings.http_addr.clone())
            .request_timeout(Duration::from_secs(settings.request_timeout_secs))
            .shutdown_timeout(Duration::from_secs(settings.shutdown_timeout_secs))
            .max_body_bytes(settings.max_body_bytes)
            .http2_enabled(settings.http2_enabled);
        if let Some(tls) = &settings.tls {
            builder = builder.tls(tls.cert_path.clone(), tls.key_path.clone());
        }

        Server::new(builder.build(), self.pipeline.clone()).with_error_mapper(self.error_mapper())
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), AppError> {
        self.server().run().await?;
        Ok(())
    }

    /// Serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), AppError> {
        self.server().run_with_shutdown(shutdown).await?;
        Ok(())
    }

    fn error_mapper(&self) -> ErrorMapper {
        if self.config.api.debug {
            ErrorMapper::exposing_internal_errors()
        } else {
            ErrorMapper::new()
        }
    }
}

/// Installs logging, and the Prometheus exporter when enabled.
pub fn init_telemetry(config: &RampartConfig) -> Result<(), AppError> {
    init_logging(&LogConfig {
        level: config.logging.level.clone(),
        format: config.logging.format,
        ..LogConfig::default()
    })?;

    if config.metrics.enabled {
        init_metrics(&rampart_telemetry::MetricsConfig {
            enabled: true,
            addr: config.metrics.addr.clone(),
        })?;
    }
    Ok(())
}

/// Builder for [`App`].
#[derive(Default)]
pub struct AppBuilder {
    spec: Option<ApiSpec>,
    resolver: Option<Box<dyn ControllerResolver>>,
    config: RampartConfig,
}

impl AppBuilder {
    /// Sets the specification tree.
    #[must_use]
    pub fn spec(mut self, spec: ApiSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Reads the specification from a JSON file.
    pub fn spec_file(self, path: impl AsRef<Path>) -> Result<Self, AppError> {
        Ok(self.spec(ApiSpec::from_path(path)?))
    }

    /// Sets how controllers are found for each resource.
    #[must_use]
    pub fn controllers(mut self, resolver: impl ControllerResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Sets the runtime configuration.
    #[must_use]
    pub fn config(mut self, config: RampartConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the configuration, compiles the specification, and
    /// assembles the pipeline.
    pub fn build(self) -> Result<App, AppError> {
        let Self {
            spec,
            resolver,
            config,
        } = self;

        config.validate()?;
        let spec = spec.ok_or(AppError::MissingSpec)?;
        let resolver = resolver.unwrap_or_else(|| Box::new(ControllerRegistry::new()));

        let base_path = config.api.base_path.clone().unwrap_or_else(|| {
            spec.base_uri
                .as_deref()
                .map(process_base_uri)
                .unwrap_or_default()
        });

        let endpoints = compile(&spec, &base_path, resolver.as_ref())?;

        if config.auth.jwt_secret.is_none() {
            let protected = endpoints.iter().find(|endpoint| {
                config
                    .auth
                    .traits
                    .iter()
                    .any(|label| endpoint.traits().contains(label))
            });
            if let Some(endpoint) = protected {
                return Err(AppError::MissingJwtSecret {
                    endpoint: endpoint.to_string(),
                });
            }
        }

        tracing::info!(count = endpoints.len(), base_path = %base_path, "Route table compiled");

        let router = Arc::new(Router::new(endpoints));
        let pipeline = Pipeline::standard(
            Arc::clone(&router),
            PipelineOptions {
                debug: config.api.debug,
                validate_responses: config.api.validate_responses,
                jwt_secret: config.auth.jwt_secret.clone(),
                auth_traits: config.auth.traits.clone(),
            },
        );

        Ok(App {
            config,
            base_path,
            router,
            pipeline,
        })
    }
}

impl std::fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppBuilder")
            .field("spec", &self.spec)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
