//! The HTTP server.
//!
//! One tokio task serves each accepted connection. Every request is buffered
//! up to the configured body limit, handed to the [`Pipeline`], and bounded
//! by the request timeout as a whole. When TLS is configured, each accepted
//! stream completes a rustls handshake before HTTP is spoken on it.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Request;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use rampart_core::ApiError;
use rampart_middleware::{ErrorMapper, Pipeline, Response};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::tls::load_tls_acceptor;

/// Message returned when the request timeout fires.
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Message returned when the body exceeds the configured limit.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Request body too large";

/// Upper bound on a TLS handshake.
const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

type ConnectionError = Box<dyn std::error::Error + Send + Sync>;

/// Serves a [`Pipeline`] over HTTP.
///
/// ```rust,ignore
/// use rampart_server::{Server, ServerConfig};
///
/// let server = Server::new(ServerConfig::default(), pipeline);
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    pipeline: Pipeline,
    mapper: ErrorMapper,
}

impl Server {
    /// Creates a server for the given pipeline.
    #[must_use]
    pub fn new(config: ServerConfig, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline,
            mapper: ErrorMapper::new(),
        }
    }

    /// Sets the mapper used for failures raised before the pipeline runs.
    #[must_use]
    pub fn with_error_mapper(mut self, mapper: ErrorMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The pipeline requests are handed to.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// fires, then waits up to the shutdown timeout for them to drain.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let acceptor = match self.config.tls() {
            Some(paths) => Some(load_tls_acceptor(paths, self.config.http2_enabled())?),
            None => None,
        };

        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            scheme = if acceptor.is_some() { "https" } else { "http" },
            "Server listening"
        );

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();
                            let acceptor = acceptor.clone();

                            tokio::spawn(async move {
                                let result = match acceptor {
                                    Some(acceptor) => {
                                        let handshake = tokio::time::timeout(
                                            TLS_HANDSHAKE_TIMEOUT,
                                            acceptor.accept(stream),
                                        );
                                        match handshake.await {
                                            Ok(Ok(stream)) => {
                                                server.serve_connection(stream, shutdown).await
                                            }
                                            Ok(Err(e)) => Err(e.into()),
                                            Err(elapsed) => Err(elapsed.into()),
                                        }
                                    }
                                    None => server.serve_connection(stream, shutdown).await,
                                };
                                if let Err(e) = result {
                                    tracing::debug!(remote = %remote_addr, error = %e, "Connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            "Waiting up to {:?} for connections to close",
            shutdown_timeout
        );

        tokio::select! {
            () = tracker.wait_for_drain() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "Shutdown timeout reached with connections still open"
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    async fn serve_connection<S>(
        self: Arc<Self>,
        stream: S,
        shutdown: ShutdownSignal,
    ) -> Result<(), ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);
        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(request).await) }
        });

        if self.config.http2_enabled() {
            let builder = auto::Builder::new(TokioExecutor::new());
            let conn = builder.serve_connection(io, service);
            tokio::pin!(conn);

            tokio::select! {
                result = conn.as_mut() => result,
                () = shutdown.recv() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            }
        } else {
            let conn = http1::Builder::new().serve_connection(io, service);
            tokio::pin!(conn);

            tokio::select! {
                result = conn.as_mut() => result.map_err(Into::into),
                () = shutdown.recv() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await.map_err(Into::into)
                }
            }
        }
    }

    /// Buffers the body and runs the pipeline, bounded by the request timeout.
    async fn handle(&self, request: Request<Incoming>) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let work = async {
            let (parts, body) = request.into_parts();
            match Limited::new(body, self.config.max_body_bytes()).collect().await {
                Ok(collected) => {
                    let request = Request::from_parts(parts, collected.to_bytes());
                    self.pipeline.handle(request).await
                }
                Err(e) => self.reject_body(&e),
            }
        };

        match tokio::time::timeout(self.config.request_timeout(), work).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(http.method = %method, http.path = %path, "Request timed out");
                rampart_telemetry::record_rejection("timeout");
                self.mapper.map(&ApiError::timeout(TIMEOUT_MESSAGE))
            }
        }
    }

    fn reject_body(&self, error: &ConnectionError) -> Response {
        if error.downcast_ref::<LengthLimitError>().is_some() {
            rampart_telemetry::record_rejection("body_limit");
            return self
                .mapper
                .map(&ApiError::payload_too_large(PAYLOAD_TOO_LARGE_MESSAGE));
        }
        tracing::debug!(error = %error, "Failed to read request body");
        self.mapper
            .map(&ApiError::bad_request(format!("Failed to read request body: {error}")))
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

/// Reads the address a listener ended up on, useful after binding port 0.
pub fn local_addr(listener: &TcpListener) -> Result<SocketAddr, ServerError> {
    Ok(listener.local_addr()?)
}
