//! Server errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop the server from serving.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid bind address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address that was tried.
        addr: std::net::SocketAddr,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A configured TLS file does not exist.
    #[error("TLS {kind} not found: {}", .path.display())]
    TlsFileNotFound {
        /// `certificate` or `private key`.
        kind: &'static str,
        /// The configured path.
        path: PathBuf,
    },

    /// A TLS file could not be read or is not valid PEM.
    #[error("failed to read TLS file {}: {source}", .path.display())]
    TlsRead {
        /// The file being read.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The certificate file holds no certificates.
    #[error("no certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    /// The key file holds no private key.
    #[error("no private key found in {}", .0.display())]
    NoPrivateKey(PathBuf),

    /// rustls rejected the certificate and key.
    #[error("invalid TLS configuration: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),

    /// The bound listener failed.
    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}
