//! HTTPS termination with rustls.
//!
//! Certificates and keys are read from PEM files once, at startup. A missing
//! or unreadable file stops the server before it accepts anything.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig as RustlsConfig;
use tokio_rustls::TlsAcceptor;

use crate::error::ServerError;

/// Certificate chain and private key locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    /// PEM certificate chain, leaf first.
    pub cert_path: PathBuf,
    /// PEM private key.
    pub key_path: PathBuf,
}

/// Builds an acceptor from PEM files. `http2` adds `h2` to the ALPN list.
pub fn load_tls_acceptor(paths: &TlsPaths, http2: bool) -> Result<TlsAcceptor, ServerError> {
    let certs = load_certs(&paths.cert_path)?;
    let key = load_private_key(&paths.key_path)?;

    let mut config = RustlsConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    config.alpn_protocols = if http2 {
        vec![b"h2".to_vec(), b"http/1.1".to_vec()]
    } else {
        vec![b"http/1.1".to_vec()]
    };

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn open(path: &Path, kind: &'static str) -> Result<BufReader<File>, ServerError> {
    if !path.is_file() {
        return Err(ServerError::TlsFileNotFound {
            kind,
            path: path.to_path_buf(),
        });
    }
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| ServerError::TlsRead {
            path: path.to_path_buf(),
            source,
        })
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ServerError> {
    let mut reader = open(path, "certificate")?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ServerError::TlsRead {
            path: path.to_path_buf(),
            source,
        })?;

    if certs.is_empty() {
        return Err(ServerError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, ServerError> {
    let mut reader = open(path, "private key")?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| ServerError::TlsRead {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| ServerError::NoPrivateKey(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn pem_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_certificate() {
        let key = pem_file("");
        let paths = TlsPaths {
            cert_path: PathBuf::from("/nonexistent/rampart/server.pem"),
            key_path: key.path().to_path_buf(),
        };
        assert!(matches!(
            load_tls_acceptor(&paths, false),
            Err(ServerError::TlsFileNotFound { kind: "certificate", .. })
        ));
    }

    #[test]
    fn test_file_without_certificates() {
        let cert = pem_file("not a certificate\n");
        let key = pem_file("");
        let paths = TlsPaths {
            cert_path: cert.path().to_path_buf(),
            key_path: key.path().to_path_buf(),
        };
        assert!(matches!(
            load_tls_acceptor(&paths, false),
            Err(ServerError::NoCertificates(ref path)) if path == cert.path()
        ));
    }

    #[test]
    fn test_missing_private_key() {
        let paths = TlsPaths {
            cert_path: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/server.pem")),
            key_path: PathBuf::from("/nonexistent/rampart/server.key"),
        };
        assert!(matches!(
            load_tls_acceptor(&paths, false),
            Err(ServerError::TlsFileNotFound { kind: "private key", .. })
        ));
    }

    #[test]
    fn test_file_without_private_key() {
        let key = pem_file("");
        let paths = TlsPaths {
            cert_path: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/server.pem")),
            key_path: key.path().to_path_buf(),
        };
        assert!(matches!(
            load_tls_acceptor(&paths, false),
            Err(ServerError::NoPrivateKey(_))
        ));
    }

    #[test]
    fn test_fixture_pair_loads() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
        let paths = TlsPaths {
            cert_path: PathBuf::from(format!("{dir}/server.pem")),
            key_path: PathBuf::from(format!("{dir}/server.key")),
        };
        assert!(load_tls_acceptor(&paths, true).is_ok());
    }
}
