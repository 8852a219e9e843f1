//! Loading configuration from files on disk.

use std::io::Write;

use rampart_config::{ConfigError, ConfigLoader, LogFormat};
use tempfile::NamedTempFile;

fn file_with(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file() {
    let file = file_with(
        ".toml",
        r#"
[server]
http_addr = "127.0.0.1:7000"
max_body_bytes = 4096

[api]
base_path = "/v2"

[auth]
jwt_secret = "s3cret"

[logging]
level = "debug"
format = "pretty"
"#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.http_addr().unwrap().port(), 7000);
    assert_eq!(config.server.max_body_bytes, 4096);
    assert_eq!(config.api.base_path.as_deref(), Some("/v2"));
    assert_eq!(config.auth.traits, vec!["authenticated"]);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_json_file() {
    let file = file_with(".json", r#"{"metrics": {"enabled": true, "addr": "127.0.0.1:9100"}}"#);

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert!(config.metrics.enabled);
    assert_eq!(config.metrics.addr, "127.0.0.1:9100");
}

#[test]
fn test_unknown_extension() {
    let file = file_with(".yaml", "server: {}");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ref ext)) if ext == "yaml"));
}

#[test]
fn test_unknown_field_rejected() {
    let file = file_with(".toml", "[server]\nport = 80\n");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn test_invalid_value_rejected_on_load() {
    let file = file_with(".toml", "[api]\nbase_path = \"v2\"\n");
    let result = ConfigLoader::new().with_file(file.path()).unwrap().load();
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_dotenv_file_populates_environment() {
    let file = file_with(".env", "RAMPART_FILES_TEST_MARKER=present\n");
    ConfigLoader::new().with_dotenv_path(file.path()).unwrap();
    assert_eq!(
        std::env::var("RAMPART_FILES_TEST_MARKER").as_deref(),
        Ok("present")
    );
}

#[test]
fn test_tls_files_must_exist() {
    let cert = file_with(".pem", "certificate");
    let dir = tempfile::tempdir().unwrap();
    let missing_key = dir.path().join("server.key");

    let file = file_with(
        ".toml",
        &format!(
            "[server.tls]\ncert_path = '{}'\nkey_path = '{}'\n",
            cert.path().display(),
            missing_key.display()
        ),
    );
    let result = ConfigLoader::new().with_file(file.path()).unwrap().load();
    assert!(matches!(
        result,
        Err(ConfigError::TlsFileNotFound { ref field, ref path })
            if field == "server.tls.key_path" && *path == missing_key
    ));
}

#[test]
fn test_tls_files_present() {
    let cert = file_with(".pem", "certificate");
    let key = file_with(".key", "key");

    let file = file_with(
        ".toml",
        &format!(
            "[server.tls]\ncert_path = '{}'\nkey_path = '{}'\n",
            cert.path().display(),
            key.path().display()
        ),
    );
    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    let tls = config.server.tls.unwrap();
    assert_eq!(tls.cert_path, cert.path());
    assert_eq!(tls.key_path, key.path());
}
