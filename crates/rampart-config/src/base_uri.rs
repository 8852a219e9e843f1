//! Base URI handling.

/// Reduces a spec `baseUri` to the path prefix routes are mounted under.
///
/// The scheme and authority are dropped, as are trailing slashes. A bare
/// path is kept as-is and an empty or root path yields `""`.
///
/// ```
/// use rampart_config::process_base_uri;
///
/// assert_eq!(process_base_uri("https://api.foo.com/v2/"), "/v2");
/// assert_eq!(process_base_uri("/api/v1"), "/api/v1");
/// assert_eq!(process_base_uri("https://api.foo.com"), "");
/// ```
#[must_use]
pub fn process_base_uri(base_uri: &str) -> String {
    let trimmed = base_uri.trim();
    let path = match trimmed.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |index| &rest[index..]),
        None => trimmed,
    };
    path.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_uri() {
        assert_eq!(process_base_uri("https://api.foo.com/v2/"), "/v2");
        assert_eq!(process_base_uri("http://localhost:8080/api/v1"), "/api/v1");
    }

    #[test]
    fn test_host_only() {
        assert_eq!(process_base_uri("https://api.foo.com"), "");
        assert_eq!(process_base_uri("https://api.foo.com/"), "");
    }

    #[test]
    fn test_bare_path() {
        assert_eq!(process_base_uri("/v2"), "/v2");
        assert_eq!(process_base_uri("/v2//"), "/v2");
    }

    #[test]
    fn test_empty_and_root() {
        assert_eq!(process_base_uri(""), "");
        assert_eq!(process_base_uri("/"), "");
    }
}
