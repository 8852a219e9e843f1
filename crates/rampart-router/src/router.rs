//! First-match request router.

use std::sync::Arc;

use http::Method;
use rampart_core::{EndpointRecord, PathParams};

/// Outcome of routing a request.
#[derive(Debug, Clone)]
pub enum RouteMatch<'a> {
    /// An endpoint matched.
    Found {
        /// The matched endpoint.
        endpoint: &'a Arc<EndpointRecord>,
        /// Values captured from parameter segments.
        params: PathParams,
    },
    /// No endpoint matched the method and path.
    NotFound,
}

impl RouteMatch<'_> {
    /// Returns true if an endpoint matched.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// An immutable, ordered route table.
///
/// Endpoints are tried in declaration order and the first whose method and
/// pattern both match wins. Overlapping routes are not reordered by
/// specificity.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use rampart_core::{handler_fn, ApiSpec, HandlerSet, Operation, RequestContext, ResourceNode};
/// use rampart_router::{compile, ControllerRegistry, RouteMatch, Router};
///
/// let spec = ApiSpec::new().with_resource(
///     ResourceNode::new("/person")
///         .with_child(ResourceNode::new("/{id}").with_operation(Operation::new("get"))),
/// );
/// let registry = ControllerRegistry::new().controller(
///     "/person",
///     HandlerSet::new().get(handler_fn(|_ctx: &mut RequestContext| Box::pin(async { Ok(()) }))),
/// );
///
/// let router = Router::new(compile(&spec, "/v2", &registry).unwrap());
/// match router.match_route(&Method::GET, "/V2/Person/42?expand=true") {
///     RouteMatch::Found { params, .. } => assert_eq!(params.get("id"), Some("42")),
///     RouteMatch::NotFound => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Router {
    endpoints: Vec<Arc<EndpointRecord>>,
}

impl Router {
    /// Creates a router over compiled endpoints, keeping their order.
    #[must_use]
    pub fn new(endpoints: Vec<EndpointRecord>) -> Self {
        Self {
            endpoints: endpoints.into_iter().map(Arc::new).collect(),
        }
    }

    /// Matches a method and path. Anything after `?` is ignored.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let path = path.split_once('?').map_or(path, |(path, _)| path);

        for endpoint in &self.endpoints {
            if endpoint.method() != method {
                continue;
            }
            let Some(captures) = endpoint.pattern().captures(path) else {
                continue;
            };
            let params = endpoint
                .param_names()
                .iter()
                .zip(captures.iter().skip(1))
                .filter_map(|(name, value)| value.map(|v| (name.clone(), v.as_str().to_string())))
                .collect();
            return RouteMatch::Found { endpoint, params };
        }
        RouteMatch::NotFound
    }

    /// The endpoints in match order.
    #[must_use]
    pub fn endpoints(&self) -> &[Arc<EndpointRecord>] {
        &self.endpoints
    }

    /// Number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns true if there are no endpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{handler_fn, Handler, RequestContext};
    use regex::Regex;

    fn handler() -> Arc<dyn Handler> {
        Arc::new(handler_fn(|_ctx: &mut RequestContext| Box::pin(async { Ok(()) })))
    }

    fn record(method: Method, template: &str, pattern: &str, params: &[&str]) -> EndpointRecord {
        EndpointRecord::new(
            method,
            template,
            "/",
            Regex::new(pattern).unwrap(),
            params.iter().map(ToString::to_string).collect(),
            handler(),
        )
    }

    fn router() -> Router {
        Router::new(vec![
            record(Method::GET, "/person", "(?i)^/person$", &[]),
            record(Method::POST, "/person", "(?i)^/person$", &[]),
            record(Method::GET, "/person/:id", "(?i)^/person/([^/]+)$", &["id"]),
            record(Method::GET, "/person/me", "(?i)^/person/me$", &[]),
        ])
    }

    fn matched_template(router: &Router, method: &Method, path: &str) -> Option<String> {
        match router.match_route(method, path) {
            RouteMatch::Found { endpoint, .. } => Some(endpoint.path().to_string()),
            RouteMatch::NotFound => None,
        }
    }

    #[test]
    fn test_method_dispatch() {
        let router = router();
        assert!(router.match_route(&Method::POST, "/person").is_found());
        assert!(!router.match_route(&Method::DELETE, "/person").is_found());
    }

    #[test]
    fn test_params_captured_with_original_case() {
        match router().match_route(&Method::GET, "/PERSON/AbC") {
            RouteMatch::Found { endpoint, params } => {
                assert_eq!(endpoint.path(), "/person/:id");
                assert_eq!(params.get("id"), Some("AbC"));
            }
            RouteMatch::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn test_first_match_wins_over_specificity() {
        let router = router();
        assert_eq!(
            matched_template(&router, &Method::GET, "/person/me").as_deref(),
            Some("/person/:id")
        );
    }

    #[test]
    fn test_query_is_ignored() {
        let router = router();
        assert_eq!(
            matched_template(&router, &Method::GET, "/person?limit=5").as_deref(),
            Some("/person")
        );
    }

    #[test]
    fn test_anchored_matching() {
        let router = router();
        assert!(!router.match_route(&Method::GET, "/person/1/extra").is_found());
        assert!(!router.match_route(&Method::GET, "/api/person").is_found());
        assert!(!router.match_route(&Method::GET, "/person/").is_found());
    }

    #[test]
    fn test_empty_router() {
        let router = Router::default();
        assert!(router.is_empty());
        assert!(!router.match_route(&Method::GET, "/").is_found());
    }
}
