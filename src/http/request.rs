//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Capture the routing-relevant view of a request (method, pathname, search)
//!   that pipes and controllers receive
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Pipes get a read-only `RequestContext`, never the request itself, so
//!   they cannot change where the request is dispatched

use axum::http::{request::Parts, HeaderMap, HeaderValue, Method, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID for requests that don't carry one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read-only view of a request as seen by pipes and controllers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub method: Method,
    pub uri: Uri,
    /// Normalized, percent-decoded path.
    pub pathname: String,
    /// Raw query string including the leading `?`, or empty.
    pub search: String,
    pub headers: HeaderMap,
}

impl RequestContext {
    /// Build a context from request parts and an already-normalized pathname.
    pub fn from_parts(parts: &Parts, pathname: impl Into<String>) -> Self {
        Self {
            request_id: request_id_of(&parts.headers),
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            pathname: pathname.into(),
            search: search_of(&parts.uri),
            headers: parts.headers.clone(),
        }
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The request ID set by the request-ID layer, or `"unknown"`.
pub fn request_id_of(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// The query string of a URI in `?a=b` form, or empty.
pub fn search_of(uri: &Uri) -> String {
    uri.query()
        .filter(|q| !q.is_empty())
        .map(|q| format!("?{}", q))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_context_from_parts() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("http://localhost/api/users?page=2")
            .header(X_REQUEST_ID, "abc-123")
            .header("cookie", "session=1")
            .body(Body::empty())
            .unwrap();
        let (parts, _) = req.into_parts();

        let ctx = RequestContext::from_parts(&parts, "/api/users");
        assert_eq!(ctx.request_id, "abc-123");
        assert_eq!(ctx.method, Method::POST);
        assert_eq!(ctx.search, "?page=2");
        assert_eq!(ctx.header("cookie"), Some("session=1"));
    }

    #[test]
    fn test_request_uuid_is_generated() {
        let req = Request::builder().body(()).unwrap();
        let id = RequestUuid.make_request_id(&req).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(value).is_ok());
    }
}
