//! Request correlation IDs.
//!
//! An upstream `x-request-id` is kept when it is short and printable,
//! otherwise a UUID v4 is minted. The ID lands on the `http_request` span,
//! the Sentry scope, the request extensions, and the response headers.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// The current request's correlation ID, available as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuse the caller's ID if acceptable, else generate one.
    fn from_headers(headers: &HeaderMap) -> Self {
        let upstream = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN);

        Self(upstream.map_or_else(|| Uuid::new_v4().to_string(), str::to_owned))
    }
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = RequestId::from_headers(request.headers());

    Span::current().record("request_id", id.0.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &id.0));

    let header = HeaderValue::from_str(&id.0).ok();
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_upstream_id_is_trimmed_and_kept() {
        assert_eq!(RequestId::from_headers(&headers(" abc-123 ")).0, "abc-123");
    }

    #[test]
    fn test_unusable_ids_are_replaced() {
        let generated = RequestId::from_headers(&HeaderMap::new());
        assert!(Uuid::parse_str(&generated.0).is_ok());

        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        let replaced = RequestId::from_headers(&headers(&long));
        assert!(Uuid::parse_str(&replaced.0).is_ok());

        let blank = RequestId::from_headers(&headers("   "));
        assert!(Uuid::parse_str(&blank.0).is_ok());
    }
}
