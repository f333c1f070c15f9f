//! Error envelope finishing.
//!
//! Handler errors already carry an [`ErrorEnvelope`] in their response
//! extensions; this middleware stamps the request path into it. Error
//! responses produced by other layers (rate limiter, method-not-allowed,
//! oversized bodies) get an envelope built from their status code.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::request_id::RequestId;
use crate::error::{ErrorCode, ErrorEnvelope};

pub async fn error_envelope_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let request_id = request.extensions().get::<RequestId>().cloned();
    let response = next.run(request).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::info!(request_id = ?request_id.map(|id| id.0), %path, "rate limited");
    }

    let (mut parts, _body) = response.into_parts();
    let mut envelope = parts.extensions.remove::<ErrorEnvelope>().unwrap_or_else(|| {
        ErrorEnvelope::new(status, ErrorCode::for_status(status), default_message(status))
    });
    envelope.path = Some(path);

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    let body = Json(&envelope).into_response().into_body();
    parts.extensions.insert(envelope);

    Response::from_parts(parts, body)
}

fn default_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::TOO_MANY_REQUESTS => "Too many requests",
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed",
        StatusCode::NOT_FOUND => "Resource not found",
        StatusCode::UNAUTHORIZED => "Unauthorized",
        StatusCode::FORBIDDEN => "Forbidden",
        s if s.is_server_error() => "Internal server error",
        s => s.canonical_reason().unwrap_or("Bad request"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;
    use crate::error::AppError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/missing",
                get(|| async { AppError::not_found(ErrorCode::BookNotFound, "Book not found") }),
            )
            .route(
                "/busy",
                get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response() }),
            )
            .route("/ok", get(|| async { "fine" }))
            .layer(middleware::from_fn(error_envelope_middleware))
    }

    #[tokio::test]
    async fn test_path_is_added_to_handler_errors() {
        let response = app()
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["path"], "/missing");
        assert_eq!(body["code"], "BOOK_NOT_FOUND");
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn test_bare_errors_are_wrapped() {
        let response = app()
            .oneshot(Request::get("/busy").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = body_json(response).await;
        assert_eq!(body["code"], "TOO_MANY_REQUESTS");
        assert_eq!(body["path"], "/busy");
    }

    #[tokio::test]
    async fn test_method_not_allowed_is_wrapped() {
        let response = app()
            .oneshot(Request::delete("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await["code"], "METHOD_NOT_ALLOWED");
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let response = app()
            .oneshot(Request::get("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"fine");
    }
}
