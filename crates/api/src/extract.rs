//! Request extractors whose rejections render as [`AppError`] envelopes.
//!
//! axum's own `Json`, `Query` and `Path` reject with plain-text bodies; these
//! wrappers route the rejection through `AppError` instead.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON body. Malformed or mistyped bodies become `VALIDATION_FAILED`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string. Unparseable values become `INVALID_QUERY_PARAM`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters. Non-numeric IDs become `RESOURCE_NOT_FOUND`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
