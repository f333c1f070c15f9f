//! Success envelope used by the cart, order, and wishlist endpoints.

use serde::Serialize;

/// `{ "status": "success", "data": ..., "message": ... }`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub const fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            data,
            message: Some(message.into()),
        }
    }
}
