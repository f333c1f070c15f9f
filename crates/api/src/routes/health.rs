//! Banner and health checks.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

const SERVICE_NAME: &str = "bookstore-backend";

#[derive(Debug, Serialize)]
pub struct Banner {
    message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    status: &'static str,
    timestamp: DateTime<Utc>,
    service: &'static str,
    version: &'static str,
}

pub async fn banner() -> Json<Banner> {
    Json(Banner {
        message: "Bookstore API server is running.",
    })
}

/// Liveness check. Does not touch dependencies.
pub async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "OK",
        timestamp: Utc::now(),
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check.
///
/// Verifies database connectivity. Returns 503 Service Unavailable if the
/// database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
