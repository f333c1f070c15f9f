//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (propagate or generate `x-request-id`)
//! 4. CORS
//! 5. Error envelope (stamp path, wrap bare error responses)
//! 6. Rate limiting (governor, per client IP)

pub mod auth;
pub mod error_envelope;
pub mod rate_limit;
pub mod request_id;

pub use auth::{RequireAdmin, RequireAuth, RequireRefresh};
pub use error_envelope::error_envelope_middleware;
pub use rate_limit::{RateLimiterLayer, rate_limiter};
pub use request_id::request_id_middleware;
