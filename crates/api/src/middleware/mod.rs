//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span, returned in `x-request-id`)
//! 4. Rate limiting (governor, public `/user` auth routes only)
//!
//! Authentication is an extractor rather than a layer: handlers that need a
//! caller take [`RequireAuth`].

pub mod auth;
pub mod extract;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AuthUser, RequireAuth};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use rate_limit::{auth_rate_limiter, rate_limited_as_json};
pub use request_id::request_id_middleware;
