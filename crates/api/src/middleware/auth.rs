//! Authentication extractors.
//!
//! Provides an extractor for requiring a bearer access token in route handlers.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use bazaar_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::services::tokens::TokenKind;
use crate::state::AppState;

/// The authenticated caller, taken from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub username: String,
}

/// Extractor that requires a valid `Authorization: Bearer <access token>`.
///
/// Rejects with 401 if the header is missing, malformed, expired, or carries
/// a refresh token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            AppError::Unauthorized("authentication credentials were not provided".to_string())
        })?;

        let claims = state
            .tokens()
            .verify(token, TokenKind::Access)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                AppError::Unauthorized("invalid or expired token".to_string())
            })?;

        set_sentry_user(&claims.sub, &claims.username);

        Ok(Self(AuthUser {
            id: claims.sub,
            username: claims.username,
        }))
    }
}

/// Pull the token out of an `Authorization: Bearer ...` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
