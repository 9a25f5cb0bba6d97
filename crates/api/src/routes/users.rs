//! User account route handlers.
//!
//! Signup is two-step: `POST /user/signup` creates an unverified account and
//! returns an `otp_key`; the code travels out of band and is redeemed at
//! `POST /user/verify-otp`. Only verified users can log in.

use axum::{Json, extract::State, http::StatusCode};

use crate::error::Result;
use crate::middleware::{ApiJson, RequireAuth};
use crate::models::user::{
    AccessTokenResponse, LoginRequest, OtpIssuedResponse, RefreshRequest, ResendOtpRequest,
    ResetIssuedResponse, ResetPasswordConfirmRequest, ResetPasswordRequest, SignupRequest,
    TokenPairResponse, UpdatePasswordRequest, UpdateUserRequest, User, VerifyOtpRequest,
};
use crate::models::{DataResponse, MessageResponse};
use crate::services::auth::AuthService;
use crate::state::AppState;

fn auth_service(state: &AppState) -> AuthService<'_> {
    AuthService::new(state.pool(), state.tokens(), state.config().otp_policy())
}

// =============================================================================
// Signup & Verification
// =============================================================================

/// Register a new, unverified user.
///
/// POST /user/signup
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<OtpIssuedResponse>)> {
    let otp_key = auth_service(&state).signup(&req).await?;
    Ok((StatusCode::CREATED, Json(OtpIssuedResponse { otp_key })))
}

/// Issue a fresh signup OTP.
///
/// POST /user/resend-otp
pub async fn resend_otp(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResendOtpRequest>,
) -> Result<Json<OtpIssuedResponse>> {
    let otp_key = auth_service(&state)
        .resend_signup_otp(&req.username)
        .await?;
    Ok(Json(OtpIssuedResponse { otp_key }))
}

/// Redeem a signup OTP.
///
/// POST /user/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>> {
    auth_service(&state)
        .verify_signup(req.otp_key, req.otp_code)
        .await?;
    Ok(Json(MessageResponse::new("account verified")))
}

// =============================================================================
// Tokens
// =============================================================================

/// Exchange username and password for an access/refresh token pair.
///
/// POST /user/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenPairResponse>> {
    let pair = auth_service(&state)
        .login(&req.username, &req.password)
        .await?;
    Ok(Json(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
    }))
}

/// Exchange a refresh token for a new access token.
///
/// POST /user/token/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>> {
    let access = auth_service(&state).refresh(&req.refresh).await?;
    Ok(Json(AccessTokenResponse { access }))
}

// =============================================================================
// Profile
// =============================================================================

/// GET /user/me
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<DataResponse<User>>> {
    let data = auth_service(&state).get_user(user.id).await?;
    Ok(Json(DataResponse { data }))
}

/// PATCH /user/update-user
pub async fn update_user(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<DataResponse<User>>> {
    let data = auth_service(&state).update_profile(user.id, &req).await?;
    Ok(Json(DataResponse { data }))
}

/// PATCH /user/update-password
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    auth_service(&state)
        .update_password(
            user.id,
            &req.old_password,
            &req.new_password,
            &req.confirm_password,
        )
        .await?;
    Ok(Json(MessageResponse::new("password updated")))
}

// =============================================================================
// Password Reset
// =============================================================================

/// Send a password-reset code to the phone on file.
///
/// POST /user/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<ResetIssuedResponse>> {
    let otp_key = auth_service(&state)
        .request_password_reset(&req.phone_number)
        .await?;
    Ok(Json(ResetIssuedResponse {
        message: "a reset code has been sent".to_string(),
        otp_key,
    }))
}

/// Redeem a password-reset code and set the new password.
///
/// POST /user/reset-password/confirm
pub async fn reset_password_confirm(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordConfirmRequest>,
) -> Result<Json<MessageResponse>> {
    auth_service(&state)
        .confirm_password_reset(
            req.otp_key,
            req.otp_code,
            &req.new_password,
            &req.confirm_password,
        )
        .await?;
    Ok(Json(MessageResponse::new("password has been reset")))
}
