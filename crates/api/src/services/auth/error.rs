//! Authentication error types.

use thiserror::Error;

use bazaar_core::OtpRejection;

use crate::db::RepositoryError;
use crate::db::otps::RedeemError;
use crate::models::ValidationError;
use crate::services::tokens::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Request payload failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wrong username or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but its signup OTP was never redeemed.
    #[error("account is not verified")]
    NotVerified,

    /// The account has already been verified.
    #[error("account is already verified")]
    AlreadyVerified,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Username or phone number already registered.
    #[error("{0}")]
    Conflict(String),

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// New password and its confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The current password supplied for a change is wrong.
    #[error("old password is incorrect")]
    WrongPassword,

    /// Missing, malformed, expired, or wrong-kind bearer token.
    #[error("invalid or expired token")]
    InvalidToken,

    /// No OTP with the given key.
    #[error("otp not found")]
    OtpNotFound,

    /// The OTP code was wrong or expired.
    #[error(transparent)]
    OtpRejected(#[from] OtpRejection),

    /// Token could not be issued.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<RepositoryError> for AuthError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

impl From<RedeemError> for AuthError {
    fn from(e: RedeemError) -> Self {
        match e {
            RedeemError::Rejected(rejection) => Self::OtpRejected(rejection),
            RedeemError::Repository(RepositoryError::NotFound) => Self::OtpNotFound,
            RedeemError::Repository(other) => other.into(),
        }
    }
}
