//! Authentication service.
//!
//! Provides username/password accounts verified by phone OTP, bearer token
//! issuing, and password change/reset.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use uuid::Uuid;

use bazaar_core::{OtpCode, OtpPolicy, OtpPurpose, PhoneNumber, UserId};

use crate::db::otps::{OtpEffect, OtpRepository};
use crate::db::users::UserRepository;
use crate::models::user::{NewUser, SignupRequest, UpdateUserRequest, User};
use crate::services::sms::{OtpSender, generate_code};
use crate::services::tokens::{TokenKind, TokenPair, TokenService};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles signup, OTP verification, login, and password management.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    otps: OtpRepository<'a>,
    tokens: &'a TokenService,
    otp_policy: OtpPolicy,
    sender: OtpSender,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService, otp_policy: OtpPolicy) -> Self {
        Self {
            users: UserRepository::new(pool),
            otps: OtpRepository::new(pool),
            tokens,
            otp_policy,
            sender: OtpSender,
        }
    }

    // =========================================================================
    // Signup
    // =========================================================================

    /// Register an unverified user and issue a signup OTP.
    ///
    /// Returns the OTP key the client must echo back with the code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` or `AuthError::WeakPassword` for bad input.
    /// Returns `AuthError::Conflict` if the username or phone number is taken.
    pub async fn signup(&self, req: &SignupRequest) -> Result<Uuid, AuthError> {
        req.validate()?;
        validate_password(&req.password)?;

        let password_hash = hash_password(&req.password)?;
        let new_user = NewUser {
            username: req.username.trim(),
            password_hash: &password_hash,
            phone_number: req.phone_number.as_ref(),
            first_name: req.first_name.trim(),
            last_name: req.last_name.trim(),
            email: req.email.as_ref(),
        };

        let code = generate_code(OtpPurpose::Signup);
        let (user, otp) = self
            .users
            .create_with_otp(&new_user, Uuid::new_v4(), code)
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
        self.sender
            .send(user.id, user.phone_number.as_ref(), otp.purpose, otp.code);

        Ok(otp.key)
    }

    /// Issue a new signup OTP for an unverified user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no user has this username.
    /// Returns `AuthError::AlreadyVerified` if the account is already verified.
    pub async fn resend_signup_otp(&self, username: &str) -> Result<Uuid, AuthError> {
        let user = self
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        self.issue_otp(&user, OtpPurpose::Signup).await
    }

    /// Redeem a signup OTP, marking the user verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OtpNotFound` if the key is unknown.
    /// Returns `AuthError::OtpRejected` if the code is wrong or expired.
    pub async fn verify_signup(&self, key: Uuid, code: OtpCode) -> Result<UserId, AuthError> {
        let user_id = self
            .otps
            .redeem(
                key,
                OtpPurpose::Signup,
                code,
                &self.otp_policy,
                OtpEffect::VerifyUser,
            )
            .await?;

        tracing::info!(user_id = %user_id, "User verified");
        Ok(user_id)
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Log in with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    /// Returns `AuthError::NotVerified` if the account has not been verified.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let (user, password_hash) = self
            .users
            .get_credentials(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash).map_err(|_| AuthError::InvalidCredentials)?;

        if !user.is_verified {
            return Err(AuthError::NotVerified);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(self.tokens.issue_pair(user.id, &user.username)?)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is invalid or its user is gone.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self
            .tokens
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .users
            .get_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(self
            .tokens
            .issue(user.id, &user.username, TokenKind::Access)?)
    }

    // =========================================================================
    // Profile & Password
    // =========================================================================

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Conflict` if the new username or phone number is taken.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        req: &UpdateUserRequest,
    ) -> Result<User, AuthError> {
        req.validate()?;
        self.users
            .update_profile(user_id, req)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change the password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongPassword` if `old_password` is wrong.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    pub async fn update_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        let current_hash = self
            .users
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(old_password, &current_hash).map_err(|_| AuthError::WrongPassword)?;
        let new_hash = checked_new_password(new_password, confirm_password)?;

        self.users.update_password(user_id, &new_hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Issue a password-reset OTP to the owner of `phone_number`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no user has this phone number.
    pub async fn request_password_reset(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<Uuid, AuthError> {
        let user = self
            .users
            .get_by_phone(phone_number)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.issue_otp(&user, OtpPurpose::PasswordReset).await
    }

    /// Redeem a password-reset OTP and set a new password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` or `AuthError::WeakPassword` for a
    /// bad new password, and the OTP errors of [`Self::verify_signup`].
    pub async fn confirm_password_reset(
        &self,
        key: Uuid,
        code: OtpCode,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<UserId, AuthError> {
        let new_hash = checked_new_password(new_password, confirm_password)?;

        let user_id = self
            .otps
            .redeem(
                key,
                OtpPurpose::PasswordReset,
                code,
                &self.otp_policy,
                OtpEffect::SetPassword(&new_hash),
            )
            .await?;

        tracing::info!(user_id = %user_id, "Password reset");
        Ok(user_id)
    }

    async fn issue_otp(&self, user: &User, purpose: OtpPurpose) -> Result<Uuid, AuthError> {
        let otp = self
            .otps
            .issue(user.id, Uuid::new_v4(), generate_code(purpose), purpose)
            .await?;

        self.sender
            .send(user.id, user.phone_number.as_ref(), otp.purpose, otp.code);

        Ok(otp.key)
    }
}

/// Validate a new password and its confirmation, returning its hash.
fn checked_new_password(new_password: &str, confirm_password: &str) -> Result<String, AuthError> {
    if new_password != confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    validate_password(new_password)?;
    hash_password(new_password)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
