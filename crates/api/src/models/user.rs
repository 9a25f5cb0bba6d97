//! User domain types and account request payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_core::{Email, OtpCode, PhoneNumber, UserId};

use super::{ValidationError, limit_text, require_text};

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;
/// Maximum length of first and last names.
pub const MAX_NAME_LENGTH: usize = 150;

/// A marketplace account (domain type).
///
/// The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Phone number the OTPs are delivered to.
    pub phone_number: Option<PhoneNumber>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<Email>,
    /// Whether the signup OTP has been redeemed.
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a new user.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub phone_number: Option<&'a PhoneNumber>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: Option<&'a Email>,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub phone_number: Option<PhoneNumber>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<Email>,
}

impl SignupRequest {
    /// Validate length limits (password strength is checked by the auth service).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` naming the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        limit_text("first_name", &self.first_name, MAX_NAME_LENGTH)?;
        limit_text("last_name", &self.last_name, MAX_NAME_LENGTH)
    }
}

/// Usernames are non-blank, bounded, and free of whitespace.
pub(crate) fn validate_username(username: &str) -> Result<(), ValidationError> {
    require_text("username", username, MAX_USERNAME_LENGTH)?;
    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("username cannot contain whitespace"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(alias = "key")]
    pub otp_key: Uuid,
    pub otp_code: OtpCode,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub phone_number: Option<PhoneNumber>,
}

impl UpdateUserRequest {
    /// # Errors
    ///
    /// Returns `ValidationError` if the username is malformed or a name is too long.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(first_name) = &self.first_name {
            limit_text("first_name", first_name, MAX_NAME_LENGTH)?;
        }
        if let Some(last_name) = &self.last_name {
            limit_text("last_name", last_name, MAX_NAME_LENGTH)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub phone_number: PhoneNumber,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordConfirmRequest {
    pub otp_key: Uuid,
    pub otp_code: OtpCode,
    pub new_password: String,
    pub confirm_password: String,
}

/// Returned when an OTP has been issued; the code itself goes out of band.
#[derive(Debug, Clone, Serialize)]
pub struct OtpIssuedResponse {
    pub otp_key: Uuid,
}

/// Returned when a password-reset OTP has been issued.
#[derive(Debug, Clone, Serialize)]
pub struct ResetIssuedResponse {
    pub message: String,
    pub otp_key: Uuid,
}

/// Access + refresh token pair returned by login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Fresh access token returned by the refresh endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_deserializes_and_normalizes_phone() {
        let req: SignupRequest = serde_json::from_value(serde_json::json!({
            "username": "dilnoza",
            "password": "correct horse battery",
            "phone_number": "+998 90 123 45 67"
        }))
        .unwrap();

        assert_eq!(req.phone_number.as_ref().unwrap().as_str(), "+998901234567");
        assert!(req.first_name.is_empty());
        assert!(req.email.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_signup_request_without_phone() {
        let req: SignupRequest = serde_json::from_value(serde_json::json!({
            "username": "dilnoza",
            "password": "correct horse battery"
        }))
        .unwrap();

        assert!(req.phone_number.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_signup_request_rejects_bad_phone() {
        let result = serde_json::from_value::<SignupRequest>(serde_json::json!({
            "username": "dilnoza",
            "password": "correct horse battery",
            "phone_number": "not a phone"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("market_admin").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("two words").is_err());
        assert!(validate_username(&"u".repeat(151)).is_err());
    }

    #[test]
    fn test_verify_request_accepts_string_code() {
        let req: VerifyOtpRequest = serde_json::from_value(serde_json::json!({
            "otp_key": "6f1c2a4e-3b5d-4e8f-9a7b-1c2d3e4f5a6b",
            "otp_code": "4821"
        }))
        .unwrap();
        assert_eq!(req.otp_code, OtpCode::new(4821));
    }

    #[test]
    fn test_verify_request_accepts_key_alias() {
        let req: VerifyOtpRequest = serde_json::from_value(serde_json::json!({
            "key": "6f1c2a4e-3b5d-4e8f-9a7b-1c2d3e4f5a6b",
            "otp_code": 4821
        }))
        .unwrap();
        assert_eq!(
            req.otp_key,
            Uuid::parse_str("6f1c2a4e-3b5d-4e8f-9a7b-1c2d3e4f5a6b").unwrap()
        );
    }

    #[test]
    fn test_update_user_validates_username() {
        let req: UpdateUserRequest =
            serde_json::from_value(serde_json::json!({"username": "new_name"})).unwrap();
        assert_eq!(req.username.as_deref(), Some("new_name"));
        assert!(req.validate().is_ok());

        let req = UpdateUserRequest {
            username: Some("two words".to_string()),
            ..Default::default()
        };
        assert_eq!(
            req.validate(),
            Err(ValidationError::new("username cannot contain whitespace"))
        );

        let req = UpdateUserRequest {
            username: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
