//! Stored one-time passwords.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use bazaar_core::{OtpCode, OtpId, OtpPurpose, UserId};

/// An outstanding OTP (domain type).
#[derive(Debug, Clone)]
pub struct Otp {
    pub id: OtpId,
    /// User the OTP was issued to.
    pub user_id: UserId,
    /// Opaque handle returned to the client.
    pub key: Uuid,
    pub code: OtpCode,
    pub purpose: OtpPurpose,
    pub created_at: DateTime<Utc>,
}
