//! One-time password delivery.
//!
//! There is no SMS gateway integration: codes are written to the log, where
//! operators (and the end-to-end tests) can read them.

use bazaar_core::{OtpCode, OtpPurpose, PhoneNumber, UserId};
use rand::Rng;

/// Draw a random code of the right length for `purpose`.
#[must_use]
pub fn generate_code(purpose: OtpPurpose) -> OtpCode {
    OtpCode::new(rand::rng().random_range(purpose.code_range()))
}

/// Delivers OTP codes to users.
#[derive(Debug, Clone, Copy, Default)]
pub struct OtpSender;

impl OtpSender {
    /// Deliver `code` to the user's phone.
    pub fn send(
        &self,
        user_id: UserId,
        phone_number: Option<&PhoneNumber>,
        purpose: OtpPurpose,
        code: OtpCode,
    ) {
        tracing::info!(
            user_id = %user_id,
            phone_number = phone_number.map_or("-", PhoneNumber::as_str),
            purpose = %purpose,
            otp_code = %code,
            "OTP issued"
        );
    }
}
