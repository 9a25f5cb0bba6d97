//! One-time password rules.
//!
//! An OTP is a short numeric code bound to a user and an opaque key. The key
//! is handed to the client at issue time; the code is delivered out of band.
//! Verification needs both, and must happen within the policy TTL.
//!
//! The code check and the expiry check are evaluated independently: a correct
//! code that arrives late is still rejected.

use core::fmt;
use core::ops::RangeInclusive;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// What an OTP was issued for.
///
/// Verifying a code consumes it only for the purpose it was issued for, so a
/// password-reset code cannot be used to verify a signup and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bazaar.otp_purpose", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    /// Proves possession of a freshly registered account.
    Signup,
    /// Authorizes setting a new password without the old one.
    PasswordReset,
}

impl OtpPurpose {
    /// Range the numeric code is drawn from.
    ///
    /// Signup codes are 4 digits, password-reset codes are 6 digits.
    #[must_use]
    pub const fn code_range(self) -> RangeInclusive<u32> {
        match self {
            Self::Signup => 1_000..=9_999,
            Self::PasswordReset => 100_000..=999_999,
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signup => write!(f, "signup"),
            Self::PasswordReset => write!(f, "password_reset"),
        }
    }
}

/// A numeric OTP code.
///
/// Deserializes from either a JSON number (`4821`) or a numeric string
/// (`"4821"`), since clients send both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OtpCode(u32);

impl OtpCode {
    /// Wrap a raw code.
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Get the raw value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for OtpCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s
                .trim()
                .parse::<u32>()
                .map(Self)
                .map_err(|_| serde::de::Error::custom("otp code must be numeric")),
        }
    }
}

/// Why an OTP was rejected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpRejection {
    /// The submitted code does not match the stored one.
    #[error("invalid code")]
    CodeMismatch,
    /// The code is older than the policy TTL.
    #[error("code has expired, request a new one")]
    Expired,
}

/// Time window in which an issued OTP may be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    ttl: TimeDelta,
}

impl OtpPolicy {
    /// Default validity window in seconds.
    pub const DEFAULT_TTL_SECONDS: i64 = 60;

    /// Create a policy with the given validity window.
    #[must_use]
    pub const fn new(ttl: TimeDelta) -> Self {
        Self { ttl }
    }

    /// Validity window.
    #[must_use]
    pub const fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Returns true if an OTP created at `created_at` is past its window at `now`.
    ///
    /// Exactly `ttl` after creation is still valid.
    #[must_use]
    pub fn is_expired(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(created_at) > self.ttl
    }

    /// Decide whether `submitted` redeems an OTP with code `stored` created at
    /// `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`OtpRejection::CodeMismatch`] if the codes differ and
    /// [`OtpRejection::Expired`] if the window has passed.
    pub fn check(
        &self,
        stored: OtpCode,
        submitted: OtpCode,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), OtpRejection> {
        if stored != submitted {
            return Err(OtpRejection::CodeMismatch);
        }
        if self.is_expired(created_at, now) {
            return Err(OtpRejection::Expired);
        }
        Ok(())
    }
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(Self::DEFAULT_TTL_SECONDS))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_correct_code_within_window() {
        let policy = OtpPolicy::default();
        let code = OtpCode::new(4821);
        assert_eq!(policy.check(code, code, at(0), at(30)), Ok(()));
    }

    #[test]
    fn test_correct_code_at_exact_boundary() {
        let policy = OtpPolicy::default();
        let code = OtpCode::new(4821);
        assert_eq!(policy.check(code, code, at(0), at(60)), Ok(()));
    }

    #[test]
    fn test_correct_code_after_window_is_rejected() {
        let policy = OtpPolicy::default();
        let code = OtpCode::new(4821);
        assert_eq!(
            policy.check(code, code, at(0), at(61)),
            Err(OtpRejection::Expired)
        );
    }

    #[test]
    fn test_wrong_code_within_window_is_rejected() {
        let policy = OtpPolicy::default();
        assert_eq!(
            policy.check(OtpCode::new(4821), OtpCode::new(4822), at(0), at(5)),
            Err(OtpRejection::CodeMismatch)
        );
    }

    #[test]
    fn test_wrong_code_after_window_is_rejected() {
        let policy = OtpPolicy::default();
        assert!(
            policy
                .check(OtpCode::new(4821), OtpCode::new(1111), at(0), at(600))
                .is_err()
        );
    }

    #[test]
    fn test_custom_ttl() {
        let policy = OtpPolicy::new(TimeDelta::seconds(300));
        assert!(!policy.is_expired(at(0), at(299)));
        assert!(policy.is_expired(at(0), at(301)));
    }

    #[test]
    fn test_clock_skew_counts_as_fresh() {
        let policy = OtpPolicy::default();
        assert!(!policy.is_expired(at(10), at(0)));
    }

    #[test]
    fn test_code_deserializes_from_number_or_string() {
        let from_number: OtpCode = serde_json::from_str("4821").unwrap();
        let from_string: OtpCode = serde_json::from_str("\"4821\"").unwrap();
        assert_eq!(from_number, from_string);
        assert!(serde_json::from_str::<OtpCode>("\"48a1\"").is_err());
    }

    #[test]
    fn test_code_ranges() {
        assert_eq!(OtpPurpose::Signup.code_range(), 1_000..=9_999);
        assert_eq!(OtpPurpose::PasswordReset.code_range(), 100_000..=999_999);
    }
}
