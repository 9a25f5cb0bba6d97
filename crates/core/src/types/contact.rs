//! Contact details attached to a user profile.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`] or [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The input string is empty.
    #[error("{field} cannot be empty")]
    Empty {
        /// Which field was empty.
        field: &'static str,
    },
    /// Phone number has the wrong number of digits.
    #[error("phone number must have between {min} and {max} digits")]
    PhoneLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
    /// Phone number contains something other than digits (and a leading `+`).
    #[error("phone number may only contain digits and a leading '+'")]
    PhoneCharacters,
    /// Email is longer than the RFC 5321 limit.
    #[error("email must be at most {max} characters")]
    EmailTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Email is not of the form `local@domain`.
    #[error("email must look like name@domain")]
    EmailShape,
}

/// A phone number in E.164-like form: an optional leading `+` followed by
/// 7 to 15 digits.
///
/// Spaces and dashes are stripped while parsing, so `"+998 90 123-45-67"`
/// and `"+998901234567"` are the same number. Phone numbers are unique per
/// user, so normalizing before storage is what makes the uniqueness check
/// meaningful.
///
/// ```
/// use bazaar_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+998 90 123-45-67").unwrap();
/// assert_eq!(phone.as_str(), "+998901234567");
/// assert!(PhoneNumber::parse("12ab").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 7;
    /// Maximum number of digits (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains characters other than
    /// digits, spaces, dashes and a leading `+`, or has the wrong digit count.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ContactError::Empty {
                field: "phone number",
            });
        }

        let (plus, rest) = trimmed
            .strip_prefix('+')
            .map_or((false, trimmed), |rest| (true, rest));

        let mut digits = String::with_capacity(rest.len() + 1);
        if plus {
            digits.push('+');
        }
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' => {}
                _ => return Err(ContactError::PhoneCharacters),
            }
        }

        let count = digits.len() - usize::from(plus);
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&count) {
            return Err(ContactError::PhoneLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(digits))
    }

    /// Returns the normalized number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ContactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

/// An email address with a structural sanity check (`local@domain`).
///
/// Email is optional profile data here, never a login identifier, so the
/// check only rejects obviously malformed input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or not of the form
    /// `local@domain` with exactly one `@`.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Empty { field: "email" });
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ContactError::EmailTooLong {
                max: Self::MAX_LENGTH,
            });
        }

        match s.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(s.to_owned()))
            }
            _ => Err(ContactError::EmailShape),
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = ContactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_normalizes_separators() {
        let phone = PhoneNumber::parse(" +998 90-123-45-67 ").unwrap();
        assert_eq!(phone.as_str(), "+998901234567");
    }

    #[test]
    fn test_phone_without_plus() {
        let phone = PhoneNumber::parse("901234567").unwrap();
        assert_eq!(phone.as_str(), "901234567");
    }

    #[test]
    fn test_phone_rejects_letters() {
        assert_eq!(
            PhoneNumber::parse("90123abc"),
            Err(ContactError::PhoneCharacters)
        );
        assert_eq!(
            PhoneNumber::parse("+99+8901234567"),
            Err(ContactError::PhoneCharacters)
        );
    }

    #[test]
    fn test_phone_length_bounds() {
        assert!(matches!(
            PhoneNumber::parse("123456"),
            Err(ContactError::PhoneLength { .. })
        ));
        assert!(PhoneNumber::parse("1234567").is_ok());
        assert!(PhoneNumber::parse(&"9".repeat(15)).is_ok());
        assert!(matches!(
            PhoneNumber::parse(&"9".repeat(16)),
            Err(ContactError::PhoneLength { .. })
        ));
    }

    #[test]
    fn test_phone_empty() {
        assert!(matches!(
            PhoneNumber::parse("   "),
            Err(ContactError::Empty { .. })
        ));
    }

    #[test]
    fn test_phone_deserialize_validates() {
        let phone: PhoneNumber = serde_json::from_str("\"+1 555 0100 200\"").unwrap();
        assert_eq!(phone.as_str(), "+15550100200");
        assert!(serde_json::from_str::<PhoneNumber>("\"call me\"").is_err());
    }

    #[test]
    fn test_email_shapes() {
        assert!(Email::parse("user@example.com").is_ok());
        assert_eq!(Email::parse("no-at"), Err(ContactError::EmailShape));
        assert_eq!(Email::parse("@example.com"), Err(ContactError::EmailShape));
        assert_eq!(Email::parse("user@"), Err(ContactError::EmailShape));
        assert_eq!(Email::parse("a@b@c"), Err(ContactError::EmailShape));
    }

    #[test]
    fn test_email_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(ContactError::EmailTooLong { .. })
        ));
    }
}
