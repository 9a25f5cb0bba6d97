//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod otp;
pub mod rating;

pub use contact::{ContactError, Email, PhoneNumber};
pub use id::*;
pub use otp::{OtpCode, OtpPolicy, OtpPurpose, OtpRejection};
pub use rating::{AverageRating, Score, ScoreError, UNRATED_LABEL};
