//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Signup, OTP verification, login, password change and reset
//! - `orders` - Order placement and expansion into full order views
//! - `sms` - OTP code generation and delivery
//! - `tokens` - Access/refresh token issuing and verification

pub mod auth;
pub mod orders;
pub mod sms;
pub mod tokens;
