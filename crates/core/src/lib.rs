//! Bazaar Core - Shared domain types.
//!
//! This crate provides the types shared by every Bazaar component:
//! - `api` - The JSON marketplace API server
//! - `cli` - Command-line tools for migrations, seeding, and support tasks
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. Rules that decide request outcomes (OTP expiry, rating
//! aggregation) live here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, contact details, rating scores, and the OTP policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
