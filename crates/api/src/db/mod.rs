//! Database operations for the marketplace `PostgreSQL` schema.
//!
//! # Schema: `bazaar`
//!
//! ## Tables
//!
//! - `users` - Accounts (username/password login, phone verified by OTP)
//! - `addresses` - Delivery addresses, at most one primary per user
//! - `otps` - Outstanding one-time passwords (signup and password reset)
//! - `markets` - Sellers
//! - `products` - Items offered by a market
//! - `orders` / `order_items` - Purchases
//! - `ratings` - Scores attached to exactly one product or market
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` and `QueryBuilder` so
//! the crate compiles without a live database.

pub mod addresses;
pub mod markets;
pub mod orders;
pub mod otps;
pub mod products;
pub mod ratings;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use markets::MarketRepository;
pub use orders::OrderRepository;
pub use otps::OtpRepository;
pub use products::ProductRepository;
pub use ratings::RatingRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations to domain errors.
///
/// A unique violation becomes `Conflict(conflict_message)`; a foreign-key
/// violation means a referenced row does not exist and becomes `NotFound`.
pub(crate) fn map_constraint_error(e: sqlx::Error, conflict_message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict_message.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url.expose_secret()).await
}

/// Create a pool that connects on first use.
///
/// Lets the router be built and exercised before a database is reachable.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection string cannot be parsed.
pub fn create_lazy_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options()
        .min_connections(0)
        .connect_lazy(database_url.expose_secret())
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
}
