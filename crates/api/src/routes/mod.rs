//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness
//! GET    /health/ready                 - Readiness (database)
//!
//! # Users (rate limited unless marked *)
//! POST   /user/signup                  - Create unverified user, issue signup OTP
//! POST   /user/resend-otp              - Reissue signup OTP
//! POST   /user/verify-otp              - Redeem signup OTP
//! POST   /user/login                   - Access + refresh tokens
//! POST   /user/token/refresh           - New access token
//! POST   /user/reset-password          - Issue password-reset OTP
//! POST   /user/reset-password/confirm  - Redeem reset OTP, set password
//! GET    /user/me                      * Current user
//! PATCH  /user/update-user             * Profile update
//! PATCH  /user/update-password         * Password change
//!
//! # Addresses (auth)
//! GET    /user/address                 - List own
//! POST   /user/address                 - Create
//! PATCH  /user/address/{id}            - Update own
//! DELETE /user/address/{id}            - Delete own
//!
//! # Catalog (writes need auth)
//! GET    /market                       - List with rating (?name=)
//! POST   /market                       - Create
//! GET    /market/{id}                  - Detail with rating
//! PATCH  /market/{id}                  - Update
//! DELETE /market/{id}                  - Delete
//! GET    /product                      - Filtered list with rating
//! POST   /product                      - Create
//! GET    /product/{id}                 - Detail with rating
//! PATCH  /product/{id}                 - Update
//! DELETE /product/{id}                 - Delete
//!
//! # Orders (auth, own only)
//! GET    /order                        - List, newest first
//! POST   /order                        - Place order + item
//! GET    /order/{id}                   - Detail
//! PATCH  /order/{id}                   - Repoint product/market/address
//! DELETE /order/{id}                   - Delete
//! PATCH  /order/item/{id}              - Change item quantity
//! DELETE /order/item/{id}              - Delete item
//!
//! # Ratings (writes need auth, edits author only)
//! GET    /rate                         - List (?product=&market=)
//! POST   /rate                         - Create
//! GET    /rate/{id}                    - Detail
//! PATCH  /rate/{id}                    - Update own
//! DELETE /rate/{id}                    - Delete own
//! ```

pub mod addresses;
pub mod health;
pub mod markets;
pub mod orders;
pub mod products;
pub mod ratings;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{auth_rate_limiter, rate_limited_as_json};
use crate::state::AppState;

/// Create the user, auth, and address routes router.
pub fn user_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/signup", post(users::signup))
        .route("/resend-otp", post(users::resend_otp))
        .route("/verify-otp", post(users::verify_otp))
        .route("/login", post(users::login))
        .route("/token/refresh", post(users::refresh_token))
        .route("/reset-password", post(users::reset_password))
        .route(
            "/reset-password/confirm",
            post(users::reset_password_confirm),
        )
        .layer(auth_rate_limiter())
        .layer(axum::middleware::map_response(rate_limited_as_json));

    Router::new()
        .route("/me", get(users::me))
        .route("/update-user", patch(users::update_user))
        .route("/update-password", patch(users::update_password))
        .route("/address", get(addresses::index).post(addresses::create))
        .route(
            "/address/{id}",
            patch(addresses::update).delete(addresses::delete),
        )
        .merge(public)
}

/// Create the market routes router.
pub fn market_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(markets::index).post(markets::create))
        .route(
            "/{id}",
            get(markets::show)
                .patch(markets::update)
                .delete(markets::delete),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route(
            "/{id}",
            get(orders::show).patch(orders::update).delete(orders::delete),
        )
        .route(
            "/item/{id}",
            patch(orders::update_item).delete(orders::delete_item),
        )
}

/// Create the rating routes router.
pub fn rating_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(ratings::index).post(ratings::create))
        .route(
            "/{id}",
            get(ratings::show)
                .patch(ratings::update)
                .delete(ratings::delete),
        )
}

/// Build the complete router for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/user", user_routes())
        .nest("/market", market_routes())
        .nest("/product", product_routes())
        .nest("/order", order_routes())
        .nest("/rate", rating_routes())
}
