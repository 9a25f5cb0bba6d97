//! In-process router tests.
//!
//! Every request here is rejected before a handler queries the database, so
//! the lazily connected pool never opens a connection.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use secrecy::SecretString;
use serde_json::json;

use bazaar_api::config::BazaarConfig;
use bazaar_api::services::tokens::{TokenKind, TokenService};
use bazaar_integration_tests::{
    empty_request, json_request, send, test_app, test_state, token_for,
};

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn health_is_ok_and_tagged_with_request_id() {
    let state = test_state();
    let res = send(&test_app(&state), empty_request("GET", "/health", None)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!("ok"));
    assert!(res.request_id.is_some());
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn protected_route_without_token_is_401() {
    let state = test_state();
    let res = send(&test_app(&state), empty_request("GET", "/user/me", None)).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error(), "authentication credentials were not provided");
}

#[tokio::test]
async fn garbage_token_is_401() {
    let state = test_state();
    let res = send(
        &test_app(&state),
        empty_request("GET", "/order", Some("not.a.jwt")),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error(), "invalid or expired token");
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let state = test_state();
    let refresh = token_for(&state, 1, TokenKind::Refresh);
    let res = send(
        &test_app(&state),
        empty_request("GET", "/user/address", Some(&refresh)),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_401() {
    let state = test_state();
    let other = BazaarConfig::new(
        SecretString::from("postgres://unused"),
        SecretString::from("a-completely-different-signing-secret-0193"),
    );
    let forged = TokenService::new(&other.jwt)
        .issue(bazaar_core::UserId::new(1), "mallory", TokenKind::Access)
        .unwrap();

    let res = send(
        &test_app(&state),
        json_request("POST", "/market", Some(&forged), &json!({"name": "Stall"})),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn writes_require_auth_even_with_bad_bodies() {
    let state = test_state();
    let res = send(
        &test_app(&state),
        json_request("POST", "/rate", None, &json!({"score": 99})),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn signup_with_short_password_is_400() {
    let state = test_state();
    let res = send(
        &test_app(&state),
        json_request(
            "POST",
            "/user/signup",
            None,
            &json!({
                "username": "baker",
                "password": "short",
                "phone_number": "+15555550123"
            }),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "password must be at least 8 characters");
}

#[tokio::test]
async fn signup_with_bad_phone_is_400() {
    let state = test_state();
    let res = send(
        &test_app(&state),
        json_request(
            "POST",
            "/user/signup",
            None,
            &json!({
                "username": "baker",
                "password": "long enough password",
                "phone_number": "call me maybe"
            }),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(!res.error().is_empty());
}

#[tokio::test]
async fn malformed_json_is_400_in_error_shape() {
    let state = test_state();
    let request = Request::builder()
        .method("POST")
        .uri("/user/login")
        .header("content-type", "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let res = send(&test_app(&state), request).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(!res.error().is_empty());
}

#[tokio::test]
async fn order_quantity_below_one_is_400() {
    let state = test_state();
    let access = token_for(&state, 1, TokenKind::Access);
    let res = send(
        &test_app(&state),
        json_request(
            "POST",
            "/order",
            Some(&access),
            &json!({"product_id": 7, "market_id": 2, "address_id": 5, "quantity": 0}),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_item_quantity_below_one_is_400() {
    let state = test_state();
    let access = token_for(&state, 1, TokenKind::Access);
    let res = send(
        &test_app(&state),
        json_request(
            "PATCH",
            "/order/item/3",
            Some(&access),
            &json!({"quantity": -2}),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rating_score_out_of_range_is_400() {
    let state = test_state();
    let access = token_for(&state, 1, TokenKind::Access);
    let res = send(
        &test_app(&state),
        json_request(
            "POST",
            "/rate",
            Some(&access),
            &json!({"product_id": 7, "score": 7}),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rating_with_two_targets_is_400() {
    let state = test_state();
    let access = token_for(&state, 1, TokenKind::Access);
    let res = send(
        &test_app(&state),
        json_request(
            "POST",
            "/rate",
            Some(&access),
            &json!({"product": 7, "market": 2, "score": 4}),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.error(),
        "a rating must target either a product or a market, not both"
    );
}

#[tokio::test]
async fn address_with_bad_latitude_is_400() {
    let state = test_state();
    let access = token_for(&state, 1, TokenKind::Access);
    let res = send(
        &test_app(&state),
        json_request(
            "POST",
            "/user/address",
            Some(&access),
            &json!({
                "street": "12 Mill Lane",
                "location": {"latitude": 120.0, "longitude": 10.0}
            }),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "latitude must be between -90 and 90");
}

#[tokio::test]
async fn non_numeric_query_filter_is_400() {
    let state = test_state();
    let res = send(
        &test_app(&state),
        empty_request("GET", "/product?category=bakery&price_min=cheap", None),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_numeric_path_id_is_400() {
    let state = test_state();
    let res = send(&test_app(&state), empty_request("GET", "/market/abc", None)).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let state = test_state();
    let res = send(&test_app(&state), empty_request("GET", "/nope", None)).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
