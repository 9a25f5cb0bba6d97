//! End-to-end marketplace flow over HTTP.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`bazaar-cli migrate`)
//! - The API running (`cargo run -p bazaar-api`)
//! - `BAZAAR_DATABASE_URL` (or `DATABASE_URL`) pointing at the same database,
//!   used to read OTP codes that would otherwise go out by SMS
//!
//! Run with: `cargo test -p bazaar-integration-tests -- --ignored`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use bazaar_integration_tests::api_base_url;

/// Retries allowed when the auth rate limiter pushes back.
const RATE_LIMIT_RETRIES: usize = 5;

async fn db_pool() -> PgPool {
    let url = std::env::var("BAZAAR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("BAZAAR_DATABASE_URL or DATABASE_URL must be set");
    PgPool::connect(&url).await.expect("Failed to connect to database")
}

fn url(path: &str) -> String {
    format!("{}{path}", api_base_url())
}

/// Send a request, waiting out 429s from the auth rate limiter.
async fn send(build: impl Fn() -> RequestBuilder) -> Response {
    for _ in 0..RATE_LIMIT_RETRIES {
        let response = build().send().await.expect("request failed");
        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return response;
        }
        let wait = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(6);
        tokio::time::sleep(Duration::from_secs(wait)).await;
    }
    panic!("still rate limited after {RATE_LIMIT_RETRIES} attempts");
}

async fn json_of(response: Response) -> Value {
    response.json().await.expect("response body was not JSON")
}

/// A unique username and phone number per call.
fn fresh_identity() -> (String, String) {
    let id = Uuid::new_v4();
    let digits = id.as_u128() % 10_000_000_000;
    (
        format!("user_{}", &id.simple().to_string()[..12]),
        format!("+1{digits:010}"),
    )
}

async fn otp_code(pool: &PgPool, key: &str) -> i32 {
    sqlx::query_scalar("SELECT code FROM bazaar.otps WHERE key = $1::uuid")
        .bind(key)
        .fetch_one(pool)
        .await
        .expect("OTP not found")
}

/// Sign up, verify, and log in a new user; returns (username, access token).
async fn register_verified(client: &Client, pool: &PgPool) -> (String, String) {
    let (username, phone) = fresh_identity();
    let password = "correct horse battery";

    let res = send(|| {
        client.post(url("/user/signup")).json(&json!({
            "username": username,
            "password": password,
            "phone_number": phone,
        }))
    })
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let otp_key = json_of(res).await["otp_key"].as_str().unwrap().to_string();

    let code = otp_code(pool, &otp_key).await;
    let res = send(|| {
        client
            .post(url("/user/verify-otp"))
            .json(&json!({"otp_key": otp_key, "otp_code": code}))
    })
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(|| {
        client
            .post(url("/user/login"))
            .json(&json!({"username": username, "password": password}))
    })
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let access = json_of(res).await["access"].as_str().unwrap().to_string();

    (username, access)
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn signup_requires_verification_before_login() {
    let client = Client::new();
    let pool = db_pool().await;
    let (username, phone) = fresh_identity();

    let res = send(|| {
        client.post(url("/user/signup")).json(&json!({
            "username": username,
            "password": "correct horse battery",
            "phone_number": phone,
        }))
    })
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let otp_key = json_of(res).await["otp_key"].as_str().unwrap().to_string();

    // Unverified accounts cannot log in.
    let res = send(|| {
        client.post(url("/user/login")).json(&json!({
            "username": username,
            "password": "correct horse battery",
        }))
    })
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Same username again is a 400.
    let res = send(|| {
        client.post(url("/user/signup")).json(&json!({
            "username": username,
            "password": "correct horse battery",
            "phone_number": "+19995550000",
        }))
    })
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // A wrong code is rejected and the OTP survives for a retry.
    let code = otp_code(&pool, &otp_key).await;
    let wrong = if code == 9999 { 1000 } else { code + 1 };
    let res = send(|| {
        client
            .post(url("/user/verify-otp"))
            .json(&json!({"otp_key": otp_key, "otp_code": wrong}))
    })
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = send(|| {
        client
            .post(url("/user/verify-otp"))
            .json(&json!({"otp_key": otp_key, "otp_code": code.to_string()}))
    })
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    // The OTP is consumed.
    let res = send(|| {
        client
            .post(url("/user/verify-otp"))
            .json(&json!({"otp_key": otp_key, "otp_code": code}))
    })
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn order_and_rating_flow() {
    let client = Client::new();
    let pool = db_pool().await;
    let (username, access) = register_verified(&client, &pool).await;
    let (_, other_access) = register_verified(&client, &pool).await;

    let res = client
        .get(url("/user/me"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_of(res).await["data"]["username"], json!(username));

    // Address
    let res = client
        .post(url("/user/address"))
        .bearer_auth(&access)
        .json(&json!({
            "street": "12 Mill Lane",
            "location": {"latitude": 35.7, "longitude": 51.4},
            "is_primary": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let address_id = json_of(res).await["id"].as_i64().unwrap();

    // Catalog
    let res = client
        .post(url("/market"))
        .bearer_auth(&access)
        .json(&json!({"name": "Corner Bakery", "location": "Mill Lane"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let market_id = json_of(res).await["id"].as_i64().unwrap();

    let res = client
        .post(url("/product"))
        .bearer_auth(&access)
        .json(&json!({
            "market": market_id,
            "name": "Sourdough",
            "category": "Bakery",
            "price": 1500,
            "available": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let product_id = json_of(res).await["id"].as_i64().unwrap();

    let res = client
        .get(url(&format!("/product/{product_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(res).await["rating"], json!("not yet rated"));

    // Another user cannot order to this address.
    let order_body = json!({
        "product_id": product_id,
        "market_id": market_id,
        "address_id": address_id,
        "quantity": 3
    });
    let res = client
        .post(url("/order"))
        .bearer_auth(&other_access)
        .json(&order_body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(url("/order"))
        .bearer_auth(&access)
        .json(&order_body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order = json_of(res).await;
    assert_eq!(order["product"]["id"], json!(product_id));
    assert_eq!(order["address"]["id"], json!(address_id));
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], json!(3));
    assert_eq!(items[0]["product_id"], json!(product_id));

    let res = client
        .get(url("/order"))
        .bearer_auth(&other_access)
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(res).await, json!([]));

    // Ratings
    let mut rating_ids = Vec::new();
    for score in [4, 5] {
        let res = client
            .post(url("/rate"))
            .bearer_auth(&access)
            .json(&json!({"product": product_id, "score": score, "message": "good bread"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        rating_ids.push(json_of(res).await["id"].as_i64().unwrap());
    }

    let res = client
        .get(url(&format!("/product/{product_id}")))
        .send()
        .await
        .unwrap();
    let product = json_of(res).await;
    assert_eq!(product["rating"], json!(4.5));
    assert_eq!(product["rating_count"], json!(2));

    // Filters
    let res = client
        .get(url(&format!(
            "/product?category=bakery&price_min=1000&market={market_id}&rate_min="
        )))
        .send()
        .await
        .unwrap();
    let listed = json_of(res).await;
    let listed = listed.as_array().unwrap();
    assert!(listed.iter().any(|p| p["id"] == json!(product_id)));
    assert!(listed.iter().all(|p| p["price"].as_i64().unwrap() >= 1000));

    // Only the author may change a rating.
    let rating_path = url(&format!("/rate/{}", rating_ids[0]));
    let res = client
        .patch(&rating_path)
        .bearer_auth(&other_access)
        .json(&json!({"score": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(&rating_path)
        .bearer_auth(&other_access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.get(&rating_path).send().await.unwrap();
    assert_eq!(json_of(res).await["score"], json!(4.0));

    let res = client
        .delete(&rating_path)
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Cleanup cascades to products, orders, and remaining ratings.
    let res = client
        .delete(url(&format!("/market/{market_id}")))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

async fn create_market(client: &Client, access: &str, name: &str) -> i64 {
    let res = client
        .post(url("/market"))
        .bearer_auth(access)
        .json(&json!({"name": name}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    json_of(res).await["id"].as_i64().unwrap()
}

async fn create_product(
    client: &Client,
    access: &str,
    market_id: i64,
    name: &str,
    category: &str,
    price: i64,
) -> i64 {
    let res = client
        .post(url("/product"))
        .bearer_auth(access)
        .json(&json!({
            "market": market_id,
            "name": name,
            "category": category,
            "price": price,
            "available": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    json_of(res).await["id"].as_i64().unwrap()
}

async fn rate_product(client: &Client, access: &str, product_id: i64, score: u8) {
    let res = client
        .post(url("/rate"))
        .bearer_auth(access)
        .json(&json!({"product": product_id, "score": score}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

async fn listed_product_ids(client: &Client, query: &str) -> Vec<i64> {
    let res = client
        .get(url(&format!("/product?{query}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    json_of(res)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn expired_signup_code_leaves_account_unverified() {
    let client = Client::new();
    let pool = db_pool().await;
    let (username, phone) = fresh_identity();

    let res = send(|| {
        client.post(url("/user/signup")).json(&json!({
            "username": username,
            "password": "correct horse battery",
            "phone_number": phone,
        }))
    })
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let otp_key = json_of(res).await["otp_key"].as_str().unwrap().to_string();
    let code = otp_code(&pool, &otp_key).await;

    sqlx::query(
        "UPDATE bazaar.otps SET created_at = NOW() - INTERVAL '61 seconds' WHERE key = $1::uuid",
    )
    .bind(&otp_key)
    .execute(&pool)
    .await
    .unwrap();

    // Correct code, but too late.
    let res = send(|| {
        client
            .post(url("/user/verify-otp"))
            .json(&json!({"otp_key": otp_key, "otp_code": code}))
    })
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = send(|| {
        client.post(url("/user/login")).json(&json!({
            "username": username,
            "password": "correct horse battery",
        }))
    })
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM bazaar.otps WHERE key = $1::uuid")
            .bind(&otp_key)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(remaining, 1);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn signup_without_phone_number() {
    let client = Client::new();
    let pool = db_pool().await;
    let (username, _) = fresh_identity();

    let res = send(|| {
        client.post(url("/user/signup")).json(&json!({
            "username": username,
            "password": "correct horse battery",
        }))
    })
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let otp_key = json_of(res).await["otp_key"].as_str().unwrap().to_string();

    // Older clients send the key as `key`.
    let code = otp_code(&pool, &otp_key).await;
    let res = send(|| {
        client
            .post(url("/user/verify-otp"))
            .json(&json!({"key": otp_key, "otp_code": code}))
    })
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(|| {
        client.post(url("/user/login")).json(&json!({
            "username": username,
            "password": "correct horse battery",
        }))
    })
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let access = json_of(res).await["access"].as_str().unwrap().to_string();

    let res = client
        .get(url("/user/me"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(res).await["data"]["phone_number"], Value::Null);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn username_can_be_changed_but_not_to_a_taken_one() {
    let client = Client::new();
    let pool = db_pool().await;
    let (taken, _) = register_verified(&client, &pool).await;
    let (_, access) = register_verified(&client, &pool).await;
    let (renamed, _) = fresh_identity();

    let res = client
        .patch(url("/user/update-user"))
        .bearer_auth(&access)
        .json(&json!({"username": renamed}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_of(res).await["data"]["username"], json!(renamed));

    let res = client
        .patch(url("/user/update-user"))
        .bearer_auth(&access)
        .json(&json!({"username": taken}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_of(res).await["error"], json!("username already taken"));

    let res = client
        .get(url("/user/me"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(json_of(res).await["data"]["username"], json!(renamed));
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn concurrent_primary_addresses_leave_one_primary() {
    let client = Client::new();
    let pool = db_pool().await;
    let (_, access) = register_verified(&client, &pool).await;

    let create = |street: &'static str| {
        client
            .post(url("/user/address"))
            .bearer_auth(&access)
            .json(&json!({
                "street": street,
                "location": {"latitude": 41.3, "longitude": 69.2},
                "is_primary": true
            }))
            .send()
    };
    let (first, second) = tokio::join!(create("1 North Row"), create("2 South Row"));

    for res in [first.unwrap(), second.unwrap()] {
        assert!(
            matches!(res.status(), StatusCode::CREATED | StatusCode::BAD_REQUEST),
            "unexpected status {}",
            res.status()
        );
    }

    let res = client
        .get(url("/user/address"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    let addresses = json_of(res).await;
    let primaries = addresses
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["is_primary"] == json!(true))
        .count();
    assert_eq!(primaries, 1);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn product_filters_exclude_non_matching_rows() {
    let client = Client::new();
    let pool = db_pool().await;
    let (_, access) = register_verified(&client, &pool).await;
    let market_id = create_market(&client, &access, "Filter Market").await;

    let matching = create_product(&client, &access, market_id, "Rye", "Bakery", 1500).await;
    let cheap = create_product(&client, &access, market_id, "Bun", "bakery", 500).await;
    let pricey = create_product(&client, &access, market_id, "Kettle", "Kitchen", 5000).await;

    let ids = listed_product_ids(
        &client,
        &format!("category=bakery&price_min=1000&market={market_id}"),
    )
    .await;
    assert_eq!(ids, vec![matching]);
    assert!(!ids.contains(&cheap));
    assert!(!ids.contains(&pricey));

    // Without filters all three come back.
    let ids = listed_product_ids(&client, &format!("market={market_id}")).await;
    assert_eq!(ids.len(), 3);

    let res = client
        .delete(url(&format!("/market/{market_id}")))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn product_listing_orders_by_mean_then_count() {
    let client = Client::new();
    let pool = db_pool().await;
    let (_, access) = register_verified(&client, &pool).await;
    let market_id = create_market(&client, &access, "Ordering Market").await;

    let unrated = create_product(&client, &access, market_id, "Plain", "misc", 100).await;
    let fewer = create_product(&client, &access, market_id, "Fewer", "misc", 100).await;
    let more = create_product(&client, &access, market_id, "More", "misc", 100).await;
    let best = create_product(&client, &access, market_id, "Best", "misc", 100).await;

    rate_product(&client, &access, fewer, 4).await;
    rate_product(&client, &access, more, 4).await;
    rate_product(&client, &access, more, 4).await;
    rate_product(&client, &access, best, 5).await;

    let ids = listed_product_ids(&client, &format!("market={market_id}")).await;
    assert_eq!(ids, vec![best, more, fewer, unrated]);

    // rate_min never matches unrated products.
    let ids = listed_product_ids(&client, &format!("market={market_id}&rate_min=4")).await;
    assert_eq!(ids, vec![best, more, fewer]);

    let res = client
        .delete(url(&format!("/market/{market_id}")))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}
