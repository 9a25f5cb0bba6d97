//! Product route handlers.

use axum::{Json, extract::State, http::StatusCode};

use bazaar_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, RequireAuth};
use crate::models::product::{CreateProductRequest, Product, ProductView, UpdateProductRequest};
use crate::models::query::ProductFilter;
use crate::state::AppState;

/// List products matching every supplied filter, best rated first.
///
/// GET /product?name=&price_min=&price_max=&category=&rate_min=&market=
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> Result<Json<Vec<ProductView>>> {
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// GET /product/{id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductView>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// POST /product
///
/// An unknown `market_id` is a 404.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    req.validate()?;
    let product = ProductRepository::new(state.pool()).create(&req).await?;

    tracing::info!(
        user_id = %user.id,
        product_id = %product.id,
        market_id = %product.market_id,
        "Product created"
    );
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /product/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<Json<Product>> {
    req.validate()?;
    ProductRepository::new(state.pool())
        .update(id, &req)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// DELETE /product/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(not_found(id));
    }

    tracing::info!(user_id = %user.id, product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn not_found(id: ProductId) -> AppError {
    AppError::NotFound(format!("product {id} not found"))
}
