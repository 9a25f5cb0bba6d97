//! Market route handlers.

use axum::{Json, extract::State, http::StatusCode};

use bazaar_core::MarketId;

use crate::db::MarketRepository;
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, RequireAuth};
use crate::models::market::{CreateMarketRequest, Market, MarketView, UpdateMarketRequest};
use crate::models::query::MarketFilter;
use crate::state::AppState;

/// List markets, best rated first.
///
/// GET /market?name=
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<MarketFilter>,
) -> Result<Json<Vec<MarketView>>> {
    let markets = MarketRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(markets))
}

/// GET /market/{id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MarketId>,
) -> Result<Json<MarketView>> {
    MarketRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// POST /market
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<CreateMarketRequest>,
) -> Result<(StatusCode, Json<Market>)> {
    req.validate()?;
    let market = MarketRepository::new(state.pool()).create(&req).await?;

    tracing::info!(user_id = %user.id, market_id = %market.id, "Market created");
    Ok((StatusCode::CREATED, Json(market)))
}

/// PATCH /market/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    ApiPath(id): ApiPath<MarketId>,
    ApiJson(req): ApiJson<UpdateMarketRequest>,
) -> Result<Json<Market>> {
    req.validate()?;
    MarketRepository::new(state.pool())
        .update(id, &req)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// DELETE /market/{id}
///
/// Products, orders, and ratings of the market go with it.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<MarketId>,
) -> Result<StatusCode> {
    if !MarketRepository::new(state.pool()).delete(id).await? {
        return Err(not_found(id));
    }

    tracing::info!(user_id = %user.id, market_id = %id, "Market deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn not_found(id: MarketId) -> AppError {
    AppError::NotFound(format!("market {id} not found"))
}
