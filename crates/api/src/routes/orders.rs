//! Order route handlers. Callers only ever see their own orders.

use axum::{Json, extract::State, http::StatusCode};

use bazaar_core::{OrderId, OrderItemId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, ApiPath, RequireAuth};
use crate::models::order::{
    CreateOrderRequest, OrderItem, OrderView, UpdateOrderItemRequest, UpdateOrderRequest,
};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Place an order for one product.
///
/// POST /order
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let quantity = req.quantity()?;
    let order = OrderService::new(state.pool())
        .place(user.id, &req, quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /order
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderService::new(state.pool()).list(user.id).await?;
    Ok(Json(orders))
}

/// GET /order/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderView>> {
    OrderService::new(state.pool())
        .get(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| order_not_found(id))
}

/// Repoint an order at a different product, market, or address.
///
/// PATCH /order/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(req): ApiJson<UpdateOrderRequest>,
) -> Result<Json<OrderView>> {
    OrderService::new(state.pool())
        .update(user.id, id, &req)
        .await?
        .map(Json)
        .ok_or_else(|| order_not_found(id))
}

/// DELETE /order/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<StatusCode> {
    if !OrderRepository::new(state.pool()).delete(id, user.id).await? {
        return Err(order_not_found(id));
    }

    tracing::info!(user_id = %user.id, order_id = %id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /order/item/{id}
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderItemId>,
    ApiJson(req): ApiJson<UpdateOrderItemRequest>,
) -> Result<Json<OrderItem>> {
    req.validate()?;
    OrderRepository::new(state.pool())
        .update_item_quantity(id, user.id, req.quantity)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found(id))
}

/// DELETE /order/item/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderItemId>,
) -> Result<StatusCode> {
    if OrderRepository::new(state.pool())
        .delete_item(id, user.id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(item_not_found(id))
    }
}

fn order_not_found(id: OrderId) -> AppError {
    AppError::NotFound(format!("order {id} not found"))
}

fn item_not_found(id: OrderItemId) -> AppError {
    AppError::NotFound(format!("order item {id} not found"))
}
