//! Orders and order items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{AddressId, MarketId, OrderId, OrderItemId, ProductId, UserId};

use super::ValidationError;
use super::address::Address;
use super::market::MarketView;
use super::product::ProductView;

/// Quantity used when an order is placed without one.
pub const DEFAULT_QUANTITY: i32 = 1;

/// An order row (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub market_id: MarketId,
    pub address_id: AddressId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item on an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    /// `None` for legacy rows; new items always carry a quantity.
    pub quantity: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order with its referenced rows expanded.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub product: ProductView,
    pub market: MarketView,
    pub address: Address,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(alias = "product")]
    pub product_id: ProductId,
    #[serde(alias = "market")]
    pub market_id: MarketId,
    #[serde(alias = "address")]
    pub address_id: AddressId,
    pub quantity: Option<i32>,
}

impl CreateOrderRequest {
    /// Quantity to record on the item, defaulting to one.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if an explicit quantity is below one.
    pub fn quantity(&self) -> Result<i32, ValidationError> {
        let quantity = self.quantity.unwrap_or(DEFAULT_QUANTITY);
        validate_quantity(quantity)?;
        Ok(quantity)
    }
}

/// Partial order update; absent references are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderRequest {
    #[serde(alias = "product")]
    pub product_id: Option<ProductId>,
    #[serde(alias = "market")]
    pub market_id: Option<MarketId>,
    #[serde(alias = "address")]
    pub address_id: Option<AddressId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderItemRequest {
    pub quantity: i32,
}

impl UpdateOrderItemRequest {
    /// # Errors
    ///
    /// Returns `ValidationError` if the quantity is below one.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_quantity(self.quantity)
    }
}

fn validate_quantity(quantity: i32) -> Result<(), ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::new("quantity must be at least 1"));
    }
    Ok(())
}
