//! Order repository.
//!
//! Orders are only ever read or written on behalf of their owner, so every
//! query filters on `user_id`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{AddressId, MarketId, OrderId, OrderItemId, ProductId, UserId};

use super::{RepositoryError, map_constraint_error};
use crate::models::order::{Order, OrderItem, UpdateOrderRequest};

const ORDER_COLUMNS: &str = "id, user_id, product_id, market_id, address_id, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    market_id: i32,
    address_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Self {
            id: OrderId::new(r.id),
            user_id: UserId::new(r.user_id),
            product_id: ProductId::new(r.product_id),
            market_id: MarketId::new(r.market_id),
            address_id: AddressId::new(r.address_id),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(r: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(r.id),
            order_id: OrderId::new(r.order_id),
            product_id: ProductId::new(r.product_id),
            quantity: r.quantity,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Fields needed to place an order.
#[derive(Debug, Clone, Copy)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub market_id: MarketId,
    pub address_id: AddressId,
    pub quantity: i32,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order and its single item in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address isn't the user's or
    /// the product or market doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        new_order: NewOrder,
    ) -> Result<(Order, OrderItem), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Selecting the address by owner makes a foreign address insert nothing.
        let order = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO bazaar.orders (user_id, product_id, market_id, address_id)
            SELECT $1, $2, $3, a.id
            FROM bazaar.addresses a
            WHERE a.id = $4 AND a.user_id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(new_order.product_id)
        .bind(new_order.market_id)
        .bind(new_order.address_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "order already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        let item = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            INSERT INTO bazaar.order_items (order_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(order.id)
        .bind(order.product_id)
        .bind(new_order.quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((order.into(), item.into()))
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM bazaar.orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Get one of a user's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM bazaar.orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Get the items of the given orders, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_for_orders(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let ids: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();

        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM bazaar.order_items
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            "
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    /// Repoint one of a user's orders at a different product, market, or address.
    ///
    /// Returns `None` if the order isn't the user's, or if a new address is
    /// given that isn't the user's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a new product or market doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: OrderId,
        user_id: UserId,
        req: &UpdateOrderRequest,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE bazaar.orders
            SET product_id = COALESCE($3, product_id),
                market_id = COALESCE($4, market_id),
                address_id = COALESCE($5, address_id),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
              AND ($5::INTEGER IS NULL OR EXISTS (
                  SELECT 1 FROM bazaar.addresses a WHERE a.id = $5 AND a.user_id = $2
              ))
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .bind(req.product_id)
        .bind(req.market_id)
        .bind(req.address_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "order already exists"))?;

        Ok(row.map(Order::from))
    }

    /// Delete one of a user's orders (and its items).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: OrderId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM bazaar.orders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set the quantity of an item on one of a user's orders.
    ///
    /// Returns `None` if the item doesn't exist or its order isn't the user's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_item_quantity(
        &self,
        item_id: OrderItemId,
        user_id: UserId,
        quantity: i32,
    ) -> Result<Option<OrderItem>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderItemRow>(
            r"
            UPDATE bazaar.order_items i
            SET quantity = $3, updated_at = NOW()
            FROM bazaar.orders o
            WHERE i.id = $1 AND i.order_id = o.id AND o.user_id = $2
            RETURNING i.id, i.order_id, i.product_id, i.quantity, i.created_at, i.updated_at
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(OrderItem::from))
    }

    /// Delete an item from one of a user's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_item(
        &self,
        item_id: OrderItemId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM bazaar.order_items i
            USING bazaar.orders o
            WHERE i.id = $1 AND i.order_id = o.id AND o.user_id = $2
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
