//! Order placement and the expanded order representation.

use std::collections::HashMap;

use sqlx::PgPool;

use bazaar_core::{OrderId, UserId};

use crate::db::orders::NewOrder;
use crate::db::{
    AddressRepository, MarketRepository, OrderRepository, ProductRepository, RepositoryError,
};
use crate::models::order::{CreateOrderRequest, Order, OrderItem, OrderView, UpdateOrderRequest};

/// Places orders and expands them into [`OrderView`]s.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
    markets: MarketRepository<'a>,
    addresses: AddressRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
            markets: MarketRepository::new(pool),
            addresses: AddressRepository::new(pool),
        }
    }

    /// Place an order with a single item.
    ///
    /// `quantity` must already be validated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address isn't the user's or
    /// the product or market doesn't exist.
    pub async fn place(
        &self,
        user_id: UserId,
        req: &CreateOrderRequest,
        quantity: i32,
    ) -> Result<OrderView, RepositoryError> {
        let (order, item) = self
            .orders
            .create(
                user_id,
                NewOrder {
                    product_id: req.product_id,
                    market_id: req.market_id,
                    address_id: req.address_id,
                    quantity,
                },
            )
            .await?;

        tracing::info!(
            user_id = %user_id,
            order_id = %order.id,
            product_id = %order.product_id,
            quantity,
            "Order placed"
        );

        self.expand(order, vec![item]).await
    }

    /// List the user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<OrderView>, RepositoryError> {
        let orders = self.orders.list_for_user(user_id).await?;
        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();

        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in self.orders.items_for_orders(&ids).await? {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            views.push(self.expand(order, items).await?);
        }
        Ok(views)
    }

    /// Get one of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<OrderView>, RepositoryError> {
        let Some(order) = self.orders.get_for_user(id, user_id).await? else {
            return Ok(None);
        };
        let items = self.orders.items_for_orders(&[order.id]).await?;
        self.expand(order, items).await.map(Some)
    }

    /// Repoint one of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a new product or market doesn't exist.
    pub async fn update(
        &self,
        user_id: UserId,
        id: OrderId,
        req: &UpdateOrderRequest,
    ) -> Result<Option<OrderView>, RepositoryError> {
        let Some(order) = self.orders.update(id, user_id, req).await? else {
            return Ok(None);
        };
        let items = self.orders.items_for_orders(&[order.id]).await?;
        self.expand(order, items).await.map(Some)
    }

    async fn expand(
        &self,
        order: Order,
        items: Vec<OrderItem>,
    ) -> Result<OrderView, RepositoryError> {
        let product = self
            .products
            .get(order.product_id)
            .await?
            .ok_or_else(|| missing("product", &order))?;
        let market = self
            .markets
            .get(order.market_id)
            .await?
            .ok_or_else(|| missing("market", &order))?;
        let address = self
            .addresses
            .get_for_user(order.address_id, order.user_id)
            .await?
            .ok_or_else(|| missing("address", &order))?;

        Ok(OrderView {
            id: order.id,
            user_id: order.user_id,
            product,
            market,
            address,
            items,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }
}

fn missing(what: &str, order: &Order) -> RepositoryError {
    RepositoryError::DataCorruption(format!("order {} references a missing {what}", order.id))
}
