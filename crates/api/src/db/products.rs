//! Product repository.
//!
//! Listing queries aggregate ratings with a `LEFT JOIN` so unrated products
//! still appear (with a `NULL` average and a count of zero).

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use bazaar_core::{AverageRating, MarketId, ProductId};

use super::{RepositoryError, map_constraint_error};
use crate::models::product::{CreateProductRequest, Product, ProductView, UpdateProductRequest};
use crate::models::query::{ProductFilter, escape_like};

const PRODUCT_COLUMNS: &str = "id, market_id, name, description, category, price, discount, \
                               available, created_at, updated_at";

/// Products joined with their ratings; callers append `WHERE`/`GROUP BY`.
const PRODUCT_VIEW_SELECT: &str = r"
    SELECT p.id, p.market_id, p.name, p.description, p.category, p.price, p.discount,
           p.available, p.created_at, p.updated_at,
           AVG(r.score) AS avg_score,
           COUNT(r.id) AS rating_count
    FROM bazaar.products p
    LEFT JOIN bazaar.ratings r ON r.product_id = p.id
";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    market_id: i32,
    name: String,
    description: String,
    category: String,
    price: i64,
    discount: i64,
    available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: ProductId::new(r.id),
            market_id: MarketId::new(r.market_id),
            name: r.name,
            description: r.description,
            category: r.category,
            price: r.price,
            discount: r.discount,
            available: r.available,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductViewRow {
    #[sqlx(flatten)]
    product: ProductRow,
    avg_score: Option<f64>,
    rating_count: i64,
}

impl From<ProductViewRow> for ProductView {
    fn from(r: ProductViewRow) -> Self {
        Self {
            product: r.product.into(),
            rating: AverageRating::from_mean(r.avg_score),
            rating_count: r.rating_count,
        }
    }
}

/// Append the filter predicates, grouping, and ordering to a product view query.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE TRUE");

    if let Some(name) = &filter.name {
        qb.push(" AND p.name ILIKE ")
            .push_bind(format!("%{}%", escape_like(name)));
    }
    if let Some(price_min) = filter.price_min {
        qb.push(" AND p.price >= ").push_bind(price_min);
    }
    if let Some(price_max) = filter.price_max {
        qb.push(" AND p.price <= ").push_bind(price_max);
    }
    if let Some(category) = &filter.category {
        qb.push(" AND LOWER(p.category) = LOWER(")
            .push_bind(category.clone())
            .push(")");
    }
    if let Some(market) = filter.market {
        qb.push(" AND p.market_id = ").push_bind(market);
    }

    qb.push(" GROUP BY p.id");

    // AVG over zero rows is NULL, so unrated products fail this comparison.
    if let Some(rate_min) = filter.rate_min {
        qb.push(" HAVING AVG(r.score) >= ").push_bind(rate_min);
    }

    qb.push(" ORDER BY avg_score DESC NULLS LAST, rating_count DESC, p.id ASC");
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching every supplied filter, best rated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<ProductView>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_VIEW_SELECT);
        push_filter(&mut qb, filter);

        let rows = qb
            .build_query_as::<ProductViewRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(ProductView::from).collect())
    }

    /// Get a product with its rating aggregate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<ProductView>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductViewRow>(&format!(
            "{PRODUCT_VIEW_SELECT} WHERE p.id = $1 GROUP BY p.id"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ProductView::from))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the market doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, req: &CreateProductRequest) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO bazaar.products
                (market_id, name, description, category, price, discount, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(req.market_id)
        .bind(req.name.trim())
        .bind(&req.description)
        .bind(req.category.trim())
        .bind(req.price)
        .bind(req.discount)
        .bind(req.available)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "product already exists"))?;

        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// Returns `None` if the product doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a new market doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        req: &UpdateProductRequest,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE bazaar.products
            SET market_id = COALESCE($2, market_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                price = COALESCE($6, price),
                discount = COALESCE($7, discount),
                available = COALESCE($8, available),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(req.market_id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.description.as_deref())
        .bind(req.category.as_deref().map(str::trim))
        .bind(req.price)
        .bind(req.discount)
        .bind(req.available)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "product already exists"))?;

        Ok(row.map(Product::from))
    }

    /// Delete a product (cascades to orders and ratings that reference it).
    ///
    /// Returns `true` if a product was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM bazaar.products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
