//! Market repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use bazaar_core::{AverageRating, MarketId};

use super::RepositoryError;
use crate::models::market::{CreateMarketRequest, Market, MarketView, UpdateMarketRequest};
use crate::models::query::{MarketFilter, escape_like};

const MARKET_COLUMNS: &str = "id, name, description, location, created_at, updated_at";

/// Markets joined with their ratings; callers append `WHERE`/`GROUP BY`.
const MARKET_VIEW_SELECT: &str = r"
    SELECT m.id, m.name, m.description, m.location, m.created_at, m.updated_at,
           AVG(r.score) AS avg_score
    FROM bazaar.markets m
    LEFT JOIN bazaar.ratings r ON r.market_id = m.id
";

#[derive(sqlx::FromRow)]
struct MarketRow {
    id: i32,
    name: String,
    description: String,
    location: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MarketRow> for Market {
    fn from(r: MarketRow) -> Self {
        Self {
            id: MarketId::new(r.id),
            name: r.name,
            description: r.description,
            location: r.location,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MarketViewRow {
    #[sqlx(flatten)]
    market: MarketRow,
    avg_score: Option<f64>,
}

impl From<MarketViewRow> for MarketView {
    fn from(r: MarketViewRow) -> Self {
        Self {
            market: r.market.into(),
            rating: AverageRating::from_mean(r.avg_score),
        }
    }
}

/// Repository for market database operations.
pub struct MarketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MarketRepository<'a> {
    /// Create a new market repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List markets with their average rating, best rated first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &MarketFilter) -> Result<Vec<MarketView>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(MARKET_VIEW_SELECT);
        qb.push(" WHERE TRUE");

        if let Some(name) = &filter.name {
            qb.push(" AND m.name ILIKE ")
                .push_bind(format!("%{}%", escape_like(name)));
        }

        qb.push(" GROUP BY m.id ORDER BY avg_score DESC NULLS LAST, m.id ASC");

        let rows = qb
            .build_query_as::<MarketViewRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(MarketView::from).collect())
    }

    /// Get a market with its average rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: MarketId) -> Result<Option<MarketView>, RepositoryError> {
        let row = sqlx::query_as::<_, MarketViewRow>(&format!(
            "{MARKET_VIEW_SELECT} WHERE m.id = $1 GROUP BY m.id"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(MarketView::from))
    }

    /// Create a market.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, req: &CreateMarketRequest) -> Result<Market, RepositoryError> {
        let row = sqlx::query_as::<_, MarketRow>(&format!(
            r"
            INSERT INTO bazaar.markets (name, description, location)
            VALUES ($1, $2, $3)
            RETURNING {MARKET_COLUMNS}
            "
        ))
        .bind(req.name.trim())
        .bind(&req.description)
        .bind(&req.location)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// Returns `None` if the market doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: MarketId,
        req: &UpdateMarketRequest,
    ) -> Result<Option<Market>, RepositoryError> {
        let row = sqlx::query_as::<_, MarketRow>(&format!(
            r"
            UPDATE bazaar.markets
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {MARKET_COLUMNS}
            "
        ))
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.description.as_deref())
        .bind(req.location.as_deref())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Market::from))
    }

    /// Delete a market (cascades to its products, orders, and ratings).
    ///
    /// Returns `true` if a market was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: MarketId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM bazaar.markets WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
