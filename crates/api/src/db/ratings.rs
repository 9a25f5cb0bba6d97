//! Rating repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use bazaar_core::{MarketId, ProductId, RatingId, Score, UserId};

use super::{RepositoryError, map_constraint_error};
use crate::models::query::RatingFilter;
use crate::models::rating::{Rating, RatingTarget, UpdateRatingRequest};

const RATING_COLUMNS: &str = "id, user_id, product_id, market_id, score, message, is_anonymous, \
                              created_at, updated_at";

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: i32,
    user_id: i32,
    product_id: Option<i32>,
    market_id: Option<i32>,
    score: f64,
    message: String,
    is_anonymous: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(r: RatingRow) -> Result<Self, Self::Error> {
        let target = match (r.product_id, r.market_id) {
            (Some(product), None) => RatingTarget::Product(ProductId::new(product)),
            (None, Some(market)) => RatingTarget::Market(MarketId::new(market)),
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "rating {} must reference exactly one product or market",
                    r.id
                )));
            }
        };
        let score = Score::new(r.score).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid score for rating {}: {e}", r.id))
        })?;

        Ok(Self {
            id: RatingId::new(r.id),
            user_id: UserId::new(r.user_id),
            target,
            score,
            message: r.message,
            is_anonymous: r.is_anonymous,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Fields needed to create a rating.
#[derive(Debug, Clone, Copy)]
pub struct NewRating<'a> {
    pub target: RatingTarget,
    pub score: Score,
    pub message: &'a str,
    pub is_anonymous: bool,
}

/// Repository for rating database operations.
pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List ratings, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &RatingFilter) -> Result<Vec<Rating>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RATING_COLUMNS} FROM bazaar.ratings WHERE TRUE"
        ));
        if let Some(product) = filter.product {
            qb.push(" AND product_id = ").push_bind(product);
        }
        if let Some(market) = filter.market {
            qb.push(" AND market_id = ").push_bind(market);
        }
        qb.push(" ORDER BY created_at DESC, id DESC");

        let rows = qb.build_query_as::<RatingRow>().fetch_all(self.pool).await?;

        rows.into_iter().map(Rating::try_from).collect()
    }

    /// Get a rating by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: RatingId) -> Result<Option<Rating>, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {RATING_COLUMNS} FROM bazaar.ratings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Rating::try_from).transpose()
    }

    /// Create a rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product or market doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        new_rating: &NewRating<'_>,
    ) -> Result<Rating, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(&format!(
            r"
            INSERT INTO bazaar.ratings
                (user_id, product_id, market_id, score, message, is_anonymous)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RATING_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(new_rating.target.product_id())
        .bind(new_rating.target.market_id())
        .bind(new_rating.score)
        .bind(new_rating.message)
        .bind(new_rating.is_anonymous)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "rating already exists"))?;

        Rating::try_from(row)
    }

    /// Apply a partial update to a rating written by `user_id`.
    ///
    /// Returns `None` if no such rating is authored by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_owned(
        &self,
        id: RatingId,
        user_id: UserId,
        req: &UpdateRatingRequest,
    ) -> Result<Option<Rating>, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(&format!(
            r"
            UPDATE bazaar.ratings
            SET score = COALESCE($3, score),
                message = COALESCE($4, message),
                is_anonymous = COALESCE($5, is_anonymous),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {RATING_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .bind(req.score)
        .bind(req.message.as_deref())
        .bind(req.is_anonymous)
        .fetch_optional(self.pool)
        .await?;

        row.map(Rating::try_from).transpose()
    }

    /// Delete a rating written by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_owned(&self, id: RatingId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM bazaar.ratings WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
