//! Address repository.
//!
//! Every query is scoped by owner: an address belonging to another user is
//! indistinguishable from one that does not exist.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use bazaar_core::{AddressId, UserId};

use super::{RepositoryError, map_constraint_error};
use crate::models::address::{Address, CreateAddressRequest, GeoPoint, UpdateAddressRequest};

const ADDRESS_COLUMNS: &str = "id, user_id, street, location, is_primary, created_at, updated_at";

/// Reported when a concurrent write claimed the primary slot first.
pub const PRIMARY_ADDRESS_CONFLICT: &str = "another primary address was set concurrently, retry";

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    street: String,
    location: Json<GeoPoint>,
    is_primary: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(r: AddressRow) -> Self {
        Self {
            id: AddressId::new(r.id),
            user_id: UserId::new(r.user_id),
            street: r.street,
            location: r.location.0,
            is_primary: r.is_primary,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Clear the primary flag on the user's other addresses.
async fn clear_primary(
    conn: &mut PgConnection,
    user_id: UserId,
    keep: Option<AddressId>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        UPDATE bazaar.addresses
        SET is_primary = FALSE, updated_at = NOW()
        WHERE user_id = $1 AND is_primary AND ($2::INTEGER IS NULL OR id <> $2)
        ",
    )
    .bind(user_id)
    .bind(keep)
    .execute(conn)
    .await?;
    Ok(())
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, primary first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS}
            FROM bazaar.addresses
            WHERE user_id = $1
            ORDER BY is_primary DESC, id ASC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Get one of a user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM bazaar.addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    /// Create an address. A new primary address demotes the previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a concurrent write set another primary.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        req: &CreateAddressRequest,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if req.is_primary {
            clear_primary(&mut tx, user_id, None).await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            INSERT INTO bazaar.addresses (user_id, street, location, is_primary)
            VALUES ($1, $2, $3, $4)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(req.street.trim())
        .bind(Json(req.location))
        .bind(req.is_primary)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, PRIMARY_ADDRESS_CONFLICT))?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Apply a partial update to one of a user's addresses.
    ///
    /// Returns `None` if the address doesn't exist or belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a concurrent write set another primary.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: AddressId,
        user_id: UserId,
        req: &UpdateAddressRequest,
    ) -> Result<Option<Address>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if req.is_primary == Some(true) {
            clear_primary(&mut tx, user_id, Some(id)).await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            UPDATE bazaar.addresses
            SET street = COALESCE($3, street),
                location = COALESCE($4, location),
                is_primary = COALESCE($5, is_primary),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .bind(req.street.as_deref().map(str::trim))
        .bind(req.location.map(Json))
        .bind(req.is_primary)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, PRIMARY_ADDRESS_CONFLICT))?;

        // Not ours: roll back the demotion above.
        let Some(row) = row else {
            return Ok(None);
        };

        tx.commit().await?;

        Ok(Some(row.into()))
    }

    /// Delete one of a user's addresses.
    ///
    /// Returns `true` if an address was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: AddressId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM bazaar.addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
