//! One-time password storage and redemption.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use uuid::Uuid;

use bazaar_core::{OtpCode, OtpId, OtpPolicy, OtpPurpose, OtpRejection, UserId};

use super::RepositoryError;
use crate::models::otp::Otp;

const OTP_COLUMNS: &str = "id, user_id, key, code, purpose, created_at";

#[derive(sqlx::FromRow)]
struct OtpRow {
    id: i32,
    user_id: i32,
    key: Uuid,
    code: i32,
    purpose: OtpPurpose,
    created_at: DateTime<Utc>,
}

impl TryFrom<OtpRow> for Otp {
    type Error = RepositoryError;

    fn try_from(r: OtpRow) -> Result<Self, Self::Error> {
        let code = u32::try_from(r.code).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative otp code for otp {}", r.id))
        })?;

        Ok(Self {
            id: OtpId::new(r.id),
            user_id: UserId::new(r.user_id),
            key: r.key,
            code: OtpCode::new(code),
            purpose: r.purpose,
            created_at: r.created_at,
        })
    }
}

/// What redeeming an OTP does to its owner.
#[derive(Debug, Clone, Copy)]
pub enum OtpEffect<'a> {
    /// Mark the account verified.
    VerifyUser,
    /// Replace the password hash (and mark the phone verified).
    SetPassword(&'a str),
}

/// Errors from [`OtpRepository::redeem`].
#[derive(Debug, Error)]
pub enum RedeemError {
    /// The OTP exists but the submission was rejected.
    #[error(transparent)]
    Rejected(#[from] OtpRejection),

    /// Lookup or write failed (`NotFound` when no OTP has the key).
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for RedeemError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Replace any outstanding OTP of the same purpose for `user_id` with a new one.
///
/// Runs on the caller's connection so it can join an open transaction.
pub(super) async fn insert_otp(
    conn: &mut PgConnection,
    user_id: UserId,
    key: Uuid,
    code: OtpCode,
    purpose: OtpPurpose,
) -> Result<Otp, RepositoryError> {
    sqlx::query("DELETE FROM bazaar.otps WHERE user_id = $1 AND purpose = $2")
        .bind(user_id)
        .bind(purpose)
        .execute(&mut *conn)
        .await?;

    let code = i32::try_from(code.value())
        .map_err(|_| RepositoryError::DataCorruption("otp code out of range".to_owned()))?;

    let row = sqlx::query_as::<_, OtpRow>(&format!(
        r"
        INSERT INTO bazaar.otps (user_id, key, code, purpose)
        VALUES ($1, $2, $3, $4)
        RETURNING {OTP_COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(key)
    .bind(code)
    .bind(purpose)
    .fetch_one(&mut *conn)
    .await?;

    Otp::try_from(row)
}

/// Repository for OTP database operations.
pub struct OtpRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OtpRepository<'a> {
    /// Create a new OTP repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Issue a new OTP, invalidating earlier ones of the same purpose.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn issue(
        &self,
        user_id: UserId,
        key: Uuid,
        code: OtpCode,
        purpose: OtpPurpose,
    ) -> Result<Otp, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let otp = insert_otp(&mut *tx, user_id, key, code, purpose)
            .await
            .map_err(|e| match e {
                RepositoryError::Database(db) => super::map_constraint_error(db, "otp key reused"),
                other => other,
            })?;
        tx.commit().await?;
        Ok(otp)
    }

    /// Redeem an OTP and apply `effect` to its owner.
    ///
    /// The OTP row is locked for the duration of the transaction. On success
    /// the effect is applied and the OTP is deleted; on any failure nothing
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns `RedeemError::Repository(NotFound)` if no OTP has this key and purpose.
    /// Returns `RedeemError::Rejected` if the code is wrong or expired.
    pub async fn redeem(
        &self,
        key: Uuid,
        purpose: OtpPurpose,
        submitted: OtpCode,
        policy: &OtpPolicy,
        effect: OtpEffect<'_>,
    ) -> Result<UserId, RedeemError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OtpRow>(&format!(
            "SELECT {OTP_COLUMNS} FROM bazaar.otps WHERE key = $1 AND purpose = $2 FOR UPDATE"
        ))
        .bind(key)
        .bind(purpose)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let otp = Otp::try_from(row)?;

        // Dropping `tx` on rejection rolls back and releases the lock.
        policy.check(otp.code, submitted, otp.created_at, Utc::now())?;

        match effect {
            OtpEffect::VerifyUser => {
                sqlx::query(
                    "UPDATE bazaar.users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1",
                )
                .bind(otp.user_id)
                .execute(&mut *tx)
                .await?;
            }
            OtpEffect::SetPassword(password_hash) => {
                sqlx::query(
                    r"
                    UPDATE bazaar.users
                    SET password_hash = $2, is_verified = TRUE, updated_at = NOW()
                    WHERE id = $1
                    ",
                )
                .bind(otp.user_id)
                .bind(password_hash)
                .execute(&mut *tx)
                .await?;
            }
        }

        sqlx::query("DELETE FROM bazaar.otps WHERE id = $1")
            .bind(otp.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(otp.user_id)
    }
}
