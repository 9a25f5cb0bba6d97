//! User support commands.

use super::connect;

/// Mark a user verified without redeeming an OTP.
///
/// Pending signup codes for the user are discarded.
pub async fn verify(username: &str) -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let mut tx = pool.begin().await?;

    let user_id: Option<i32> = sqlx::query_scalar(
        r"
        UPDATE bazaar.users
        SET is_verified = TRUE, updated_at = NOW()
        WHERE username = $1
        RETURNING id
        ",
    )
    .bind(username)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = user_id else {
        return Err(format!("no user named '{username}'").into());
    };

    sqlx::query("DELETE FROM bazaar.otps WHERE user_id = $1 AND purpose = 'signup'")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(user_id, username, "User verified");
    Ok(())
}
