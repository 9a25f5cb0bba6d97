//! Rating route handlers.
//!
//! Anyone may read ratings. Only the author may change or remove one.

use axum::{Json, extract::State, http::StatusCode};

use bazaar_core::RatingId;

use crate::db::RatingRepository;
use crate::db::ratings::NewRating;
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, AuthUser, RequireAuth};
use crate::models::query::RatingFilter;
use crate::models::rating::{CreateRatingRequest, Rating, RatingView, UpdateRatingRequest};
use crate::state::AppState;

/// GET /rate?product=&market=
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<RatingFilter>,
) -> Result<Json<Vec<RatingView>>> {
    let ratings = RatingRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(ratings.into_iter().map(RatingView::from).collect()))
}

/// GET /rate/{id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RatingId>,
) -> Result<Json<RatingView>> {
    RatingRepository::new(state.pool())
        .get(id)
        .await?
        .map(|rating| Json(rating.into()))
        .ok_or_else(|| not_found(id))
}

/// Rate a product or a market.
///
/// POST /rate
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<CreateRatingRequest>,
) -> Result<(StatusCode, Json<RatingView>)> {
    let new_rating = NewRating {
        target: req.target()?,
        score: req.score,
        message: &req.message,
        is_anonymous: req.is_anonymous,
    };
    let rating = RatingRepository::new(state.pool())
        .create(user.id, &new_rating)
        .await?;

    tracing::info!(user_id = %user.id, rating_id = %rating.id, "Rating created");
    Ok((StatusCode::CREATED, Json(rating.into())))
}

/// PATCH /rate/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<RatingId>,
    ApiJson(req): ApiJson<UpdateRatingRequest>,
) -> Result<Json<RatingView>> {
    req.validate()?;
    let repo = RatingRepository::new(state.pool());
    ensure_author(repo.get(id).await?, id, &user)?;

    // None here means the rating was deleted after the author check.
    repo.update_owned(id, user.id, &req)
        .await?
        .map(|rating| Json(rating.into()))
        .ok_or_else(|| not_found(id))
}

/// DELETE /rate/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<RatingId>,
) -> Result<StatusCode> {
    let repo = RatingRepository::new(state.pool());
    ensure_author(repo.get(id).await?, id, &user)?;

    if !repo.delete_owned(id, user.id).await? {
        return Err(not_found(id));
    }

    tracing::info!(user_id = %user.id, rating_id = %id, "Rating deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// 404 for a missing rating, 403 for someone else's.
fn ensure_author(rating: Option<Rating>, id: RatingId, user: &AuthUser) -> Result<Rating> {
    let rating = rating.ok_or_else(|| not_found(id))?;
    if rating.user_id != user.id {
        tracing::warn!(user_id = %user.id, rating_id = %id, "Rejected edit of another user's rating");
        return Err(AppError::Forbidden(
            "you can only modify your own ratings".to_string(),
        ));
    }
    Ok(rating)
}

fn not_found(id: RatingId) -> AppError {
    AppError::NotFound(format!("rating {id} not found"))
}
