//! Ratings of products and markets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{MarketId, ProductId, RatingId, Score, UserId};

use super::{ValidationError, limit_text};

/// Maximum review message length.
pub const MAX_MESSAGE_LENGTH: usize = 300;

/// What a rating is attached to. Exactly one target per rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTarget {
    Product(ProductId),
    Market(MarketId),
}

impl RatingTarget {
    #[must_use]
    pub const fn product_id(self) -> Option<ProductId> {
        match self {
            Self::Product(id) => Some(id),
            Self::Market(_) => None,
        }
    }

    #[must_use]
    pub const fn market_id(self) -> Option<MarketId> {
        match self {
            Self::Market(id) => Some(id),
            Self::Product(_) => None,
        }
    }
}

/// A rating (domain type).
#[derive(Debug, Clone)]
pub struct Rating {
    pub id: RatingId,
    /// Author; only the author may change or delete the rating.
    pub user_id: UserId,
    pub target: RatingTarget,
    pub score: Score,
    pub message: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public representation of a rating.
///
/// The author is omitted for anonymous ratings.
#[derive(Debug, Clone, Serialize)]
pub struct RatingView {
    pub id: RatingId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub product_id: Option<ProductId>,
    pub market_id: Option<MarketId>,
    pub score: Score,
    pub message: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Rating> for RatingView {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id,
            user_id: (!rating.is_anonymous).then_some(rating.user_id),
            product_id: rating.target.product_id(),
            market_id: rating.target.market_id(),
            score: rating.score,
            message: rating.message,
            is_anonymous: rating.is_anonymous,
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    #[serde(alias = "product")]
    pub product_id: Option<ProductId>,
    #[serde(alias = "market")]
    pub market_id: Option<MarketId>,
    pub score: Score,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl CreateRatingRequest {
    /// Resolve the single rating target.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` unless exactly one of product and market is
    /// set, or if the message is too long.
    pub fn target(&self) -> Result<RatingTarget, ValidationError> {
        limit_text("message", &self.message, MAX_MESSAGE_LENGTH)?;
        match (self.product_id, self.market_id) {
            (Some(product), None) => Ok(RatingTarget::Product(product)),
            (None, Some(market)) => Ok(RatingTarget::Market(market)),
            (Some(_), Some(_)) => Err(ValidationError::new(
                "a rating must target either a product or a market, not both",
            )),
            (None, None) => Err(ValidationError::new(
                "a rating must target a product or a market",
            )),
        }
    }
}

/// Partial rating update. The target cannot be changed.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRatingRequest {
    pub score: Option<Score>,
    pub message: Option<String>,
    pub is_anonymous: Option<bool>,
}

impl UpdateRatingRequest {
    /// # Errors
    ///
    /// Returns `ValidationError` if the message is too long.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(message) = &self.message {
            limit_text("message", message, MAX_MESSAGE_LENGTH)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rating(is_anonymous: bool) -> Rating {
        Rating {
            id: RatingId::new(1),
            user_id: UserId::new(42),
            target: RatingTarget::Product(ProductId::new(7)),
            score: Score::new(4.0).unwrap(),
            message: "fresh".to_owned(),
            is_anonymous,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_anonymous_rating_hides_author() {
        let json = serde_json::to_value(RatingView::from(rating(true))).unwrap();
        assert!(json.get("user_id").is_none());
        assert_eq!(json["product_id"], 7);
        assert!(json["market_id"].is_null());
    }

    #[test]
    fn test_named_rating_shows_author() {
        let json = serde_json::to_value(RatingView::from(rating(false))).unwrap();
        assert_eq!(json["user_id"], 42);
    }

    #[test]
    fn test_target_requires_exactly_one() {
        let both: CreateRatingRequest = serde_json::from_value(serde_json::json!({
            "product": 7, "market": 2, "score": 5
        }))
        .unwrap();
        assert!(both.target().is_err());

        let neither: CreateRatingRequest =
            serde_json::from_value(serde_json::json!({"score": 5})).unwrap();
        assert!(neither.target().is_err());

        let market: CreateRatingRequest =
            serde_json::from_value(serde_json::json!({"market_id": 2, "score": 3.5})).unwrap();
        assert_eq!(
            market.target().unwrap(),
            RatingTarget::Market(MarketId::new(2))
        );
    }

    #[test]
    fn test_out_of_range_score_fails_to_deserialize() {
        let result = serde_json::from_value::<CreateRatingRequest>(serde_json::json!({
            "product_id": 7, "score": 6
        }));
        assert!(result.is_err());
    }
}
