//! Markets (sellers).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{AverageRating, MarketId};

use super::{ValidationError, require_text};

/// Maximum market name length.
pub const MAX_MARKET_NAME_LENGTH: usize = 300;

/// A market (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Market {
    pub id: MarketId,
    pub name: String,
    pub description: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A market together with the average of its ratings.
#[derive(Debug, Clone, Serialize)]
pub struct MarketView {
    #[serde(flatten)]
    pub market: Market,
    pub rating: AverageRating,
}

#[derive(Debug, Deserialize)]
pub struct CreateMarketRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
}

impl CreateMarketRequest {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank or overlong name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_MARKET_NAME_LENGTH)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMarketRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl UpdateMarketRequest {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank or overlong name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name, MAX_MARKET_NAME_LENGTH)?;
        }
        Ok(())
    }
}
