//! Products offered by markets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{AverageRating, MarketId, ProductId};

use super::{ValidationError, require_text};

/// Maximum product name length.
pub const MAX_PRODUCT_NAME_LENGTH: usize = 300;
/// Maximum category length.
pub const MAX_CATEGORY_LENGTH: usize = 300;

/// A product (domain type).
///
/// Prices and discounts are integer amounts in the smallest currency unit.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub market_id: MarketId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: i64,
    pub discount: i64,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product together with its rating aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub rating: AverageRating,
    pub rating_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(alias = "market")]
    pub market_id: MarketId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: i64,
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub available: bool,
}

impl CreateProductRequest {
    /// # Errors
    ///
    /// Returns `ValidationError` for blank text or a negative amount.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, MAX_PRODUCT_NAME_LENGTH)?;
        require_text("category", &self.category, MAX_CATEGORY_LENGTH)?;
        non_negative("price", self.price)?;
        non_negative("discount", self.discount)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(alias = "market")]
    pub market_id: Option<MarketId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<i64>,
    pub discount: Option<i64>,
    pub available: Option<bool>,
}

impl UpdateProductRequest {
    /// # Errors
    ///
    /// Returns `ValidationError` for blank text or a negative amount.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name, MAX_PRODUCT_NAME_LENGTH)?;
        }
        if let Some(category) = &self.category {
            require_text("category", category, MAX_CATEGORY_LENGTH)?;
        }
        if let Some(price) = self.price {
            non_negative("price", price)?;
        }
        if let Some(discount) = self.discount {
            non_negative("discount", discount)?;
        }
        Ok(())
    }
}

fn non_negative(field: &str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(format!("{field} cannot be negative")));
    }
    Ok(())
}
