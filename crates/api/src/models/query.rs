//! Listing filters parsed from query strings.
//!
//! Every filter is optional. A parameter that is absent or empty
//! (`?category=`) is treated the same way: it does not constrain the result.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use bazaar_core::{MarketId, ProductId};

/// Deserialize an optional query value, mapping blank strings to `None`.
///
/// Query strings arrive as text, so the value is parsed with `FromStr`.
///
/// # Errors
///
/// Fails if a non-blank value cannot be parsed as `T`.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

/// `GET /market` filters.
#[derive(Debug, Default, Deserialize)]
pub struct MarketFilter {
    /// Case-insensitive substring of the market name.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub name: Option<String>,
}

/// `GET /product` filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub price_min: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub price_max: Option<i64>,
    /// Case-insensitive category equality.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<String>,
    /// Minimum average rating; unrated products never match.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub rate_min: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub market: Option<MarketId>,
}

/// `GET /rate` filters.
#[derive(Debug, Default, Deserialize)]
pub struct RatingFilter {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub product: Option<ProductId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub market: Option<MarketId>,
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn products(query: &str) -> Result<ProductFilter, String> {
        let uri: axum::http::Uri = format!("/product?{query}").parse().unwrap();
        axum::extract::Query::<ProductFilter>::try_from_uri(&uri)
            .map(|axum::extract::Query(filter)| filter)
            .map_err(|e| e.body_text())
    }

    #[test]
    fn test_all_absent() {
        let filter = products("").unwrap();
        assert!(filter.name.is_none());
        assert!(filter.price_min.is_none());
        assert!(filter.rate_min.is_none());
        assert!(filter.market.is_none());
    }

    #[test]
    fn test_empty_values_are_absent() {
        let filter = products("category=&price_min=&name=").unwrap();
        assert!(filter.category.is_none());
        assert!(filter.price_min.is_none());
        assert!(filter.name.is_none());
    }

    #[test]
    fn test_values_parse() {
        let filter = products("category=bakery&price_min=1000&rate_min=4.5&market=2").unwrap();
        assert_eq!(filter.category.as_deref(), Some("bakery"));
        assert_eq!(filter.price_min, Some(1000));
        assert_eq!(filter.rate_min, Some(4.5));
        assert_eq!(filter.market, Some(MarketId::new(2)));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        assert!(products("price_min=cheap").is_err());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("bread"), "bread");
    }
}
