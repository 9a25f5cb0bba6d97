//! Rating scores and the aggregate shown on products and markets.

use serde::{Deserialize, Serialize, Serializer};

/// Label rendered in place of an average when nothing has been rated yet.
pub const UNRATED_LABEL: &str = "not yet rated";

/// Errors that can occur when constructing a [`Score`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ScoreError {
    /// The value is NaN or infinite.
    #[error("score must be a finite number")]
    NotFinite,
    /// The value is outside the accepted range.
    #[error("score must be between {min} and {max} (got {value})")]
    OutOfRange {
        /// Lowest accepted score.
        min: f64,
        /// Highest accepted score.
        max: f64,
        /// The rejected value.
        value: f64,
    },
}

/// A single rating score, from 1 to 5 inclusive.
///
/// Fractional scores are allowed (`4.5` is a valid half-star).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    /// Lowest accepted score.
    pub const MIN: f64 = 1.0;
    /// Highest accepted score.
    pub const MAX: f64 = 5.0;

    /// Validate a raw score.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite or not within `1.0..=5.0`.
    pub fn new(value: f64) -> Result<Self, ScoreError> {
        if !value.is_finite() {
            return Err(ScoreError::NotFinite);
        }
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ScoreError::OutOfRange {
                min: Self::MIN,
                max: Self::MAX,
                value,
            });
        }
        Ok(Self(value))
    }

    /// Get the raw value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Score {
    type Error = ScoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

/// Average of the scores attached to a product or market.
///
/// Built from the nullable `AVG(score)` a `LEFT JOIN` aggregate returns:
/// `NULL` means there are no ratings, which is not the same as an average of
/// zero. Serializes as a number rounded to one decimal place, or as
/// [`UNRATED_LABEL`] when unrated.
///
/// ```
/// use bazaar_core::AverageRating;
///
/// assert_eq!(AverageRating::from_mean(Some(4.5)), AverageRating::Rated(4.5));
/// assert_eq!(AverageRating::from_mean(Some(4.333)), AverageRating::Rated(4.3));
/// assert_eq!(AverageRating::from_mean(None), AverageRating::Unrated);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AverageRating {
    /// No ratings exist yet.
    #[default]
    Unrated,
    /// Mean score, already rounded to one decimal place.
    Rated(f64),
}

impl AverageRating {
    /// Build from a raw database mean, rounding to one decimal place.
    #[must_use]
    pub fn from_mean(mean: Option<f64>) -> Self {
        match mean {
            Some(value) if value.is_finite() => Self::Rated(round_one_decimal(value)),
            _ => Self::Unrated,
        }
    }

    /// Build from a list of scores (used where ratings are already in memory).
    #[must_use]
    pub fn from_scores(scores: &[Score]) -> Self {
        if scores.is_empty() {
            return Self::Unrated;
        }
        let sum: f64 = scores.iter().map(|s| s.value()).sum();
        #[allow(clippy::cast_precision_loss)] // rating counts never approach 2^52
        let mean = sum / scores.len() as f64;
        Self::from_mean(Some(mean))
    }

    /// The rounded mean, or `None` when unrated.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Unrated => None,
            Self::Rated(value) => Some(value),
        }
    }
}

impl Serialize for AverageRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unrated => serializer.serialize_str(UNRATED_LABEL),
            Self::Rated(value) => serializer.serialize_f64(*value),
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scores(values: &[f64]) -> Vec<Score> {
        values.iter().map(|v| Score::new(*v).unwrap()).collect()
    }

    #[test]
    fn test_score_bounds() {
        assert!(Score::new(1.0).is_ok());
        assert!(Score::new(5.0).is_ok());
        assert!(Score::new(3.5).is_ok());
        assert!(matches!(
            Score::new(0.5),
            Err(ScoreError::OutOfRange { .. })
        ));
        assert!(matches!(
            Score::new(5.1),
            Err(ScoreError::OutOfRange { .. })
        ));
        assert_eq!(Score::new(f64::NAN), Err(ScoreError::NotFinite));
    }

    #[test]
    fn test_score_deserialize_validates() {
        let score: Score = serde_json::from_str("4").unwrap();
        assert!((score.value() - 4.0).abs() < f64::EPSILON);
        assert!(serde_json::from_str::<Score>("9").is_err());
    }

    #[test]
    fn test_average_of_four_and_five() {
        assert_eq!(
            AverageRating::from_scores(&scores(&[4.0, 5.0])),
            AverageRating::Rated(4.5)
        );
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        assert_eq!(
            AverageRating::from_scores(&scores(&[4.0, 4.0, 5.0])),
            AverageRating::Rated(4.3)
        );
        assert_eq!(
            AverageRating::from_scores(&scores(&[5.0, 5.0, 4.0])),
            AverageRating::Rated(4.7)
        );
        assert_eq!(
            AverageRating::from_mean(Some(3.25)),
            AverageRating::Rated(3.3)
        );
    }

    #[test]
    fn test_no_ratings_is_unrated() {
        assert_eq!(AverageRating::from_scores(&[]), AverageRating::Unrated);
        assert_eq!(AverageRating::from_mean(None), AverageRating::Unrated);
        assert_eq!(AverageRating::Unrated.value(), None);
    }

    #[test]
    fn test_unrated_serializes_as_label_not_zero() {
        let json = serde_json::to_value(AverageRating::Unrated).unwrap();
        assert_eq!(json, serde_json::json!(UNRATED_LABEL));
        assert_ne!(json, serde_json::json!(0));
        assert!(!json.is_null());
    }

    #[test]
    fn test_rated_serializes_as_number() {
        let json = serde_json::to_value(AverageRating::Rated(4.5)).unwrap();
        assert_eq!(json, serde_json::json!(4.5));
    }
}
