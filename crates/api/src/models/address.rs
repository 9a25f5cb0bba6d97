//! Delivery addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{AddressId, UserId};

use super::{ValidationError, require_text};

/// Maximum street line length.
pub const MAX_STREET_LENGTH: usize = 111;

/// A WGS84 coordinate, stored as JSONB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// # Errors
    ///
    /// Returns `ValidationError` if either coordinate is out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::new(
                "latitude must be between -90 and 90",
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::new(
                "longitude must be between -180 and 180",
            ));
        }
        Ok(())
    }
}

/// A user's delivery address (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub street: String,
    pub location: GeoPoint,
    /// At most one address per user is primary.
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    pub street: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub is_primary: bool,
}

impl CreateAddressRequest {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank or overlong street or bad coordinates.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("street", &self.street, MAX_STREET_LENGTH)?;
        self.location.validate()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAddressRequest {
    pub street: Option<String>,
    pub location: Option<GeoPoint>,
    pub is_primary: Option<bool>,
}

impl UpdateAddressRequest {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank or overlong street or bad coordinates.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(street) = &self.street {
            require_text("street", street, MAX_STREET_LENGTH)?;
        }
        if let Some(location) = &self.location {
            location.validate()?;
        }
        Ok(())
    }
}
