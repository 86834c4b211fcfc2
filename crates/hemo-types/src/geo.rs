//! Geographic coordinate value type.

use crate::TypesError;
use serde::{Deserialize, Serialize};

/// A WGS84 point with latitude in `[-90, 90]` and longitude in `[-180, 180]`.
///
/// Construction (including deserialization) rejects out-of-range and non-finite values, so a
/// `Coordinate` can be fed straight into distance calculations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = TypesError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// # Errors
    ///
    /// Returns [`TypesError::LatitudeOutOfRange`] or [`TypesError::LongitudeOutOfRange`].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, TypesError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(TypesError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(TypesError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}
