//! # HEMO Types
//!
//! Validated value types shared by every HEMO crate.
//!
//! Each type here guarantees its invariant once constructed, so downstream code never has to
//! re-check a blood type spelling or a coordinate range:
//! - [`BloodType`]: the closed ABO/Rh set
//! - [`Coordinate`]: a latitude/longitude pair inside the valid ranges
//! - [`Urgency`]: request priority tier

mod blood_type;
mod geo;

pub use blood_type::{BloodType, Urgency};
pub use geo::Coordinate;

/// Errors that can occur when constructing validated value types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypesError {
    /// The input is not one of the eight ABO/Rh blood types
    #[error("invalid blood type: '{0}'")]
    InvalidBloodType(String),

    /// The input is not one of the urgency tiers
    #[error("invalid urgency: '{0}'")]
    InvalidUrgency(String),

    #[error("latitude must be within [-90, 90], got {0}")]
    LatitudeOutOfRange(f64),

    #[error("longitude must be within [-180, 180], got {0}")]
    LongitudeOutOfRange(f64),
}
