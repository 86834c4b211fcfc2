//! # API Shared
//!
//! Wire types shared by the HEMO REST API and the `hemo` CLI.
//!
//! Contains:
//! - Request and response bodies with OpenAPI schemas
//! - Conversions between those bodies and `hemo-core` types
//! - Shared services like `HealthService`
//!
//! Identifiers, blood types and urgencies travel as strings and are parsed into core types at
//! the boundary, so malformed input surfaces as a `CoreError` with an `InvalidInput` kind.

pub mod donation;
pub mod error;
pub mod health;
pub mod inventory;
pub mod matching;
pub mod supply;

pub use donation::{DonationCompletedReq, DonationCompletedRes};
pub use error::ErrorRes;
pub use health::{HealthRes, HealthService};
pub use inventory::{
    AlertDto, BloodTypeStockDto, ExpiringGroupDto, ExpiryEntryDto, HospitalSummaryRes,
    InventoryRecordRes, LowStockAlertDto, MovementDto, StockChangeReq,
};
pub use matching::{
    AlternativeDto, AlternativesRes, CoordinateDto, DonorDto, MatchReq, MatchRes,
    MatchedDonorDto,
};
pub use supply::{
    BloodTypeSupplyDto, RegionalInventoryRes, RegionalStockDto, SkippedHospitalDto,
    SupplyOverviewRes, SupplyQuery,
};
