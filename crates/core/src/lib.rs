//! # HEMO Core
//!
//! Blood matching and inventory consistency engine.
//!
//! This crate contains the pure domain logic and its collaborator seams:
//! - Blood type compatibility, haversine distance and donor scoring
//! - Request matching against a donor directory, with emergency alternates
//! - Per-hospital, per-blood-type inventory with reservation, release and an append-only
//!   movement trail
//! - Area supply reports and completed-donation handling
//!
//! **No API concerns**: HTTP servers and CLI parsing belong in `api-rest`, `api-shared` and
//! `hemo-cli`. Collaborators (directories, stores, notifiers, clocks) are traits injected at
//! construction; reference implementations live alongside them.

pub mod clock;
pub mod compatibility;
pub mod config;
pub mod constants;
mod deadline;
pub mod directory;
pub mod distance;
pub mod donation;
pub mod error;
pub mod fixtures;
pub mod inventory;
pub mod matching;
pub mod notify;
pub mod scoring;
pub mod supply;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CoreConfig, StockDefaults};
pub use directory::{
    DirectoryUser, DonorCandidate, DonorDirectory, DonorQuery, DonorRegistry, HospitalDirectory,
    HospitalSite, InMemoryDirectory, UserRole,
};
pub use donation::{DonationCompleted, DonationCoordinator, DonationOutcome, ProfileUpdate};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use fixtures::DirectoryFixture;
pub use matching::{
    AlternativeOption, AlternativePriority, AlternativesReport, BloodRequestView, MatchResult,
    MatchedDonor, MatchingEngine,
};
pub use notify::{LogNotifier, Notice, Notifier};
pub use supply::{RegionalInventory, SupplyAggregator, SupplyOverview, SupplyStatus};

pub use hemo_types::{BloodType, Coordinate, Urgency};
pub use hemo_uuid::RecordId;
