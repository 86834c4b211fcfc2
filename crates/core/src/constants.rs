//! Constants used throughout the HEMO core crate.
//!
//! Scoring weights, defaults and storage names live here so that the behaviour is tunable in
//! one place.

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Minimum whole days between donations before a donor is fully rested.
pub const DONATION_INTERVAL_DAYS: i64 = 56;

/// Whole days after which a donor earns a partial recency bonus.
pub const PARTIAL_RECOVERY_DAYS: i64 = 28;

pub const SCORE_BASE: u32 = 100;
pub const SCORE_NEVER_DONATED: u32 = 60;
pub const SCORE_FULLY_RESTED: u32 = 50;
pub const SCORE_PARTIALLY_RESTED: u32 = 25;
pub const SCORE_PER_DONATION: u32 = 2;
pub const SCORE_EXPERIENCE_CAP: u32 = 20;
pub const SCORE_CRITICAL_URGENCY: u32 = 30;
pub const SCORE_HIGH_URGENCY: u32 = 15;
pub const SCORE_ELIGIBLE: u32 = 20;
pub const SCORE_CEILING: u32 = 200;

/// Allowed units on a single blood request.
pub const MIN_REQUEST_UNITS: u32 = 1;
pub const MAX_REQUEST_UNITS: u32 = 10;

/// Allowed units recorded for a single donation.
pub const MIN_DONATION_UNITS: u32 = 1;
pub const MAX_DONATION_UNITS: u32 = 2;

pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 50.0;
pub const DEFAULT_DIRECTORY_RESULT_CAP: usize = 20;
/// Cap on donors fetched per alternate blood type.
pub const ALTERNATIVES_RESULT_CAP: usize = 5;
/// Donors shown per alternate blood type.
pub const ALTERNATIVES_SAMPLE_SIZE: usize = 3;

pub const DEFAULT_MINIMUM_THRESHOLD: u32 = 5;
pub const DEFAULT_MAXIMUM_CAPACITY: u32 = 50;
pub const DEFAULT_COLLABORATOR_TIMEOUT_MS: u64 = 5_000;

/// Window used for expiring-soon alerts and summaries.
pub const EXPIRY_WARNING_DAYS: i64 = 7;

/// Donors whose last donation is at most this many whole weeks ago count as recent.
pub const RECENT_DONOR_WEEKS: i64 = 8;

pub const DEFAULT_ADD_REASON: &str = "Stock addition";
pub const DEFAULT_RESERVE_REASON: &str = "Stock reservation";
pub const DEFAULT_RELEASE_REASON: &str = "Reservation release";
pub const OPENING_BALANCE_REASON: &str = "Opening balance";

/// Default directory for inventory data when no explicit directory is configured.
pub const DEFAULT_INVENTORY_DATA_DIR: &str = "inventory_data";

/// Extension of per-record inventory files.
pub const INVENTORY_FILE_EXTENSION: &str = "yaml";
