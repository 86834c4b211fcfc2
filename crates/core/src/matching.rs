//! Request-to-donor matching.
//!
//! [`MatchingEngine`] asks the donor directory for compatible, available donors near a request,
//! scores each with [`crate::scoring`] and returns them ranked. It can also suggest emergency
//! alternate blood types with sample donors.

use crate::clock::Clock;
use crate::compatibility::{acceptable_donor_types, alternate_types_for, is_compatible};
use crate::config::CoreConfig;
use crate::constants::{
    ALTERNATIVES_RESULT_CAP, ALTERNATIVES_SAMPLE_SIZE, MAX_REQUEST_UNITS, MIN_REQUEST_UNITS,
};
use crate::deadline::within;
use crate::directory::{DonorCandidate, DonorDirectory, DonorQuery};
use crate::distance::distance_km;
use crate::scoring::score;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use hemo_types::{BloodType, Coordinate, Urgency};
use hemo_uuid::RecordId;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// The parts of a blood request that matching needs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BloodRequestView {
    id: RecordId,
    blood_type: BloodType,
    units_needed: u32,
    urgency: Urgency,
    location: Coordinate,
    created_at: DateTime<Utc>,
}

impl BloodRequestView {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] if `units_needed` is outside `1..=10`.
    pub fn new(
        id: RecordId,
        blood_type: BloodType,
        units_needed: u32,
        urgency: Urgency,
        location: Coordinate,
        created_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if !(MIN_REQUEST_UNITS..=MAX_REQUEST_UNITS).contains(&units_needed) {
            return Err(CoreError::InvalidRequest(format!(
                "units needed must be between {MIN_REQUEST_UNITS} and {MAX_REQUEST_UNITS}, got {units_needed}"
            )));
        }
        Ok(Self {
            id,
            blood_type,
            units_needed,
            urgency,
            location,
            created_at,
        })
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn blood_type(&self) -> BloodType {
        self.blood_type
    }

    pub fn units_needed(&self) -> u32 {
        self.units_needed
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn location(&self) -> Coordinate {
        self.location
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchedDonor {
    pub donor: DonorCandidate,
    pub score: u32,
    pub distance_km: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchResult {
    pub request: BloodRequestView,
    pub matches: Vec<MatchedDonor>,
    pub total_matches: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlternativePriority {
    High,
    Medium,
}

impl AlternativePriority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlternativeOption {
    pub blood_type: BloodType,
    pub reason: String,
    pub priority: AlternativePriority,
    pub sample_donors: Vec<DonorCandidate>,
    pub available_donor_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlternativesReport {
    pub original_blood_type: BloodType,
    pub alternatives: Vec<AlternativeOption>,
}

fn describe_alternate(blood_type: BloodType) -> (&'static str, AlternativePriority) {
    match blood_type {
        BloodType::ONeg => (
            "Universal donor - compatible with all blood types",
            AlternativePriority::High,
        ),
        _ => ("Universal Rh-positive donor", AlternativePriority::Medium),
    }
}

/// Ranks donors for blood requests.
#[derive(Clone)]
pub struct MatchingEngine {
    directory: Arc<dyn DonorDirectory>,
    clock: Arc<dyn Clock>,
    result_cap: usize,
    timeout: Duration,
}

impl MatchingEngine {
    pub fn new(
        directory: Arc<dyn DonorDirectory>,
        clock: Arc<dyn Clock>,
        cfg: &CoreConfig,
    ) -> Self {
        Self {
            directory,
            clock,
            result_cap: cfg.directory_result_cap(),
            timeout: cfg.collaborator_timeout(),
        }
    }

    /// Finds compatible donors within `search_radius_km` of the request, best first.
    ///
    /// Ranking is by score descending, then distance ascending, then donor id ascending.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidInput`] if the radius is not a positive finite number.
    /// - Directory failures and timeouts are returned as-is.
    pub async fn find_matches(
        &self,
        request: &BloodRequestView,
        search_radius_km: f64,
    ) -> CoreResult<MatchResult> {
        if !search_radius_km.is_finite() || search_radius_km <= 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "search radius must be a positive number of kilometres, got {search_radius_km}"
            )));
        }

        let recipient = request.blood_type();
        let query = DonorQuery::of_types(acceptable_donor_types(recipient).to_vec())
            .near(request.location(), search_radius_km)
            .limit(self.result_cap);
        let candidates = within(
            self.timeout,
            "donor directory",
            self.directory.find_donors(&query),
        )
        .await?;

        let now = self.clock.now();
        let mut matches: Vec<MatchedDonor> = candidates
            .into_iter()
            .filter(|donor| {
                let ok = is_compatible(donor.blood_type, recipient);
                if !ok {
                    tracing::warn!(
                        donor_id = %donor.id,
                        donor_type = %donor.blood_type,
                        recipient_type = %recipient,
                        "directory returned an incompatible donor; dropping"
                    );
                }
                ok
            })
            .map(|donor| MatchedDonor {
                score: score(&donor, request, now),
                distance_km: distance_km(request.location(), donor.location),
                donor,
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.distance_km.total_cmp(&b.distance_km))
                .then_with(|| a.donor.id.cmp(&b.donor.id))
        });

        tracing::debug!(
            request_id = %request.id(),
            blood_type = %recipient,
            matches = matches.len(),
            "ranked donors for request"
        );

        Ok(MatchResult {
            request: request.clone(),
            total_matches: matches.len(),
            matches,
        })
    }

    /// Emergency alternate blood types for a request, each with a few sample donors.
    pub async fn find_alternatives(
        &self,
        request: &BloodRequestView,
    ) -> CoreResult<AlternativesReport> {
        let mut alternatives = Vec::new();
        for blood_type in alternate_types_for(request.blood_type()) {
            let query = DonorQuery::of_types(vec![blood_type]).limit(ALTERNATIVES_RESULT_CAP);
            let donors = within(
                self.timeout,
                "donor directory",
                self.directory.find_donors(&query),
            )
            .await?;

            let (reason, priority) = describe_alternate(blood_type);
            alternatives.push(AlternativeOption {
                blood_type,
                reason: reason.to_string(),
                priority,
                available_donor_count: donors.len(),
                sample_donors: donors.into_iter().take(ALTERNATIVES_SAMPLE_SIZE).collect(),
            });
        }

        Ok(AlternativesReport {
            original_blood_type: request.blood_type(),
            alternatives,
        })
    }
}
