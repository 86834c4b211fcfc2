//! Match and alternatives bodies.

use chrono::{DateTime, Utc};
use hemo_core::{
    AlternativeOption, AlternativesReport, BloodRequestView, BloodType, Coordinate, CoreResult,
    DonorCandidate, MatchResult, MatchedDonor, RecordId, Urgency,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CoordinateDto {
    pub latitude: f64,
    pub longitude: f64,
}

impl CoordinateDto {
    pub fn to_coordinate(self) -> CoreResult<Coordinate> {
        Ok(Coordinate::new(self.latitude, self.longitude)?)
    }
}

impl From<Coordinate> for CoordinateDto {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: c.latitude(),
            longitude: c.longitude(),
        }
    }
}

/// A blood request to match against nearby donors.
///
/// Also the body of the alternatives endpoint, which ignores the radius and notify flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatchReq {
    /// 32-char lowercase hex; generated when omitted.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Canonical (`AB-`) or slug (`ab-neg`) form.
    pub blood_type: String,
    pub units_needed: u32,
    /// `low`, `medium`, `high` or `critical`; defaults to `medium`.
    #[serde(default)]
    pub urgency: Option<String>,
    pub location: CoordinateDto,
    #[serde(default)]
    pub search_radius_km: Option<f64>,
    #[serde(default)]
    pub notify_donors: bool,
}

impl MatchReq {
    /// Parses the wire fields into a validated request.
    pub fn to_request(&self, created_at: DateTime<Utc>) -> CoreResult<BloodRequestView> {
        let id = match &self.request_id {
            Some(raw) => RecordId::parse(raw)?,
            None => RecordId::new(),
        };
        let urgency = match &self.urgency {
            Some(raw) => raw.parse::<Urgency>()?,
            None => Urgency::default(),
        };
        BloodRequestView::new(
            id,
            BloodType::parse(&self.blood_type)?,
            self.units_needed,
            urgency,
            self.location.to_coordinate()?,
            created_at,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DonorDto {
    pub id: String,
    pub name: String,
    pub blood_type: String,
    pub location: CoordinateDto,
    pub last_donation_date: Option<DateTime<Utc>>,
    pub donation_count: u32,
    pub is_eligible: bool,
    pub is_available: bool,
}

impl From<&DonorCandidate> for DonorDto {
    fn from(d: &DonorCandidate) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            blood_type: d.blood_type.to_string(),
            location: d.location.into(),
            last_donation_date: d.last_donation_date,
            donation_count: d.donation_count,
            is_eligible: d.is_eligible,
            is_available: d.is_available,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatchedDonorDto {
    pub donor: DonorDto,
    pub score: u32,
    pub distance_km: f64,
}

impl From<&MatchedDonor> for MatchedDonorDto {
    fn from(m: &MatchedDonor) -> Self {
        Self {
            donor: (&m.donor).into(),
            score: m.score,
            distance_km: m.distance_km,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatchRes {
    pub request_id: String,
    pub blood_type: String,
    pub units_needed: u32,
    pub urgency: String,
    /// Best first.
    pub matches: Vec<MatchedDonorDto>,
    pub total_matches: usize,
    /// Donors handed to the notifier; absent when notification was not requested.
    pub notified: Option<usize>,
}

impl MatchRes {
    pub fn from_result(result: &MatchResult, notified: Option<usize>) -> Self {
        Self {
            request_id: result.request.id().to_string(),
            blood_type: result.request.blood_type().to_string(),
            units_needed: result.request.units_needed(),
            urgency: result.request.urgency().to_string(),
            matches: result.matches.iter().map(MatchedDonorDto::from).collect(),
            total_matches: result.total_matches,
            notified,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlternativeDto {
    pub blood_type: String,
    pub reason: String,
    /// `high` or `medium`.
    pub priority: String,
    pub sample_donors: Vec<DonorDto>,
    pub available_donor_count: usize,
}

impl From<&AlternativeOption> for AlternativeDto {
    fn from(a: &AlternativeOption) -> Self {
        Self {
            blood_type: a.blood_type.to_string(),
            reason: a.reason.clone(),
            priority: a.priority.as_str().into(),
            sample_donors: a.sample_donors.iter().map(DonorDto::from).collect(),
            available_donor_count: a.available_donor_count,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlternativesRes {
    pub original_blood_type: String,
    pub alternatives: Vec<AlternativeDto>,
}

impl From<&AlternativesReport> for AlternativesRes {
    fn from(r: &AlternativesReport) -> Self {
        Self {
            original_blood_type: r.original_blood_type.to_string(),
            alternatives: r.alternatives.iter().map(AlternativeDto::from).collect(),
        }
    }
}
