//! Donor ranking score.

use crate::constants::*;
use crate::directory::DonorCandidate;
use crate::matching::BloodRequestView;
use chrono::{DateTime, Utc};
use hemo_types::Urgency;
use serde::Serialize;

/// Per-factor contributions to a donor's score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub base: u32,
    pub recency: u32,
    pub experience: u32,
    pub urgency: u32,
    pub eligibility: u32,
    /// Sum of the factors, capped at the score ceiling.
    pub total: u32,
}

/// Whole days since `last`, floored; a date in the future counts as zero days.
pub fn whole_days_since(last: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last).num_days().max(0)
}

fn recency_points(last_donation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    match last_donation {
        None => SCORE_NEVER_DONATED,
        Some(last) => match whole_days_since(last, now) {
            d if d >= DONATION_INTERVAL_DAYS => SCORE_FULLY_RESTED,
            d if d >= PARTIAL_RECOVERY_DAYS => SCORE_PARTIALLY_RESTED,
            _ => 0,
        },
    }
}

fn urgency_points(urgency: Urgency) -> u32 {
    match urgency {
        Urgency::Critical => SCORE_CRITICAL_URGENCY,
        Urgency::High => SCORE_HIGH_URGENCY,
        Urgency::Medium | Urgency::Low => 0,
    }
}

pub fn breakdown(
    donor: &DonorCandidate,
    request: &BloodRequestView,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let base = SCORE_BASE;
    let recency = recency_points(donor.last_donation_date, now);
    let experience = donor
        .donation_count
        .saturating_mul(SCORE_PER_DONATION)
        .min(SCORE_EXPERIENCE_CAP);
    let urgency = urgency_points(request.urgency());
    let eligibility = if donor.is_eligible { SCORE_ELIGIBLE } else { 0 };

    let total = (base + recency + experience + urgency + eligibility).min(SCORE_CEILING);
    ScoreBreakdown {
        base,
        recency,
        experience,
        urgency,
        eligibility,
        total,
    }
}

/// Match score in `[0, 200]` for one donor against one request.
pub fn score(donor: &DonorCandidate, request: &BloodRequestView, now: DateTime<Utc>) -> u32 {
    breakdown(donor, request, now).total
}
