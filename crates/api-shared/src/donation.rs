//! Completed-donation bodies.

use crate::inventory::InventoryRecordRes;
use chrono::{DateTime, Utc};
use hemo_core::{BloodType, CoreResult, DonationCompleted, DonationOutcome, ProfileUpdate, RecordId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DonationCompletedReq {
    pub donation_id: String,
    pub donor_id: String,
    pub hospital_id: String,
    pub blood_type: String,
    /// 1 or 2.
    pub units: u32,
    pub donated_at: DateTime<Utc>,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub performed_by: Option<String>,
}

impl DonationCompletedReq {
    pub fn to_event(&self) -> CoreResult<DonationCompleted> {
        Ok(DonationCompleted {
            donation_id: RecordId::parse(&self.donation_id)?,
            donor_id: RecordId::parse(&self.donor_id)?,
            hospital_id: RecordId::parse(&self.hospital_id)?,
            blood_type: BloodType::parse(&self.blood_type)?,
            units: self.units,
            donated_at: self.donated_at,
            unit_id: self.unit_id.clone(),
            expiry_date: self.expiry_date,
            performed_by: self.performed_by.clone(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DonationCompletedRes {
    pub inventory: InventoryRecordRes,
    /// False when the stock was added but the donor profile could not be updated.
    pub profile_updated: bool,
    pub profile_error: Option<String>,
    pub next_eligible_date: DateTime<Utc>,
}

impl From<&DonationOutcome> for DonationCompletedRes {
    fn from(o: &DonationOutcome) -> Self {
        let (profile_updated, profile_error) = match &o.profile_update {
            ProfileUpdate::Applied => (true, None),
            ProfileUpdate::Failed(reason) => (false, Some(reason.clone())),
        };
        Self {
            inventory: (&o.inventory).into(),
            profile_updated,
            profile_error,
            next_eligible_date: o.next_eligible_date,
        }
    }
}
