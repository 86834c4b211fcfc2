//! Area supply bodies.

use crate::matching::CoordinateDto;
use chrono::{DateTime, Utc};
use hemo_core::supply::{BloodTypeSupply, RegionalBloodTypeStock, SkippedHospital};
use hemo_core::{Coordinate, CoreResult, RegionalInventory, SupplyOverview};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query string of both supply endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SupplyQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// Falls back to the configured search radius.
    pub radius_km: Option<f64>,
}

impl SupplyQuery {
    pub fn location(&self) -> CoreResult<Coordinate> {
        Ok(Coordinate::new(self.latitude, self.longitude)?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BloodTypeSupplyDto {
    pub blood_type: String,
    pub available_donors: usize,
    pub eligible_donors: usize,
    pub recent_donors: usize,
    pub status: String,
    pub status_text: String,
}

impl From<&BloodTypeSupply> for BloodTypeSupplyDto {
    fn from(s: &BloodTypeSupply) -> Self {
        Self {
            blood_type: s.blood_type.to_string(),
            available_donors: s.available_donors,
            eligible_donors: s.eligible_donors,
            recent_donors: s.recent_donors,
            status: s.status.as_str().into(),
            status_text: s.status_text.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SupplyOverviewRes {
    pub location: CoordinateDto,
    pub radius_km: f64,
    pub total_donors: usize,
    pub by_blood_type: Vec<BloodTypeSupplyDto>,
    pub last_updated: DateTime<Utc>,
}

impl From<&SupplyOverview> for SupplyOverviewRes {
    fn from(o: &SupplyOverview) -> Self {
        Self {
            location: o.location.into(),
            radius_km: o.radius_km,
            total_donors: o.total_donors,
            by_blood_type: o.by_blood_type.iter().map(Into::into).collect(),
            last_updated: o.last_updated,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegionalStockDto {
    pub blood_type: String,
    pub current_stock: u32,
    pub reserved_stock: u32,
    pub available_stock: u32,
    pub hospitals_low: usize,
    pub hospitals_out_of_stock: usize,
}

impl From<&RegionalBloodTypeStock> for RegionalStockDto {
    fn from(s: &RegionalBloodTypeStock) -> Self {
        Self {
            blood_type: s.blood_type.to_string(),
            current_stock: s.current_stock,
            reserved_stock: s.reserved_stock,
            available_stock: s.available_stock,
            hospitals_low: s.hospitals_low,
            hospitals_out_of_stock: s.hospitals_out_of_stock,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SkippedHospitalDto {
    pub hospital_id: String,
    pub name: String,
    pub reason: String,
}

impl From<&SkippedHospital> for SkippedHospitalDto {
    fn from(s: &SkippedHospital) -> Self {
        Self {
            hospital_id: s.hospital_id.to_string(),
            name: s.name.clone(),
            reason: s.reason.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegionalInventoryRes {
    pub location: CoordinateDto,
    pub radius_km: f64,
    pub hospitals_included: Vec<String>,
    pub skipped_hospitals: Vec<SkippedHospitalDto>,
    pub by_blood_type: Vec<RegionalStockDto>,
    pub generated_at: DateTime<Utc>,
}

impl From<&RegionalInventory> for RegionalInventoryRes {
    fn from(r: &RegionalInventory) -> Self {
        Self {
            location: r.location.into(),
            radius_km: r.radius_km,
            hospitals_included: r.hospitals_included.iter().map(ToString::to_string).collect(),
            skipped_hospitals: r.skipped_hospitals.iter().map(Into::into).collect(),
            by_blood_type: r.by_blood_type.iter().map(Into::into).collect(),
            generated_at: r.generated_at,
        }
    }
}
