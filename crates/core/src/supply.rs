//! Area-level supply reports.
//!
//! [`SupplyAggregator::blood_supply_overview`] counts donors near a point per blood type, and
//! [`SupplyAggregator::regional_inventory`] rolls hospital inventory up the same way. Both are
//! read-only and computed fresh on every call.

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::constants::RECENT_DONOR_WEEKS;
use crate::deadline::within;
use crate::directory::{DonorDirectory, DonorQuery, HospitalDirectory};
use crate::inventory::{InventoryLedger, StockStatus};
use crate::scoring::whole_days_since;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use hemo_types::{BloodType, Coordinate};
use hemo_uuid::RecordId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplyStatus {
    Critical,
    Low,
    Medium,
    Good,
    Excellent,
}

impl SupplyStatus {
    /// Status band for a count of eligible donors.
    pub fn from_eligible(eligible: usize) -> Self {
        match eligible {
            0 => Self::Critical,
            1..=2 => Self::Low,
            3..=5 => Self::Medium,
            6..=10 => Self::Good,
            _ => Self::Excellent,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }

    pub const fn status_text(self) -> &'static str {
        match self {
            Self::Critical => "No donors available",
            Self::Low => "Very low supply",
            Self::Medium => "Low supply",
            Self::Good => "Adequate supply",
            Self::Excellent => "Good supply",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BloodTypeSupply {
    pub blood_type: BloodType,
    pub available_donors: usize,
    pub eligible_donors: usize,
    /// Donors whose last donation was at most 8 whole weeks ago.
    pub recent_donors: usize,
    pub status: SupplyStatus,
    pub status_text: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SupplyOverview {
    pub location: Coordinate,
    pub radius_km: f64,
    pub total_donors: usize,
    pub by_blood_type: Vec<BloodTypeSupply>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionalBloodTypeStock {
    pub blood_type: BloodType,
    pub current_stock: u32,
    pub reserved_stock: u32,
    pub available_stock: u32,
    pub hospitals_low: usize,
    pub hospitals_out_of_stock: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedHospital {
    pub hospital_id: RecordId,
    pub name: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionalInventory {
    pub location: Coordinate,
    pub radius_km: f64,
    pub hospitals_included: Vec<RecordId>,
    pub skipped_hospitals: Vec<SkippedHospital>,
    pub by_blood_type: Vec<RegionalBloodTypeStock>,
    pub generated_at: DateTime<Utc>,
}

fn check_radius(radius_km: f64) -> CoreResult<()> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(CoreError::InvalidInput(format!(
            "radius must be a positive number of kilometres, got {radius_km}"
        )));
    }
    Ok(())
}

pub struct SupplyAggregator {
    donors: Arc<dyn DonorDirectory>,
    hospitals: Arc<dyn HospitalDirectory>,
    ledger: Arc<InventoryLedger>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl SupplyAggregator {
    pub fn new(
        donors: Arc<dyn DonorDirectory>,
        hospitals: Arc<dyn HospitalDirectory>,
        ledger: Arc<InventoryLedger>,
        clock: Arc<dyn Clock>,
        cfg: &CoreConfig,
    ) -> Self {
        Self {
            donors,
            hospitals,
            ledger,
            clock,
            timeout: cfg.collaborator_timeout(),
        }
    }

    /// Available, active donors within `radius_km` of `location`, counted per blood type.
    pub async fn blood_supply_overview(
        &self,
        location: Coordinate,
        radius_km: f64,
    ) -> CoreResult<SupplyOverview> {
        check_radius(radius_km)?;
        let query = DonorQuery::any().near(location, radius_km);
        let donors =
            within(self.timeout, "donor directory", self.donors.find_donors(&query)).await?;
        let now = self.clock.now();

        let mut counts: BTreeMap<BloodType, (usize, usize, usize)> =
            BloodType::ALL.into_iter().map(|t| (t, (0, 0, 0))).collect();
        for donor in &donors {
            let entry = counts.entry(donor.blood_type).or_default();
            entry.0 += 1;
            if donor.is_eligible {
                entry.1 += 1;
            }
            if let Some(last) = donor.last_donation_date {
                if whole_days_since(last, now) / 7 <= RECENT_DONOR_WEEKS {
                    entry.2 += 1;
                }
            }
        }

        let by_blood_type = counts
            .into_iter()
            .map(|(blood_type, (available, eligible, recent))| {
                let status = SupplyStatus::from_eligible(eligible);
                BloodTypeSupply {
                    blood_type,
                    available_donors: available,
                    eligible_donors: eligible,
                    recent_donors: recent,
                    status,
                    status_text: status.status_text(),
                }
            })
            .collect();

        Ok(SupplyOverview {
            location,
            radius_km,
            total_donors: donors.len(),
            by_blood_type,
            last_updated: now,
        })
    }

    /// Inventory of hospitals within `radius_km` of `location`, rolled up per blood type.
    ///
    /// A hospital whose summary cannot be produced is logged and listed in `skipped_hospitals`.
    pub async fn regional_inventory(
        &self,
        location: Coordinate,
        radius_km: f64,
    ) -> CoreResult<RegionalInventory> {
        check_radius(radius_km)?;
        let sites = within(
            self.timeout,
            "hospital directory",
            self.hospitals.find_hospitals(location, radius_km),
        )
        .await?;

        let mut totals: BTreeMap<BloodType, RegionalBloodTypeStock> = BloodType::ALL
            .into_iter()
            .map(|t| {
                (
                    t,
                    RegionalBloodTypeStock {
                        blood_type: t,
                        current_stock: 0,
                        reserved_stock: 0,
                        available_stock: 0,
                        hospitals_low: 0,
                        hospitals_out_of_stock: 0,
                    },
                )
            })
            .collect();
        let mut included = Vec::new();
        let mut skipped = Vec::new();

        for site in sites {
            match self.ledger.hospital_summary(&site.id).await {
                Ok(summary) => {
                    for stock in &summary.by_blood_type {
                        let Some(total) = totals.get_mut(&stock.blood_type) else {
                            continue;
                        };
                        total.current_stock =
                            total.current_stock.saturating_add(stock.current_stock);
                        total.reserved_stock =
                            total.reserved_stock.saturating_add(stock.reserved_stock);
                        total.available_stock =
                            total.available_stock.saturating_add(stock.available_stock);
                        match stock.status {
                            StockStatus::Low => total.hospitals_low += 1,
                            StockStatus::OutOfStock => total.hospitals_out_of_stock += 1,
                            _ => {}
                        }
                    }
                    included.push(site.id);
                }
                Err(e) => {
                    tracing::warn!(
                        hospital_id = %site.id,
                        hospital = %site.name,
                        error = %e,
                        "skipping hospital in regional inventory"
                    );
                    skipped.push(SkippedHospital {
                        hospital_id: site.id,
                        name: site.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(RegionalInventory {
            location,
            radius_km,
            hospitals_included: included,
            skipped_hospitals: skipped,
            by_blood_type: totals.into_values().collect(),
            generated_at: self.clock.now(),
        })
    }
}
