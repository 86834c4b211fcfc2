//! Inventory record and hospital summary bodies.

use chrono::{DateTime, Utc};
use hemo_core::inventory::{
    Alert, BloodTypeStock, ExpiringGroup, ExpiryEntry, HospitalSummary, InventoryKey,
    InventoryRecord, LowStockAlert, Movement, MovementReference, ReferenceKind, StockOptions,
};
use hemo_core::{BloodType, CoreError, CoreResult, RecordId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Parses the `{hospital_id}/{blood_type}` path pair. The blood type may be a slug (`a-pos`).
pub fn inventory_key(hospital_id: &str, blood_type: &str) -> CoreResult<InventoryKey> {
    Ok(InventoryKey::new(
        RecordId::parse(hospital_id)?,
        BloodType::parse(blood_type)?,
    ))
}

/// Body of the add, reserve and release endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockChangeReq {
    pub quantity: u32,
    #[serde(default)]
    pub reason: Option<String>,
    /// `donation`, `request`, `transfer` or `adjustment`. Requires `reference_id`.
    #[serde(default)]
    pub reference_kind: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub performed_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Add only. Recorded as an expiry batch when given together with `expiry_date`.
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl StockChangeReq {
    pub fn to_options(&self) -> CoreResult<StockOptions> {
        let reference = match (&self.reference_kind, &self.reference_id) {
            (Some(kind), Some(id)) => Some(MovementReference {
                kind: kind.parse::<ReferenceKind>()?,
                id: id.clone(),
            }),
            (None, None) => None,
            _ => {
                return Err(CoreError::InvalidInput(
                    "reference_kind and reference_id must be given together".into(),
                ))
            }
        };
        Ok(StockOptions {
            reason: self.reason.clone(),
            reference,
            performed_by: self.performed_by.clone(),
            notes: self.notes.clone(),
            unit_id: self.unit_id.clone(),
            expiry_date: self.expiry_date,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExpiryEntryDto {
    pub unit_id: String,
    pub expiry_date: DateTime<Utc>,
    pub quantity: u32,
    pub status: String,
}

impl From<&ExpiryEntry> for ExpiryEntryDto {
    fn from(e: &ExpiryEntry) -> Self {
        Self {
            unit_id: e.unit_id.clone(),
            expiry_date: e.expiry_date,
            quantity: e.quantity,
            status: e.status.as_str().into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MovementDto {
    pub id: String,
    #[serde(rename = "type")]
    pub movement_type: String,
    /// Signed; releases are negative adjustments.
    pub quantity: i64,
    pub reason: String,
    pub reference_kind: Option<String>,
    pub reference_id: Option<String>,
    pub stock_before: u32,
    pub stock_after: u32,
    pub performed_by: Option<String>,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&Movement> for MovementDto {
    fn from(m: &Movement) -> Self {
        Self {
            id: m.id.to_string(),
            movement_type: m.movement_type.as_str().into(),
            quantity: m.quantity,
            reason: m.reason.clone(),
            reference_kind: m.reference.as_ref().map(|r| r.kind.as_str().to_string()),
            reference_id: m.reference.as_ref().map(|r| r.id.clone()),
            stock_before: m.stock_before,
            stock_after: m.stock_after,
            performed_by: m.performed_by.clone(),
            notes: m.notes.clone(),
            timestamp: m.timestamp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlertDto {
    #[serde(rename = "type")]
    pub alert_type: String,
    pub level: String,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<&Alert> for AlertDto {
    fn from(a: &Alert) -> Self {
        Self {
            alert_type: a.alert_type.as_str().into(),
            level: a.level.as_str().into(),
            message: a.message.clone(),
            triggered_at: a.triggered_at,
            resolved_at: a.resolved_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventoryRecordRes {
    pub hospital_id: String,
    pub blood_type: String,
    pub current_stock: u32,
    pub reserved_stock: u32,
    pub available_stock: u32,
    pub minimum_threshold: u32,
    pub maximum_capacity: u32,
    pub status: String,
    pub expiry_entries: Vec<ExpiryEntryDto>,
    /// Oldest first.
    pub movements: Vec<MovementDto>,
    pub alerts: Vec<AlertDto>,
    pub last_updated: DateTime<Utc>,
}

impl From<&InventoryRecord> for InventoryRecordRes {
    fn from(r: &InventoryRecord) -> Self {
        Self {
            hospital_id: r.hospital_id().to_string(),
            blood_type: r.blood_type().to_string(),
            current_stock: r.current_stock(),
            reserved_stock: r.reserved_stock(),
            available_stock: r.available_stock(),
            minimum_threshold: r.minimum_threshold(),
            maximum_capacity: r.maximum_capacity(),
            status: r.stock_status().as_str().into(),
            expiry_entries: r.expiry_entries().iter().map(Into::into).collect(),
            movements: r.movements().iter().map(Into::into).collect(),
            alerts: r.alerts().iter().map(Into::into).collect(),
            last_updated: r.last_updated(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BloodTypeStockDto {
    pub blood_type: String,
    pub current_stock: u32,
    pub reserved_stock: u32,
    pub available_stock: u32,
    pub minimum_threshold: u32,
    pub maximum_capacity: u32,
    pub status: String,
}

impl From<&BloodTypeStock> for BloodTypeStockDto {
    fn from(s: &BloodTypeStock) -> Self {
        Self {
            blood_type: s.blood_type.to_string(),
            current_stock: s.current_stock,
            reserved_stock: s.reserved_stock,
            available_stock: s.available_stock,
            minimum_threshold: s.minimum_threshold,
            maximum_capacity: s.maximum_capacity,
            status: s.status.as_str().into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LowStockAlertDto {
    pub blood_type: String,
    pub available_stock: u32,
    pub threshold: u32,
    pub level: String,
}

impl From<&LowStockAlert> for LowStockAlertDto {
    fn from(a: &LowStockAlert) -> Self {
        Self {
            blood_type: a.blood_type.to_string(),
            available_stock: a.available_stock,
            threshold: a.threshold,
            level: a.level.as_str().into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExpiringGroupDto {
    pub blood_type: String,
    pub batches: usize,
    pub units: u32,
    pub earliest_expiry: DateTime<Utc>,
}

impl From<&ExpiringGroup> for ExpiringGroupDto {
    fn from(g: &ExpiringGroup) -> Self {
        Self {
            blood_type: g.blood_type.to_string(),
            batches: g.batches,
            units: g.units,
            earliest_expiry: g.earliest_expiry,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HospitalSummaryRes {
    pub hospital_id: String,
    pub total_stock: u32,
    pub total_reserved: u32,
    pub total_available: u32,
    pub by_blood_type: Vec<BloodTypeStockDto>,
    pub low_stock_alerts: Vec<LowStockAlertDto>,
    pub expiring_soon: Vec<ExpiringGroupDto>,
    /// Blood types whose record could not be read.
    pub skipped_blood_types: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl From<&HospitalSummary> for HospitalSummaryRes {
    fn from(s: &HospitalSummary) -> Self {
        Self {
            hospital_id: s.hospital_id.to_string(),
            total_stock: s.total_stock,
            total_reserved: s.total_reserved,
            total_available: s.total_available,
            by_blood_type: s.by_blood_type.iter().map(Into::into).collect(),
            low_stock_alerts: s.low_stock_alerts.iter().map(Into::into).collect(),
            expiring_soon: s.expiring_soon.iter().map(Into::into).collect(),
            skipped_blood_types: s.skipped_blood_types.iter().map(ToString::to_string).collect(),
            generated_at: s.generated_at,
        }
    }
}
