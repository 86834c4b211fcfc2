//! The per-hospital, per-blood-type inventory record and its audit types.

use crate::config::StockDefaults;
use crate::constants::{
    DEFAULT_ADD_REASON, DEFAULT_RELEASE_REASON, DEFAULT_RESERVE_REASON, EXPIRY_WARNING_DAYS,
};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};
use hemo_types::BloodType;
use hemo_uuid::{RecordId, TimestampId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies exactly one inventory record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InventoryKey {
    pub hospital_id: RecordId,
    pub blood_type: BloodType,
}

impl InventoryKey {
    pub fn new(hospital_id: RecordId, blood_type: BloodType) -> Self {
        Self {
            hospital_id,
            blood_type,
        }
    }
}

impl fmt::Display for InventoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.hospital_id, self.blood_type)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Available,
    Reserved,
    Used,
    Expired,
}

impl UnitStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Used => "used",
            Self::Expired => "expired",
        }
    }
}

/// A batch of units sharing an expiry date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpiryEntry {
    pub unit_id: String,
    pub expiry_date: DateTime<Utc>,
    pub quantity: u32,
    pub status: UnitStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
    Expiry,
    Discard,
}

impl MovementType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Adjustment => "adjustment",
            Self::Expiry => "expiry",
            Self::Discard => "discard",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Donation,
    Request,
    Transfer,
    Adjustment,
}

impl ReferenceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Donation => "donation",
            Self::Request => "request",
            Self::Transfer => "transfer",
            Self::Adjustment => "adjustment",
        }
    }
}

impl FromStr for ReferenceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "donation" => Ok(Self::Donation),
            "request" => Ok(Self::Request),
            "transfer" => Ok(Self::Transfer),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(CoreError::InvalidInput(format!(
                "unknown movement reference kind: {other}"
            ))),
        }
    }
}

/// What caused a movement, e.g. the donation that brought units in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementReference {
    pub kind: ReferenceKind,
    pub id: String,
}

/// Immutable audit record of one stock-affecting event.
///
/// `stock_before`/`stock_after` track `current_stock`; reservations leave it unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: TimestampId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<MovementReference>,
    pub stock_before: u32,
    pub stock_after: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    ExpiringSoon,
    Overstock,
    ThresholdBreach,
}

impl AlertType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LowStock => "low_stock",
            Self::ExpiringSoon => "expiring_soon",
            Self::Overstock => "overstock",
            Self::ThresholdBreach => "threshold_breach",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl AlertLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub level: AlertLevel,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Low,
    Good,
    Adequate,
    Full,
}

impl StockStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutOfStock => "out_of_stock",
            Self::Low => "low",
            Self::Good => "good",
            Self::Adequate => "adequate",
            Self::Full => "full",
        }
    }
}

/// Optional details attached to a stock mutation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StockOptions {
    pub reason: Option<String>,
    pub reference: Option<MovementReference>,
    pub performed_by: Option<String>,
    pub notes: Option<String>,
    /// Recorded as an expiry entry only together with `expiry_date`.
    pub unit_id: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl StockOptions {
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// Stock for one hospital and blood type.
///
/// Fields are private: the record is only changed through the ledger's add, reserve and release
/// operations, each of which appends exactly one movement. Available stock is derived on every
/// read and never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord")]
pub struct InventoryRecord {
    hospital_id: RecordId,
    blood_type: BloodType,
    current_stock: u32,
    reserved_stock: u32,
    minimum_threshold: u32,
    maximum_capacity: u32,
    expiry_entries: Vec<ExpiryEntry>,
    movements: Vec<Movement>,
    alerts: Vec<Alert>,
    last_updated: DateTime<Utc>,
}

#[derive(Deserialize)]
struct StoredRecord {
    hospital_id: RecordId,
    blood_type: BloodType,
    current_stock: u32,
    reserved_stock: u32,
    minimum_threshold: u32,
    maximum_capacity: u32,
    #[serde(default)]
    expiry_entries: Vec<ExpiryEntry>,
    #[serde(default)]
    movements: Vec<Movement>,
    #[serde(default)]
    alerts: Vec<Alert>,
    last_updated: DateTime<Utc>,
}

impl TryFrom<StoredRecord> for InventoryRecord {
    type Error = String;

    fn try_from(raw: StoredRecord) -> Result<Self, Self::Error> {
        if raw.reserved_stock > raw.current_stock {
            return Err(format!(
                "reserved stock {} exceeds current stock {}",
                raw.reserved_stock, raw.current_stock
            ));
        }
        if raw.movements.windows(2).any(|w| w[0].id >= w[1].id) {
            return Err("movement ids are not strictly increasing".into());
        }
        Ok(Self {
            hospital_id: raw.hospital_id,
            blood_type: raw.blood_type,
            current_stock: raw.current_stock,
            reserved_stock: raw.reserved_stock,
            minimum_threshold: raw.minimum_threshold,
            maximum_capacity: raw.maximum_capacity,
            expiry_entries: raw.expiry_entries,
            movements: raw.movements,
            alerts: raw.alerts,
            last_updated: raw.last_updated,
        })
    }
}

fn positive(quantity: u32) -> CoreResult<()> {
    if quantity == 0 {
        return Err(CoreError::InvalidInput(
            "quantity must be greater than zero".into(),
        ));
    }
    Ok(())
}

impl InventoryRecord {
    /// An empty record, as created on the first stock addition for a key.
    pub fn new(key: InventoryKey, defaults: StockDefaults, now: DateTime<Utc>) -> Self {
        Self {
            hospital_id: key.hospital_id,
            blood_type: key.blood_type,
            current_stock: 0,
            reserved_stock: 0,
            minimum_threshold: defaults.minimum_threshold,
            maximum_capacity: defaults.maximum_capacity,
            expiry_entries: Vec::new(),
            movements: Vec::new(),
            alerts: Vec::new(),
            last_updated: now,
        }
    }

    pub fn key(&self) -> InventoryKey {
        InventoryKey::new(self.hospital_id.clone(), self.blood_type)
    }

    pub fn hospital_id(&self) -> &RecordId {
        &self.hospital_id
    }

    pub fn blood_type(&self) -> BloodType {
        self.blood_type
    }

    pub fn current_stock(&self) -> u32 {
        self.current_stock
    }

    pub fn reserved_stock(&self) -> u32 {
        self.reserved_stock
    }

    pub fn available_stock(&self) -> u32 {
        self.current_stock.saturating_sub(self.reserved_stock)
    }

    pub fn minimum_threshold(&self) -> u32 {
        self.minimum_threshold
    }

    pub fn maximum_capacity(&self) -> u32 {
        self.maximum_capacity
    }

    pub fn expiry_entries(&self) -> &[ExpiryEntry] {
        &self.expiry_entries
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn open_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| a.is_open())
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn stock_status(&self) -> StockStatus {
        let available = self.available_stock();
        if available == 0 {
            return StockStatus::OutOfStock;
        }
        if available <= self.minimum_threshold {
            return StockStatus::Low;
        }
        let percentage = f64::from(available) / f64::from(self.maximum_capacity.max(1)) * 100.0;
        if percentage >= 90.0 {
            StockStatus::Full
        } else if percentage >= 70.0 {
            StockStatus::Adequate
        } else {
            StockStatus::Good
        }
    }

    /// Available expiry entries that expire on or before `now + 7 days`.
    pub fn expiring_soon(&self, now: DateTime<Utc>) -> Vec<&ExpiryEntry> {
        let horizon = now + Duration::days(EXPIRY_WARNING_DAYS);
        self.expiry_entries
            .iter()
            .filter(|e| e.status == UnitStatus::Available && e.expiry_date <= horizon)
            .collect()
    }

    pub(crate) fn apply_add(
        &mut self,
        quantity: u32,
        opts: StockOptions,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        positive(quantity)?;
        let before = self.current_stock;
        let after = before.checked_add(quantity).ok_or_else(|| {
            CoreError::InvalidInput(format!("adding {quantity} units would overflow stock"))
        })?;

        self.current_stock = after;
        if let (Some(unit_id), Some(expiry_date)) = (opts.unit_id.clone(), opts.expiry_date) {
            self.expiry_entries.push(ExpiryEntry {
                unit_id,
                expiry_date,
                quantity,
                status: UnitStatus::Available,
            });
        }
        self.push_movement(
            MovementType::In,
            i64::from(quantity),
            DEFAULT_ADD_REASON,
            opts,
            before,
            now,
        );
        self.finish_mutation(now);
        Ok(())
    }

    pub(crate) fn apply_reserve(
        &mut self,
        quantity: u32,
        opts: StockOptions,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        positive(quantity)?;
        let available = self.available_stock();
        if available < quantity {
            return Err(CoreError::InsufficientStock {
                available,
                requested: quantity,
            });
        }

        self.reserved_stock += quantity;
        let stock = self.current_stock;
        self.push_movement(
            MovementType::Out,
            i64::from(quantity),
            DEFAULT_RESERVE_REASON,
            opts,
            stock,
            now,
        );
        self.finish_mutation(now);
        Ok(())
    }

    pub(crate) fn apply_release(
        &mut self,
        quantity: u32,
        opts: StockOptions,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        positive(quantity)?;
        if self.reserved_stock < quantity {
            return Err(CoreError::InsufficientReservedStock {
                reserved: self.reserved_stock,
                requested: quantity,
            });
        }

        self.reserved_stock -= quantity;
        let stock = self.current_stock;
        self.push_movement(
            MovementType::Adjustment,
            -i64::from(quantity),
            DEFAULT_RELEASE_REASON,
            opts,
            stock,
            now,
        );
        self.finish_mutation(now);
        Ok(())
    }

    fn push_movement(
        &mut self,
        movement_type: MovementType,
        quantity: i64,
        default_reason: &str,
        opts: StockOptions,
        stock_before: u32,
        now: DateTime<Utc>,
    ) {
        let id = TimestampId::generate(now, self.movements.last().map(|m| &m.id));
        let reason = opts
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| default_reason.to_string());

        self.movements.push(Movement {
            id,
            movement_type,
            quantity,
            reason,
            reference: opts.reference,
            stock_before,
            stock_after: self.current_stock,
            performed_by: opts.performed_by,
            notes: opts.notes,
            timestamp: now,
        });
    }

    fn finish_mutation(&mut self, now: DateTime<Utc>) {
        self.refresh_alerts(now);
        self.last_updated = now;
    }

    fn wanted_alerts(&self, now: DateTime<Utc>) -> Vec<(AlertType, AlertLevel, String)> {
        let available = self.available_stock();
        let mut wanted = Vec::new();

        if available == 0 {
            wanted.push((
                AlertType::ThresholdBreach,
                AlertLevel::Critical,
                format!("{} is out of stock", self.blood_type),
            ));
        } else if available <= self.minimum_threshold {
            wanted.push((
                AlertType::LowStock,
                AlertLevel::Warning,
                format!(
                    "{} stock is low: {} available, threshold {}",
                    self.blood_type, available, self.minimum_threshold
                ),
            ));
        }

        if self.current_stock > self.maximum_capacity {
            wanted.push((
                AlertType::Overstock,
                AlertLevel::Info,
                format!(
                    "{} stock {} exceeds capacity {}",
                    self.blood_type, self.current_stock, self.maximum_capacity
                ),
            ));
        }

        let expiring = self.expiring_soon(now);
        if !expiring.is_empty() {
            let units: u32 = expiring.iter().map(|e| e.quantity).sum();
            wanted.push((
                AlertType::ExpiringSoon,
                AlertLevel::Warning,
                format!(
                    "{} units of {} expire within {} days",
                    units, self.blood_type, EXPIRY_WARNING_DAYS
                ),
            ));
        }

        wanted
    }

    /// Opens alerts whose condition holds and resolves open alerts whose condition cleared.
    ///
    /// At most one alert per type is open at a time; resolved alerts are kept.
    pub(crate) fn refresh_alerts(&mut self, now: DateTime<Utc>) {
        let wanted = self.wanted_alerts(now);

        for alert in self.alerts.iter_mut().filter(|a| a.is_open()) {
            if !wanted.iter().any(|(t, _, _)| *t == alert.alert_type) {
                alert.resolved_at = Some(now);
            }
        }

        for (alert_type, level, message) in wanted {
            let already_open = self
                .alerts
                .iter()
                .any(|a| a.is_open() && a.alert_type == alert_type);
            if !already_open {
                self.alerts.push(Alert {
                    alert_type,
                    level,
                    message,
                    triggered_at: now,
                    resolved_at: None,
                });
            }
        }
    }
}
