//! Completed-donation handling.
//!
//! A completed donation touches two collaborators: units go into the hospital's inventory, and
//! the donor's profile gets a new last-donation date. The inventory step runs first; if it fails
//! nothing has changed. If the profile step fails afterwards the stock stays added and the
//! outcome says so, so the caller can call [`DonationCoordinator::retry_profile_update`].

use crate::config::CoreConfig;
use crate::constants::{DONATION_INTERVAL_DAYS, MAX_DONATION_UNITS, MIN_DONATION_UNITS};
use crate::deadline::within;
use crate::directory::DonorRegistry;
use crate::inventory::{
    InventoryKey, InventoryLedger, InventoryRecord, MovementReference, ReferenceKind,
    StockOptions,
};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};
use hemo_types::BloodType;
use hemo_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DonationCompleted {
    pub donation_id: RecordId,
    pub donor_id: RecordId,
    pub hospital_id: RecordId,
    pub blood_type: BloodType,
    pub units: u32,
    pub donated_at: DateTime<Utc>,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub performed_by: Option<String>,
}

impl DonationCompleted {
    pub fn next_eligible_date(&self) -> DateTime<Utc> {
        self.donated_at + Duration::days(DONATION_INTERVAL_DAYS)
    }

    fn validate(&self) -> CoreResult<()> {
        if !(MIN_DONATION_UNITS..=MAX_DONATION_UNITS).contains(&self.units) {
            return Err(CoreError::InvalidInput(format!(
                "donation units must be between {MIN_DONATION_UNITS} and {MAX_DONATION_UNITS}, got {}",
                self.units
            )));
        }
        if let Some(expiry) = self.expiry_date {
            if expiry <= self.donated_at {
                return Err(CoreError::InvalidInput(
                    "expiry date must be after the donation date".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum ProfileUpdate {
    Applied,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DonationOutcome {
    pub inventory: InventoryRecord,
    pub profile_update: ProfileUpdate,
    pub next_eligible_date: DateTime<Utc>,
}

pub struct DonationCoordinator {
    ledger: Arc<InventoryLedger>,
    registry: Arc<dyn DonorRegistry>,
    timeout: std::time::Duration,
}

impl DonationCoordinator {
    pub fn new(
        ledger: Arc<InventoryLedger>,
        registry: Arc<dyn DonorRegistry>,
        cfg: &CoreConfig,
    ) -> Self {
        Self {
            ledger,
            registry,
            timeout: cfg.collaborator_timeout(),
        }
    }

    /// Adds the donated units to stock, then records the donation on the donor's profile.
    ///
    /// # Errors
    ///
    /// Validation and inventory failures are returned and leave everything unchanged. A profile
    /// failure is not an error; it is reported in [`DonationOutcome::profile_update`].
    pub async fn handle(&self, event: &DonationCompleted) -> CoreResult<DonationOutcome> {
        event.validate()?;

        let opts = StockOptions {
            reason: Some(format!("Donation {}", event.donation_id)),
            reference: Some(MovementReference {
                kind: ReferenceKind::Donation,
                id: event.donation_id.to_string(),
            }),
            performed_by: event.performed_by.clone(),
            notes: None,
            unit_id: event.unit_id.clone(),
            expiry_date: event.expiry_date,
        };
        let key = InventoryKey::new(event.hospital_id.clone(), event.blood_type);
        let inventory = self.ledger.add_stock(key, event.units, opts).await?;

        let profile_update = match self.retry_profile_update(event).await {
            Ok(()) => ProfileUpdate::Applied,
            Err(e) => {
                tracing::error!(
                    donation_id = %event.donation_id,
                    donor_id = %event.donor_id,
                    error = %e,
                    "stock added but donor profile update failed"
                );
                ProfileUpdate::Failed(e.to_string())
            }
        };

        Ok(DonationOutcome {
            inventory,
            profile_update,
            next_eligible_date: event.next_eligible_date(),
        })
    }

    /// Records the donation on the donor's profile. Safe to repeat.
    pub async fn retry_profile_update(&self, event: &DonationCompleted) -> CoreResult<()> {
        event.validate()?;
        within(
            self.timeout,
            "donor registry",
            self.registry.record_donation(
                &event.donor_id,
                event.donated_at,
                event.next_eligible_date(),
            ),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::directory::{DonorCandidate, InMemoryDirectory};
    use crate::inventory::{MemoryInventoryStore, MovementType};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use hemo_types::Coordinate;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn donated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 10, 30, 0).unwrap()
    }

    fn ledger() -> Arc<InventoryLedger> {
        Arc::new(InventoryLedger::new(
            Arc::new(MemoryInventoryStore::new()),
            Arc::new(FixedClock(donated_at())),
            &CoreConfig::default(),
        ))
    }

    fn event(donor_id: RecordId, units: u32) -> DonationCompleted {
        DonationCompleted {
            donation_id: RecordId::new(),
            donor_id,
            hospital_id: RecordId::new(),
            blood_type: BloodType::OPos,
            units,
            donated_at: donated_at(),
            unit_id: Some("BAG-77".into()),
            expiry_date: Some(donated_at() + Duration::days(42)),
            performed_by: Some("phlebotomist".into()),
        }
    }

    fn directory_with_donor() -> (Arc<InMemoryDirectory>, RecordId) {
        let dir = Arc::new(InMemoryDirectory::new());
        let id = RecordId::new();
        dir.insert_donor(DonorCandidate {
            id: id.clone(),
            name: "Kemi".into(),
            blood_type: BloodType::OPos,
            location: Coordinate::new(6.5, 3.4).unwrap(),
            last_donation_date: None,
            donation_count: 2,
            is_eligible: true,
            is_available: true,
        })
        .unwrap();
        (dir, id)
    }

    #[tokio::test]
    async fn test_donation_adds_stock_and_updates_profile() {
        let (dir, donor_id) = directory_with_donor();
        let coordinator = DonationCoordinator::new(ledger(), dir.clone(), &CoreConfig::default());
        let ev = event(donor_id.clone(), 2);

        let outcome = coordinator.handle(&ev).await.unwrap();

        assert_eq!(outcome.profile_update, ProfileUpdate::Applied);
        assert_eq!(outcome.inventory.current_stock(), 2);
        assert_eq!(outcome.inventory.expiry_entries().len(), 1);
        let movement = &outcome.inventory.movements()[0];
        assert_eq!(movement.movement_type, MovementType::In);
        assert_eq!(
            movement.reference.as_ref().map(|r| r.kind),
            Some(ReferenceKind::Donation)
        );
        assert_eq!(outcome.next_eligible_date, donated_at() + Duration::days(56));

        let user = dir.user(&donor_id).unwrap().unwrap();
        assert_eq!(user.candidate.donation_count, 3);
        assert_eq!(user.next_eligible_date, Some(outcome.next_eligible_date));
    }

    #[tokio::test]
    async fn test_invalid_units_rejected_before_side_effects() {
        let (dir, donor_id) = directory_with_donor();
        let ledger = ledger();
        let coordinator =
            DonationCoordinator::new(ledger.clone(), dir.clone(), &CoreConfig::default());

        for units in [0, 3] {
            let ev = event(donor_id.clone(), units);
            let result = coordinator.handle(&ev).await;
            assert!(matches!(result, Err(CoreError::InvalidInput(_))));
            let key = InventoryKey::new(ev.hospital_id.clone(), ev.blood_type);
            assert!(matches!(ledger.record(&key).await, Err(CoreError::NotFound(_))));
        }
        assert_eq!(dir.user(&donor_id).unwrap().unwrap().candidate.donation_count, 2);
    }

    struct FlakyRegistry {
        inner: Arc<InMemoryDirectory>,
        down: AtomicBool,
    }

    #[async_trait]
    impl DonorRegistry for FlakyRegistry {
        async fn record_donation(
            &self,
            donor_id: &RecordId,
            donated_at: DateTime<Utc>,
            next_eligible: DateTime<Utc>,
        ) -> CoreResult<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(CoreError::Collaborator("profile service unavailable".into()));
            }
            self.inner.record_donation(donor_id, donated_at, next_eligible).await
        }
    }

    #[tokio::test]
    async fn test_profile_failure_is_reported_and_retry_is_idempotent() {
        let (dir, donor_id) = directory_with_donor();
        let registry = Arc::new(FlakyRegistry {
            inner: dir.clone(),
            down: AtomicBool::new(true),
        });
        let coordinator =
            DonationCoordinator::new(ledger(), registry.clone(), &CoreConfig::default());
        let ev = event(donor_id.clone(), 1);

        let outcome = coordinator.handle(&ev).await.unwrap();
        assert!(matches!(outcome.profile_update, ProfileUpdate::Failed(_)));
        assert_eq!(outcome.inventory.current_stock(), 1);

        registry.down.store(false, Ordering::SeqCst);
        coordinator.retry_profile_update(&ev).await.unwrap();
        coordinator.retry_profile_update(&ev).await.unwrap();
        assert_eq!(dir.user(&donor_id).unwrap().unwrap().candidate.donation_count, 3);
    }
}
