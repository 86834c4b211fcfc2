//! Atomic stock operations over an [`InventoryStore`].
//!
//! Every mutation runs under a per-(hospital, blood type) async lock held across
//! load -> check -> mutate -> save. The mutation is applied to an owned copy and the store only
//! ever receives the complete record, so a failed check, a failed save or a load timeout leaves
//! the persisted record unchanged.
//!
//! The save itself is never abandoned. It runs as its own task; if it outlives the collaborator
//! timeout the key lock stays held until it settles and the caller gets its real outcome.
//!
//! The lock is process-local. Running several processes against one store needs a store with a
//! conditional update.

use super::record::{
    AlertLevel, InventoryKey, InventoryRecord, StockOptions, StockStatus,
};
use super::store::InventoryStore;
use crate::clock::Clock;
use crate::config::{CoreConfig, StockDefaults};
use crate::deadline::within;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use hemo_types::BloodType;
use hemo_uuid::RecordId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

const STORE: &str = "inventory store";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    Add,
    Reserve,
    Release,
}

impl Operation {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Reserve => "reserve",
            Self::Release => "release",
        }
    }
}

/// Stock figures for one blood type within a hospital summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BloodTypeStock {
    pub blood_type: BloodType,
    pub current_stock: u32,
    pub reserved_stock: u32,
    pub available_stock: u32,
    pub minimum_threshold: u32,
    pub maximum_capacity: u32,
    pub status: StockStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LowStockAlert {
    pub blood_type: BloodType,
    pub available_stock: u32,
    pub threshold: u32,
    pub level: AlertLevel,
}

/// Available units of one blood type expiring within the warning window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExpiringGroup {
    pub blood_type: BloodType,
    /// Number of expiry entries.
    pub batches: usize,
    pub units: u32,
    pub earliest_expiry: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HospitalSummary {
    pub hospital_id: RecordId,
    pub total_stock: u32,
    pub total_reserved: u32,
    pub total_available: u32,
    pub by_blood_type: Vec<BloodTypeStock>,
    pub low_stock_alerts: Vec<LowStockAlert>,
    pub expiring_soon: Vec<ExpiringGroup>,
    /// Records that could not be read; they are not reflected in the totals.
    pub skipped_blood_types: Vec<BloodType>,
    pub generated_at: DateTime<Utc>,
}

pub struct InventoryLedger {
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
    defaults: StockDefaults,
    timeout: Duration,
    /// One entry per key ever mutated. Never evicted; bounded by hospitals x 8 blood types.
    locks: Mutex<HashMap<InventoryKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn InventoryStore>, clock: Arc<dyn Clock>, cfg: &CoreConfig) -> Self {
        Self {
            store,
            clock,
            defaults: cfg.stock_defaults(),
            timeout: cfg.collaborator_timeout(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, key: &InventoryKey) -> CoreResult<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| CoreError::Collaborator("inventory lock table poisoned".into()))?;
        Ok(locks.entry(key.clone()).or_default().clone())
    }

    async fn load(&self, key: &InventoryKey) -> CoreResult<Option<InventoryRecord>> {
        within(self.timeout, STORE, self.store.load(key)).await
    }

    /// Saves `record` in a task that owns the key guard, so the key stays locked until the save
    /// settles even if the caller stops waiting.
    async fn commit(&self, record: &InventoryRecord, guard: OwnedMutexGuard<()>) -> CoreResult<()> {
        let store = Arc::clone(&self.store);
        let staged = record.clone();
        let mut task = tokio::spawn(async move {
            let _guard = guard;
            store.save(&staged).await
        });

        let joined = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(
                    hospital_id = %record.hospital_id(),
                    blood_type = %record.blood_type(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "inventory save outlived timeout; waiting for it to settle"
                );
                task.await
            }
        };
        joined.map_err(|e| CoreError::Collaborator(format!("inventory save task failed: {e}")))?
    }

    async fn mutate(
        &self,
        op: Operation,
        key: InventoryKey,
        quantity: u32,
        opts: StockOptions,
    ) -> CoreResult<InventoryRecord> {
        if quantity == 0 {
            return Err(CoreError::InvalidInput(
                "quantity must be greater than zero".into(),
            ));
        }

        let lock = self.lock_for(&key)?;
        let guard = lock.lock_owned().await;

        let now = self.clock.now();
        let mut record = match (self.load(&key).await?, op) {
            (Some(record), _) => record,
            (None, Operation::Add) => InventoryRecord::new(key.clone(), self.defaults, now),
            (None, _) => {
                return Err(CoreError::NotFound(format!("inventory record {key}")));
            }
        };

        match op {
            Operation::Add => record.apply_add(quantity, opts, now)?,
            Operation::Reserve => record.apply_reserve(quantity, opts, now)?,
            Operation::Release => record.apply_release(quantity, opts, now)?,
        }

        self.commit(&record, guard).await?;

        tracing::info!(
            hospital_id = %key.hospital_id,
            blood_type = %key.blood_type,
            operation = op.as_str(),
            quantity,
            current_stock = record.current_stock(),
            reserved_stock = record.reserved_stock(),
            available_stock = record.available_stock(),
            "inventory updated"
        );
        Ok(record)
    }

    /// Adds `quantity` units, creating the record on first use.
    pub async fn add_stock(
        &self,
        key: InventoryKey,
        quantity: u32,
        opts: StockOptions,
    ) -> CoreResult<InventoryRecord> {
        self.mutate(Operation::Add, key, quantity, opts).await
    }

    /// Reserves `quantity` available units.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InsufficientStock`] if fewer than `quantity` units are available.
    /// - [`CoreError::NotFound`] if the record does not exist.
    pub async fn reserve_stock(
        &self,
        key: InventoryKey,
        quantity: u32,
        opts: StockOptions,
    ) -> CoreResult<InventoryRecord> {
        self.mutate(Operation::Reserve, key, quantity, opts).await
    }

    /// Returns `quantity` reserved units to available stock.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InsufficientReservedStock`] if fewer than `quantity` units are reserved.
    /// - [`CoreError::NotFound`] if the record does not exist.
    pub async fn release_reserved_stock(
        &self,
        key: InventoryKey,
        quantity: u32,
        opts: StockOptions,
    ) -> CoreResult<InventoryRecord> {
        self.mutate(Operation::Release, key, quantity, opts).await
    }

    pub async fn record(&self, key: &InventoryKey) -> CoreResult<InventoryRecord> {
        self.load(key)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("inventory record {key}")))
    }

    pub async fn stock_status(&self, key: &InventoryKey) -> CoreResult<StockStatus> {
        Ok(self.record(key).await?.stock_status())
    }

    /// Totals, per-type figures, low-stock alerts and expiring units for one hospital.
    ///
    /// A record that fails to load is logged and listed in `skipped_blood_types`.
    pub async fn hospital_summary(&self, hospital_id: &RecordId) -> CoreResult<HospitalSummary> {
        let keys = within(self.timeout, STORE, self.store.keys_for_hospital(hospital_id)).await?;
        let now = self.clock.now();

        let mut summary = HospitalSummary {
            hospital_id: hospital_id.clone(),
            total_stock: 0,
            total_reserved: 0,
            total_available: 0,
            by_blood_type: Vec::new(),
            low_stock_alerts: Vec::new(),
            expiring_soon: Vec::new(),
            skipped_blood_types: Vec::new(),
            generated_at: now,
        };

        for key in keys {
            let record = match self.load(&key).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(
                        hospital_id = %hospital_id,
                        blood_type = %key.blood_type,
                        error = %e,
                        "skipping unreadable inventory record"
                    );
                    summary.skipped_blood_types.push(key.blood_type);
                    continue;
                }
            };
            add_to_summary(&mut summary, &record, now);
        }

        Ok(summary)
    }
}

fn add_to_summary(summary: &mut HospitalSummary, record: &InventoryRecord, now: DateTime<Utc>) {
    let available = record.available_stock();
    summary.total_stock = summary.total_stock.saturating_add(record.current_stock());
    summary.total_reserved = summary.total_reserved.saturating_add(record.reserved_stock());
    summary.total_available = summary.total_available.saturating_add(available);

    summary.by_blood_type.push(BloodTypeStock {
        blood_type: record.blood_type(),
        current_stock: record.current_stock(),
        reserved_stock: record.reserved_stock(),
        available_stock: available,
        minimum_threshold: record.minimum_threshold(),
        maximum_capacity: record.maximum_capacity(),
        status: record.stock_status(),
    });

    if available <= record.minimum_threshold() {
        summary.low_stock_alerts.push(LowStockAlert {
            blood_type: record.blood_type(),
            available_stock: available,
            threshold: record.minimum_threshold(),
            level: if available == 0 {
                AlertLevel::Critical
            } else {
                AlertLevel::Warning
            },
        });
    }

    let expiring = record.expiring_soon(now);
    if let Some(earliest_expiry) = expiring.iter().map(|e| e.expiry_date).min() {
        summary.expiring_soon.push(ExpiringGroup {
            blood_type: record.blood_type(),
            batches: expiring.len(),
            units: expiring.iter().map(|e| e.quantity).sum(),
            earliest_expiry,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::inventory::record::{MovementReference, MovementType, ReferenceKind};
    use crate::inventory::store::MemoryInventoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn hospital() -> RecordId {
        RecordId::parse("11111111111111111111111111111111").unwrap()
    }

    fn key(blood_type: BloodType) -> InventoryKey {
        InventoryKey::new(hospital(), blood_type)
    }

    fn ledger_with(store: Arc<dyn InventoryStore>) -> InventoryLedger {
        InventoryLedger::new(store, Arc::new(FixedClock(now())), &CoreConfig::default())
    }

    fn ledger() -> InventoryLedger {
        ledger_with(Arc::new(MemoryInventoryStore::new()))
    }

    #[tokio::test]
    async fn test_add_creates_record_with_defaults() {
        let ledger = ledger();
        let opts = StockOptions {
            reference: Some(MovementReference {
                kind: ReferenceKind::Donation,
                id: "d-1".into(),
            }),
            performed_by: Some("nurse".into()),
            ..StockOptions::default()
        };
        let record = ledger.add_stock(key(BloodType::APos), 8, opts).await.unwrap();

        assert_eq!(record.current_stock(), 8);
        assert_eq!(record.minimum_threshold(), 5);
        assert_eq!(record.maximum_capacity(), 50);
        let movement = &record.movements()[0];
        assert_eq!(movement.movement_type, MovementType::In);
        assert_eq!(movement.reason, "Stock addition");
        assert_eq!((movement.stock_before, movement.stock_after), (0, 8));
        assert_eq!(movement.performed_by.as_deref(), Some("nurse"));
    }

    #[tokio::test]
    async fn test_reserve_and_release_on_missing_record() {
        let ledger = ledger();
        let reserve = ledger
            .reserve_stock(key(BloodType::BNeg), 1, StockOptions::default())
            .await;
        assert!(matches!(reserve, Err(CoreError::NotFound(_))));
        let release = ledger
            .release_reserved_stock(key(BloodType::BNeg), 1, StockOptions::default())
            .await;
        assert!(matches!(release, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_scenario_reserve_five_of_eight_available() {
        let ledger = ledger();
        let k = key(BloodType::OPos);
        ledger.add_stock(k.clone(), 10, StockOptions::default()).await.unwrap();
        ledger.reserve_stock(k.clone(), 2, StockOptions::default()).await.unwrap();

        let record = ledger.reserve_stock(k.clone(), 5, StockOptions::default()).await.unwrap();
        assert_eq!(record.reserved_stock(), 7);
        assert_eq!(record.available_stock(), 3);
        assert_eq!(record.movements().len(), 3);
        let last = record.movements().last().unwrap();
        assert_eq!(last.movement_type, MovementType::Out);
        assert_eq!(last.quantity, 5);
    }

    #[tokio::test]
    async fn test_failed_reserve_and_release_change_nothing() {
        let ledger = ledger();
        let k = key(BloodType::ANeg);
        ledger.add_stock(k.clone(), 4, StockOptions::default()).await.unwrap();
        let before = ledger.record(&k).await.unwrap();

        let reserve = ledger.reserve_stock(k.clone(), 5, StockOptions::default()).await;
        assert!(matches!(
            reserve,
            Err(CoreError::InsufficientStock {
                available: 4,
                requested: 5
            })
        ));
        let release = ledger
            .release_reserved_stock(k.clone(), 1, StockOptions::default())
            .await;
        assert!(matches!(
            release,
            Err(CoreError::InsufficientReservedStock {
                reserved: 0,
                requested: 1
            })
        ));

        assert_eq!(ledger.record(&k).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected_before_store_access() {
        let ledger = ledger();
        let result = ledger.add_stock(key(BloodType::APos), 0, StockOptions::default()).await;
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
        assert!(matches!(
            ledger.record(&key(BloodType::APos)).await,
            Err(CoreError::NotFound(_))
        ));
    }

    /// Yields between load and save so concurrent operations interleave without the key lock.
    struct YieldingStore(MemoryInventoryStore);

    #[async_trait]
    impl InventoryStore for YieldingStore {
        async fn load(&self, key: &InventoryKey) -> CoreResult<Option<InventoryRecord>> {
            let record = self.0.load(key).await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            record
        }

        async fn save(&self, record: &InventoryRecord) -> CoreResult<()> {
            tokio::task::yield_now().await;
            self.0.save(record).await
        }

        async fn keys_for_hospital(&self, id: &RecordId) -> CoreResult<Vec<InventoryKey>> {
            self.0.keys_for_hospital(id).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_cannot_oversell() {
        let ledger = Arc::new(ledger_with(Arc::new(YieldingStore(MemoryInventoryStore::new()))));
        let k = key(BloodType::AbNeg);
        ledger.add_stock(k.clone(), 5, StockOptions::default()).await.unwrap();

        let a = tokio::spawn({
            let ledger = ledger.clone();
            let k = k.clone();
            async move { ledger.reserve_stock(k, 3, StockOptions::default()).await }
        });
        let b = tokio::spawn({
            let ledger = ledger.clone();
            let k = k.clone();
            async move { ledger.reserve_stock(k, 3, StockOptions::default()).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let insufficient = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(CoreError::InsufficientStock {
                        available: 2,
                        requested: 3
                    })
                )
            })
            .count();
        assert_eq!((successes, insufficient), (1, 1));

        let record = ledger.record(&k).await.unwrap();
        assert_eq!(record.reserved_stock(), 3);
        assert_eq!(record.movements().len(), 2);
    }

    /// Fails every save after `fail` is set.
    struct FlakyStore {
        inner: MemoryInventoryStore,
        fail: AtomicBool,
    }

    #[async_trait]
    impl InventoryStore for FlakyStore {
        async fn load(&self, key: &InventoryKey) -> CoreResult<Option<InventoryRecord>> {
            self.inner.load(key).await
        }

        async fn save(&self, record: &InventoryRecord) -> CoreResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CoreError::Collaborator("disk full".into()));
            }
            self.inner.save(record).await
        }

        async fn keys_for_hospital(&self, id: &RecordId) -> CoreResult<Vec<InventoryKey>> {
            self.inner.keys_for_hospital(id).await
        }
    }

    #[tokio::test]
    async fn test_failed_save_leaves_persisted_record_untouched() {
        let store = Arc::new(FlakyStore {
            inner: MemoryInventoryStore::new(),
            fail: AtomicBool::new(false),
        });
        let ledger = ledger_with(store.clone());
        let k = key(BloodType::BPos);
        ledger.add_stock(k.clone(), 6, StockOptions::default()).await.unwrap();
        let before = ledger.record(&k).await.unwrap();

        store.fail.store(true, Ordering::SeqCst);
        let result = ledger.reserve_stock(k.clone(), 2, StockOptions::default()).await;
        assert!(matches!(result, Err(CoreError::Collaborator(_))));

        store.fail.store(false, Ordering::SeqCst);
        assert_eq!(ledger.record(&k).await.unwrap(), before);
    }

    /// Saves only after `delay`, long past the ledger's timeout; optionally fails at the end.
    struct SlowStore {
        inner: MemoryInventoryStore,
        delay: Duration,
        fail: AtomicBool,
    }

    #[async_trait]
    impl InventoryStore for SlowStore {
        async fn load(&self, key: &InventoryKey) -> CoreResult<Option<InventoryRecord>> {
            self.inner.load(key).await
        }

        async fn save(&self, record: &InventoryRecord) -> CoreResult<()> {
            tokio::time::sleep(self.delay).await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(CoreError::Collaborator("disk full".into()));
            }
            self.inner.save(record).await
        }

        async fn keys_for_hospital(&self, id: &RecordId) -> CoreResult<Vec<InventoryKey>> {
            self.inner.keys_for_hospital(id).await
        }
    }

    fn slow_ledger(store: Arc<SlowStore>) -> InventoryLedger {
        let cfg = CoreConfig::new(
            None,
            50.0,
            20,
            Duration::from_millis(10),
            StockDefaults::default(),
        )
        .unwrap();
        InventoryLedger::new(store, Arc::new(FixedClock(now())), &cfg)
    }

    #[tokio::test]
    async fn test_slow_save_reports_what_was_persisted() {
        let store = Arc::new(SlowStore {
            inner: MemoryInventoryStore::new(),
            delay: Duration::from_millis(60),
            fail: AtomicBool::new(false),
        });
        let ledger = slow_ledger(store.clone());
        let k = key(BloodType::APos);
        ledger.add_stock(k.clone(), 5, StockOptions::default()).await.unwrap();

        let reserved = ledger
            .reserve_stock(k.clone(), 1, StockOptions::default())
            .await
            .unwrap();
        assert_eq!(reserved.reserved_stock(), 1);
        assert_eq!(store.inner.load(&k).await.unwrap(), Some(reserved));
    }

    #[tokio::test]
    async fn test_slow_failing_save_changes_nothing() {
        let store = Arc::new(SlowStore {
            inner: MemoryInventoryStore::new(),
            delay: Duration::from_millis(60),
            fail: AtomicBool::new(false),
        });
        let ledger = slow_ledger(store.clone());
        let k = key(BloodType::ONeg);
        ledger.add_stock(k.clone(), 5, StockOptions::default()).await.unwrap();
        let before = ledger.record(&k).await.unwrap();

        store.fail.store(true, Ordering::SeqCst);
        let result = ledger.reserve_stock(k.clone(), 1, StockOptions::default()).await;
        assert!(matches!(result, Err(CoreError::Collaborator(_))));

        // Give any stray write a chance to land.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.inner.load(&k).await.unwrap(), Some(before));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slow_save_keeps_key_locked_until_settled() {
        let store = Arc::new(SlowStore {
            inner: MemoryInventoryStore::new(),
            delay: Duration::from_millis(40),
            fail: AtomicBool::new(false),
        });
        let ledger = Arc::new(slow_ledger(store.clone()));
        let k = key(BloodType::BNeg);
        ledger.add_stock(k.clone(), 5, StockOptions::default()).await.unwrap();

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let ledger = ledger.clone();
                let k = k.clone();
                tokio::spawn(async move {
                    ledger.reserve_stock(k, 3, StockOptions::default()).await
                })
            })
            .collect();
        let mut outcomes = Vec::new();
        for task in tasks {
            outcomes.push(task.await.unwrap());
        }

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let record = store.inner.load(&k).await.unwrap().unwrap();
        assert_eq!(record.reserved_stock(), 3);
        assert_eq!(record.movements().len(), 2);
    }

    #[tokio::test]
    async fn test_abandoned_reserve_still_commits_before_next_one() {
        let store = Arc::new(SlowStore {
            inner: MemoryInventoryStore::new(),
            delay: Duration::from_millis(40),
            fail: AtomicBool::new(false),
        });
        let ledger = slow_ledger(store.clone());
        let k = key(BloodType::AbPos);
        ledger.add_stock(k.clone(), 4, StockOptions::default()).await.unwrap();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(5),
            ledger.reserve_stock(k.clone(), 3, StockOptions::default()),
        )
        .await;
        assert!(abandoned.is_err());

        let next = ledger.reserve_stock(k.clone(), 3, StockOptions::default()).await;
        assert!(matches!(
            next,
            Err(CoreError::InsufficientStock {
                available: 1,
                requested: 3
            })
        ));
        assert_eq!(ledger.record(&k).await.unwrap().reserved_stock(), 3);
    }

    #[tokio::test]
    async fn test_stock_status_out_of_stock_and_low() {
        let ledger = ledger();
        let k = key(BloodType::ONeg);
        ledger.add_stock(k.clone(), 3, StockOptions::default()).await.unwrap();
        assert_eq!(ledger.stock_status(&k).await.unwrap(), StockStatus::Low);

        ledger.reserve_stock(k.clone(), 3, StockOptions::default()).await.unwrap();
        assert_eq!(ledger.stock_status(&k).await.unwrap(), StockStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_hospital_summary() {
        let ledger = ledger();
        ledger
            .add_stock(key(BloodType::APos), 30, StockOptions::default())
            .await
            .unwrap();
        ledger
            .reserve_stock(key(BloodType::APos), 4, StockOptions::default())
            .await
            .unwrap();
        for (bag, days, units) in [("BAG-1", 2, 2), ("BAG-2", 5, 1), ("BAG-3", 20, 3)] {
            let opts = StockOptions {
                unit_id: Some(bag.into()),
                expiry_date: Some(now() + chrono::Duration::days(days)),
                ..StockOptions::default()
            };
            ledger.add_stock(key(BloodType::ONeg), units, opts).await.unwrap();
        }
        ledger
            .reserve_stock(key(BloodType::ONeg), 6, StockOptions::default())
            .await
            .unwrap();

        let summary = ledger.hospital_summary(&hospital()).await.unwrap();
        assert_eq!(summary.total_stock, 36);
        assert_eq!(summary.total_reserved, 10);
        assert_eq!(summary.total_available, 26);

        let types: Vec<BloodType> = summary.by_blood_type.iter().map(|s| s.blood_type).collect();
        assert_eq!(types, [BloodType::APos, BloodType::ONeg]);
        assert_eq!(summary.by_blood_type[0].status, StockStatus::Good);

        assert_eq!(summary.low_stock_alerts.len(), 1);
        assert_eq!(summary.low_stock_alerts[0].blood_type, BloodType::ONeg);
        assert_eq!(summary.low_stock_alerts[0].level, AlertLevel::Critical);

        assert_eq!(summary.expiring_soon.len(), 1);
        let group = &summary.expiring_soon[0];
        assert_eq!((group.batches, group.units), (2, 3));
        assert_eq!(group.earliest_expiry, now() + chrono::Duration::days(2));
        assert!(summary.skipped_blood_types.is_empty());
    }

    #[tokio::test]
    async fn test_hospital_summary_for_unknown_hospital_is_empty() {
        let summary = ledger().hospital_summary(&RecordId::new()).await.unwrap();
        assert_eq!(summary.total_stock, 0);
        assert!(summary.by_blood_type.is_empty());
    }
}
