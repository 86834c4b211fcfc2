//! Hospital blood inventory: records, persistence and the ledger that mutates them.

mod ledger;
mod record;
mod store;

pub use ledger::{
    BloodTypeStock, ExpiringGroup, HospitalSummary, InventoryLedger, LowStockAlert,
};
pub use record::{
    Alert, AlertLevel, AlertType, ExpiryEntry, InventoryKey, InventoryRecord, Movement,
    MovementReference, MovementType, ReferenceKind, StockOptions, StockStatus, UnitStatus,
};
pub use store::{FileInventoryStore, InventoryStore, MemoryInventoryStore};
