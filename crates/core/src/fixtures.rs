//! YAML snapshots of a directory and opening inventory.
//!
//! The binaries load one of these to get a populated [`InMemoryDirectory`] without an external
//! user service. Example:
//!
//! ```yaml
//! donors:
//!   - id: 0a1b2c3d4e5f60718293a4b5c6d7e8f9
//!     name: Ada Obi
//!     blood_type: O-
//!     location: { latitude: 6.5244, longitude: 3.3792 }
//!     donation_count: 4
//! hospitals:
//!   - id: 550e8400e29b41d4a716446655440000
//!     name: Lagos General
//!     location: { latitude: 6.45, longitude: 3.4 }
//! inventory:
//!   - hospital_id: 550e8400e29b41d4a716446655440000
//!     blood_type: A+
//!     units: 12
//! ```

use crate::constants::OPENING_BALANCE_REASON;
use crate::directory::{DirectoryUser, DonorCandidate, HospitalSite, InMemoryDirectory, UserRole};
use crate::inventory::{InventoryKey, InventoryLedger, StockOptions};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use hemo_types::{BloodType, Coordinate};
use hemo_uuid::RecordId;
use serde::Deserialize;
use std::path::Path;

fn yes() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub struct FixtureUser {
    pub id: RecordId,
    pub name: String,
    pub blood_type: BloodType,
    pub location: Coordinate,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub last_donation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub donation_count: u32,
    #[serde(default = "yes")]
    pub is_eligible: bool,
    #[serde(default = "yes")]
    pub is_available: bool,
    #[serde(default = "yes")]
    pub is_active: bool,
}

impl From<FixtureUser> for DirectoryUser {
    fn from(u: FixtureUser) -> Self {
        DirectoryUser {
            candidate: DonorCandidate {
                id: u.id,
                name: u.name,
                blood_type: u.blood_type,
                location: u.location,
                last_donation_date: u.last_donation_date,
                donation_count: u.donation_count,
                is_eligible: u.is_eligible,
                is_available: u.is_available,
            },
            role: u.role,
            is_active: u.is_active,
            next_eligible_date: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FixtureStock {
    pub hospital_id: RecordId,
    pub blood_type: BloodType,
    pub units: u32,
    #[serde(default)]
    pub reserved: u32,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DirectoryFixture {
    #[serde(default)]
    pub donors: Vec<FixtureUser>,
    #[serde(default)]
    pub hospitals: Vec<HospitalSite>,
    #[serde(default)]
    pub inventory: Vec<FixtureStock>,
}

impl DirectoryFixture {
    pub fn from_yaml_str(yaml: &str) -> CoreResult<Self> {
        serde_yaml::from_str(yaml).map_err(CoreError::YamlDeserialization)
    }

    pub async fn load(path: &Path) -> CoreResult<Self> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(CoreError::FileRead)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn directory(&self) -> CoreResult<InMemoryDirectory> {
        let directory = InMemoryDirectory::new();
        for user in &self.donors {
            directory.insert_user(user.clone().into())?;
        }
        for site in &self.hospitals {
            directory.insert_hospital(site.clone())?;
        }
        Ok(directory)
    }

    /// Applies the opening inventory through the ledger. Returns the number of records touched.
    ///
    /// Reservations are applied after the additions for the same entry.
    pub async fn seed_inventory(&self, ledger: &InventoryLedger) -> CoreResult<usize> {
        let mut seeded = 0;
        for stock in &self.inventory {
            if stock.units == 0 {
                continue;
            }
            let key = InventoryKey::new(stock.hospital_id.clone(), stock.blood_type);
            let opts = StockOptions {
                unit_id: stock.unit_id.clone(),
                expiry_date: stock.expiry_date,
                ..StockOptions::with_reason(OPENING_BALANCE_REASON)
            };
            ledger.add_stock(key.clone(), stock.units, opts).await?;
            if stock.reserved > 0 {
                ledger
                    .reserve_stock(
                        key,
                        stock.reserved,
                        StockOptions::with_reason(OPENING_BALANCE_REASON),
                    )
                    .await?;
            }
            seeded += 1;
        }
        tracing::info!(records = seeded, "seeded opening inventory");
        Ok(seeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::CoreConfig;
    use crate::directory::{DonorDirectory, DonorQuery, HospitalDirectory};
    use crate::inventory::MemoryInventoryStore;
    use std::sync::Arc;

    const FIXTURE: &str = r#"
donors:
  - id: 0a1b2c3d4e5f60718293a4b5c6d7e8f9
    name: Ada Obi
    blood_type: O-
    location: { latitude: 6.5244, longitude: 3.3792 }
    donation_count: 4
  - id: 1a1b2c3d4e5f60718293a4b5c6d7e8f9
    name: Retired Donor
    blood_type: a-pos
    location: { latitude: 6.53, longitude: 3.38 }
    is_active: false
  - id: 2a1b2c3d4e5f60718293a4b5c6d7e8f9
    name: Ward Admin
    blood_type: B+
    location: { latitude: 6.53, longitude: 3.38 }
    role: admin
hospitals:
  - id: 550e8400e29b41d4a716446655440000
    name: Lagos General
    location: { latitude: 6.45, longitude: 3.4 }
inventory:
  - hospital_id: 550e8400e29b41d4a716446655440000
    blood_type: A+
    units: 12
    reserved: 2
"#;

    #[tokio::test]
    async fn test_fixture_builds_directory() {
        let fixture = DirectoryFixture::from_yaml_str(FIXTURE).unwrap();
        let directory = fixture.directory().unwrap();

        let donors = directory.find_donors(&DonorQuery::any()).await.unwrap();
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].name, "Ada Obi");
        assert!(donors[0].is_eligible);

        let center = Coordinate::new(6.5, 3.4).unwrap();
        let hospitals = directory.find_hospitals(center, 20.0).await.unwrap();
        assert_eq!(hospitals.len(), 1);
    }

    #[tokio::test]
    async fn test_fixture_seeds_opening_balance() {
        let fixture = DirectoryFixture::from_yaml_str(FIXTURE).unwrap();
        let ledger = InventoryLedger::new(
            Arc::new(MemoryInventoryStore::new()),
            Arc::new(SystemClock),
            &CoreConfig::default(),
        );
        assert_eq!(fixture.seed_inventory(&ledger).await.unwrap(), 1);

        let key = InventoryKey::new(
            RecordId::parse("550e8400e29b41d4a716446655440000").unwrap(),
            BloodType::APos,
        );
        let record = ledger.record(&key).await.unwrap();
        assert_eq!(record.available_stock(), 10);
        assert!(record
            .movements()
            .iter()
            .all(|m| m.reason == "Opening balance"));
    }

    #[test]
    fn test_fixture_rejects_bad_coordinates() {
        let yaml = r#"
hospitals:
  - id: 550e8400e29b41d4a716446655440000
    name: Nowhere
    location: { latitude: 123.0, longitude: 3.4 }
"#;
        assert!(DirectoryFixture::from_yaml_str(yaml).is_err());
    }

    #[tokio::test]
    async fn test_demo_fixture_loads() {
        let fixture =
            DirectoryFixture::from_yaml_str(include_str!("../../../fixtures/demo.yaml")).unwrap();
        let directory = fixture.directory().unwrap();
        let donors = directory.find_donors(&DonorQuery::any()).await.unwrap();
        assert_eq!(donors.len(), 5);

        let ledger = InventoryLedger::new(
            Arc::new(MemoryInventoryStore::new()),
            Arc::new(SystemClock),
            &CoreConfig::default(),
        );
        assert_eq!(fixture.seed_inventory(&ledger).await.unwrap(), 4);
    }
}
