//! Persistence for inventory records.
//!
//! A store saves whole records atomically and refuses any save whose movements do not extend the
//! movements already stored, so the audit trail can only grow.

use super::record::{InventoryKey, InventoryRecord};
use crate::constants::INVENTORY_FILE_EXTENSION;
use crate::{CoreError, CoreResult};
use async_trait::async_trait;
use hemo_types::BloodType;
use hemo_uuid::RecordId;
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn load(&self, key: &InventoryKey) -> CoreResult<Option<InventoryRecord>>;

    /// Replaces the stored record for `record.key()` in a single atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AppendOnlyViolation`] if the stored movements are not a prefix of
    /// `record`'s movements.
    async fn save(&self, record: &InventoryRecord) -> CoreResult<()>;

    /// Keys of every record held for a hospital, in blood type order.
    async fn keys_for_hospital(&self, hospital_id: &RecordId) -> CoreResult<Vec<InventoryKey>>;
}

pub(crate) fn check_append_only(
    stored: Option<&InventoryRecord>,
    incoming: &InventoryRecord,
) -> CoreResult<()> {
    let Some(stored) = stored else {
        return Ok(());
    };
    let old = stored.movements();
    let new = incoming.movements();
    if new.len() < old.len() || new[..old.len()] != *old {
        return Err(CoreError::AppendOnlyViolation(format!(
            "{}: stored movements must be a prefix of the new movements",
            stored.key()
        )));
    }
    Ok(())
}

/// Process-local store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryInventoryStore {
    records: RwLock<HashMap<InventoryKey, InventoryRecord>>,
}

fn poisoned() -> CoreError {
    CoreError::Collaborator("inventory store lock poisoned".into())
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn load(&self, key: &InventoryKey) -> CoreResult<Option<InventoryRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(key).cloned())
    }

    async fn save(&self, record: &InventoryRecord) -> CoreResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let key = record.key();
        check_append_only(records.get(&key), record)?;
        records.insert(key, record.clone());
        Ok(())
    }

    async fn keys_for_hospital(&self, hospital_id: &RecordId) -> CoreResult<Vec<InventoryKey>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut keys: Vec<InventoryKey> = records
            .keys()
            .filter(|k| &k.hospital_id == hospital_id)
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// YAML files under a sharded directory tree.
///
/// Layout: `<data_dir>/<s1>/<s2>/<hospital-uuid>/<blood-slug>.yaml`
#[derive(Clone, Debug)]
pub struct FileInventoryStore {
    data_dir: PathBuf,
}

impl FileInventoryStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn hospital_dir(&self, hospital_id: &RecordId) -> PathBuf {
        hospital_id.sharded_dir(&self.data_dir)
    }

    fn record_path(&self, key: &InventoryKey) -> PathBuf {
        self.hospital_dir(&key.hospital_id).join(format!(
            "{}.{}",
            key.blood_type.slug(),
            INVENTORY_FILE_EXTENSION
        ))
    }

    async fn read_record(&self, key: &InventoryKey) -> CoreResult<Option<InventoryRecord>> {
        let path = self.record_path(key);
        let yaml = match tokio::fs::read_to_string(&path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoreError::FileRead(e)),
        };
        let record: InventoryRecord =
            serde_yaml::from_str(&yaml).map_err(CoreError::YamlDeserialization)?;
        if &record.key() != key {
            return Err(CoreError::Collaborator(format!(
                "{} holds the record for {}",
                path.display(),
                record.key()
            )));
        }
        Ok(Some(record))
    }
}

#[async_trait]
impl InventoryStore for FileInventoryStore {
    async fn load(&self, key: &InventoryKey) -> CoreResult<Option<InventoryRecord>> {
        self.read_record(key).await
    }

    async fn save(&self, record: &InventoryRecord) -> CoreResult<()> {
        let key = record.key();
        let stored = self.read_record(&key).await?;
        check_append_only(stored.as_ref(), record)?;

        let dir = self.hospital_dir(&key.hospital_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(CoreError::StorageDirCreation)?;

        let yaml = serde_yaml::to_string(record).map_err(CoreError::YamlSerialization)?;
        let path = self.record_path(&key);
        let prefix = format!(".{}.", key.blood_type.slug());
        tokio::task::spawn_blocking(move || write_atomically(&dir, &prefix, &path, yaml.as_bytes()))
            .await
            .map_err(|e| CoreError::Collaborator(format!("inventory write task failed: {e}")))?
    }

    async fn keys_for_hospital(&self, hospital_id: &RecordId) -> CoreResult<Vec<InventoryKey>> {
        let dir = self.hospital_dir(hospital_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoreError::FileRead(e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(CoreError::FileRead)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(INVENTORY_FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match BloodType::parse(stem) {
                Ok(blood_type) => keys.push(InventoryKey::new(hospital_id.clone(), blood_type)),
                Err(_) => {
                    tracing::warn!(path = %path.display(), "ignoring unrecognised inventory file");
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Writes `contents` to a temp file in `dir` and renames it over `path`.
///
/// The temp file is removed on every failure path.
fn write_atomically(dir: &Path, prefix: &str, path: &Path, contents: &[u8]) -> CoreResult<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(CoreError::FileWrite)?;
    tmp.write_all(contents).map_err(CoreError::FileWrite)?;
    tmp.persist(path).map_err(|e| CoreError::FileWrite(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StockDefaults;
    use crate::inventory::record::StockOptions;
    use chrono::Utc;
    use tempfile::TempDir;

    fn key(blood_type: BloodType) -> InventoryKey {
        InventoryKey::new(
            RecordId::parse("550e8400e29b41d4a716446655440000").unwrap(),
            blood_type,
        )
    }

    fn stocked(key: InventoryKey, units: u32) -> InventoryRecord {
        let mut r = InventoryRecord::new(key, StockDefaults::default(), Utc::now());
        r.apply_add(units, StockOptions::default(), Utc::now()).unwrap();
        r
    }

    #[tokio::test]
    async fn test_memory_store_rejects_rewritten_history() {
        let store = MemoryInventoryStore::new();
        let first = stocked(key(BloodType::OPos), 5);
        store.save(&first).await.unwrap();

        let mut next = first.clone();
        next.apply_add(1, StockOptions::default(), Utc::now()).unwrap();
        store.save(&next).await.unwrap();

        // A record built from scratch does not extend the stored movements.
        let rival = stocked(key(BloodType::OPos), 5);
        assert!(matches!(
            store.save(&rival).await,
            Err(CoreError::AppendOnlyViolation(_))
        ));
        assert!(matches!(
            store.save(&first).await,
            Err(CoreError::AppendOnlyViolation(_))
        ));
        assert_eq!(store.load(&first.key()).await.unwrap(), Some(next));
    }

    #[tokio::test]
    async fn test_file_store_layout_and_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = FileInventoryStore::new(temp.path());
        let record = stocked(key(BloodType::AbNeg), 4);

        store.save(&record).await.unwrap();

        let expected = temp
            .path()
            .join("55/0e/550e8400e29b41d4a716446655440000/ab-neg.yaml");
        assert!(expected.is_file());
        assert_eq!(store.load(&record.key()).await.unwrap(), Some(record));
    }

    #[test]
    fn test_failed_atomic_write_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a-pos.yaml");
        std::fs::create_dir_all(target.join("occupied")).unwrap();

        let result = write_atomically(temp.path(), ".a-pos.", &target, b"current_stock: 1\n");
        assert!(matches!(result, Err(CoreError::FileWrite(_))));

        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_file_store_save_leaves_only_the_record() {
        let temp = TempDir::new().unwrap();
        let store = FileInventoryStore::new(temp.path());
        let first = stocked(key(BloodType::OPos), 2);
        store.save(&first).await.unwrap();
        let mut next = first.clone();
        next.apply_add(3, StockOptions::default(), Utc::now()).unwrap();
        store.save(&next).await.unwrap();

        let dir = key(BloodType::OPos).hospital_id.sharded_dir(temp.path());
        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["o-pos.yaml"]);
        assert_eq!(store.load(&next.key()).await.unwrap(), Some(next));
    }

    #[tokio::test]
    async fn test_file_store_missing_record_is_none() {
        let temp = TempDir::new().unwrap();
        let store = FileInventoryStore::new(temp.path());
        assert_eq!(store.load(&key(BloodType::ANeg)).await.unwrap(), None);
        assert!(store
            .keys_for_hospital(&key(BloodType::ANeg).hospital_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_file_store_keys_skip_foreign_files() {
        let temp = TempDir::new().unwrap();
        let store = FileInventoryStore::new(temp.path());
        store.save(&stocked(key(BloodType::ONeg), 1)).await.unwrap();
        store.save(&stocked(key(BloodType::APos), 1)).await.unwrap();

        let dir = key(BloodType::APos).hospital_id.sharded_dir(temp.path());
        std::fs::write(dir.join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.join("zz-pos.yaml"), "junk").unwrap();

        let keys = store
            .keys_for_hospital(&key(BloodType::APos).hospital_id)
            .await
            .unwrap();
        let types: Vec<BloodType> = keys.iter().map(|k| k.blood_type).collect();
        assert_eq!(types, [BloodType::APos, BloodType::ONeg]);
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_yaml() {
        let temp = TempDir::new().unwrap();
        let store = FileInventoryStore::new(temp.path());
        let k = key(BloodType::BPos);
        let dir = k.hospital_id.sharded_dir(temp.path());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b-pos.yaml"), "current_stock: [").unwrap();

        assert!(matches!(
            store.load(&k).await,
            Err(CoreError::YamlDeserialization(_))
        ));
    }
}
