//! Versioned per-community snapshot persistence.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{de::Error as _, Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::{
    community::CommunityState, economy::EconomyState, error::SnapshotError, plant::PlantState,
    CommunityId,
};

/// Version written by this build. Bump when a field changes meaning; added
/// fields only need `#[serde(default)]`.
pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk representation of one community.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Format version.
    pub version: u32,
    /// Community the record belongs to.
    pub community_id: CommunityId,
    /// When the record was written.
    pub saved_at: DateTime<Utc>,
    /// Plant fields.
    pub plant: PlantState,
    /// Economy fields.
    #[serde(default)]
    pub economy: EconomyState,
}

impl SnapshotRecord {
    /// Capture `state` for `community_id` at the current time.
    pub fn capture(community_id: CommunityId, state: &CommunityState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            community_id,
            saved_at: Utc::now(),
            plant: state.plant.clone(),
            economy: state.economy.clone(),
        }
    }

    /// Serialise to the bytes written on disk.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        serde_json::to_vec_pretty(self).map_err(SnapshotError::Encode)
    }

    /// Parse bytes read from `path`, checking the version before the body.
    pub fn decode(path: &Path, bytes: &[u8]) -> Result<Self, SnapshotError> {
        let decode_err = |source: serde_json::Error| SnapshotError::Decode {
            path: path.to_path_buf(),
            source,
        };

        let value: Value = serde_json::from_slice(bytes).map_err(decode_err)?;
        let version = value
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| decode_err(serde_json::Error::missing_field("version")))?;
        if version > u64::from(SNAPSHOT_VERSION) {
            return Err(SnapshotError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: u32::try_from(version).unwrap_or(u32::MAX),
                supported: SNAPSHOT_VERSION,
            });
        }

        let mut record: SnapshotRecord = serde_json::from_value(value).map_err(decode_err)?;
        record.economy.market.backfill();
        Ok(record)
    }

    /// Consume the record and return the live state.
    pub fn into_state(self) -> CommunityState {
        CommunityState {
            plant: self.plant,
            economy: self.economy,
        }
    }
}

/// Directory of snapshot files, one per community.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the snapshots.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `community_id`.
    pub fn path_for(&self, community_id: CommunityId) -> PathBuf {
        self.root.join(format!("{community_id}.json"))
    }

    /// Load the record for `community_id`; `Ok(None)` when none was written yet.
    pub fn load(
        &self,
        community_id: CommunityId,
    ) -> Result<Option<SnapshotRecord>, SnapshotError> {
        let path = self.path_for(community_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SnapshotError::Io { path, source }),
        };

        let record = SnapshotRecord::decode(&path, &bytes)?;
        if record.community_id != community_id {
            return Err(SnapshotError::CommunityMismatch {
                path,
                expected: community_id,
                found: record.community_id,
            });
        }
        Ok(Some(record))
    }

    /// Replace the record for `community_id` with already-encoded bytes.
    ///
    /// The bytes land in a temporary file next to the target and are renamed
    /// over it, so readers never observe a half-written record.
    pub fn write(&self, community_id: CommunityId, bytes: &[u8]) -> Result<PathBuf, SnapshotError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| SnapshotError::Io { path, source }
        };

        fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;
        let path = self.path_for(community_id);

        let mut staging = NamedTempFile::new_in(&self.root).map_err(io_err(&self.root))?;
        staging.write_all(bytes).map_err(io_err(staging.path()))?;
        staging.as_file().sync_all().map_err(io_err(staging.path()))?;
        staging
            .persist(&path)
            .map_err(|err| io_err(&path)(err.error))?;
        Ok(path)
    }

    /// Capture and write `state` in one step.
    pub fn save(
        &self,
        community_id: CommunityId,
        state: &CommunityState,
    ) -> Result<PathBuf, SnapshotError> {
        let bytes = SnapshotRecord::capture(community_id, state).encode()?;
        self.write(community_id, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FruitKind;
    use anyhow::Result;
    use tempfile::tempdir;

    fn sample_state() -> CommunityState {
        let mut state = CommunityState::default();
        state.plant.rename("Basil");
        state.plant.fruits.push(FruitKind::Coconut);
        state.economy.credit(11, 4.5);
        state.economy.stash(11, [FruitKind::Gem, FruitKind::Apple]);
        state.economy.market.sell_one(FruitKind::Gem);
        state
    }

    #[test]
    fn missing_record_loads_as_none() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path().join("communities"));
        assert!(store.load(42)?.is_none());
        Ok(())
    }

    #[test]
    fn saved_state_reloads_intact() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        let state = sample_state();

        let path = store.save(42, &state)?;
        assert_eq!(path, dir.path().join("42.json"));

        let record = store.load(42)?.expect("record was written");
        assert_eq!(record.version, SNAPSHOT_VERSION);
        assert_eq!(record.community_id, 42);
        assert_eq!(record.into_state(), state);
        Ok(())
    }

    #[test]
    fn save_overwrites_previous_record() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        let mut state = sample_state();
        store.save(7, &state)?;

        state.plant.water().expect("alive");
        store.save(7, &state)?;

        let reloaded = store.load(7)?.expect("record was written").into_state();
        assert_eq!(reloaded.plant.hydration, 110.0);
        let files = fs::read_dir(dir.path())?.count();
        assert_eq!(files, 1);
        Ok(())
    }

    #[test]
    fn malformed_record_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        fs::write(store.path_for(5), br#"{"version": 1, "plant": "oops"}"#)?;

        let err = store.load(5).expect_err("record is malformed");
        assert!(matches!(err, SnapshotError::Decode { .. }));
        Ok(())
    }

    #[test]
    fn missing_version_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        fs::write(store.path_for(5), br#"{"name": "Plant"}"#)?;

        assert!(matches!(store.load(5), Err(SnapshotError::Decode { .. })));
        Ok(())
    }

    #[test]
    fn newer_version_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        let mut record = serde_json::to_value(SnapshotRecord::capture(5, &sample_state()))?;
        record["version"] = Value::from(SNAPSHOT_VERSION + 1);
        fs::write(store.path_for(5), serde_json::to_vec(&record)?)?;

        assert!(matches!(
            store.load(5),
            Err(SnapshotError::UnsupportedVersion { found: 2, .. })
        ));
        Ok(())
    }

    #[test]
    fn record_for_other_community_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        let bytes = SnapshotRecord::capture(9, &sample_state()).encode()?;
        fs::write(store.path_for(5), bytes)?;

        assert!(matches!(
            store.load(5),
            Err(SnapshotError::CommunityMismatch { found: 9, .. })
        ));
        Ok(())
    }

    #[test]
    fn economy_defaults_when_absent() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        let body = serde_json::json!({
            "version": 1,
            "community_id": 3,
            "saved_at": Utc::now(),
            "plant": PlantState::default(),
        });
        fs::write(store.path_for(3), serde_json::to_vec(&body)?)?;

        let state = store.load(3)?.expect("record was written").into_state();
        assert_eq!(state, CommunityState::default());
        Ok(())
    }
}
