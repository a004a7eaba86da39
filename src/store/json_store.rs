use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use fs2::FileExt;

use crate::identity::validate_user_id;
use crate::store::schema::{UserRecord, Versioned};
use crate::store::{ProgressStore, StoreError, check_schema, check_version};

/// One JSON file per user under `<base_dir>/users/`.
///
/// Commits take an exclusive lock on `<user>.lock`, re-read the stored
/// version under that lock, and replace the file via write-to-temp + rename,
/// so two processes updating the same user are serialized and the loser of a
/// race gets a conflict instead of silently overwriting.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(base_dir.join("users"))?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, user_id: &str, extension: &str) -> Result<PathBuf, StoreError> {
        validate_user_id(user_id).map_err(|_| StoreError::InvalidUserId(user_id.to_string()))?;
        Ok(self
            .base_dir
            .join("users")
            .join(format!("{user_id}.{extension}")))
    }

    fn read(&self, user_id: &str) -> Result<Option<Versioned<UserRecord>>, StoreError> {
        let path = self.file_path(user_id, "json")?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let stored: Versioned<UserRecord> = serde_json::from_str(&content)?;
        check_schema(user_id, &stored.record)?;
        Ok(Some(stored))
    }
}

impl ProgressStore for JsonStore {
    fn load(&self, user_id: &str) -> Result<Option<Versioned<UserRecord>>, StoreError> {
        self.read(user_id)
    }

    fn commit(
        &self,
        user_id: &str,
        expected_version: Option<u64>,
        record: &UserRecord,
    ) -> Result<u64, StoreError> {
        let path = self.file_path(user_id, "json")?;
        let lock_path = self.file_path(user_id, "lock")?;

        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        // Released when lock_file drops, on every return path.
        lock_file.lock_exclusive()?;

        let found = self.read(user_id)?.map(|v| v.version);
        let version = check_version(user_id, expected_version, found)?;

        let json = serde_json::to_string_pretty(&Versioned {
            version,
            record: record.clone(),
        })?;
        let tmp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &path)?;

        tracing::debug!(user_id, version, "committed user record");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progression::Role;
    use crate::identity::Identity;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn record(user_id: &str) -> UserRecord {
        let identity = Identity::new(user_id, format!("{user_id}@example.com"), None).unwrap();
        UserRecord::new(&identity, Role::Warden)
    }

    #[test]
    fn test_load_missing_user_is_none() {
        let (_dir, store) = make_test_store();
        assert!(store.load("nobody").unwrap().is_none());
    }

    #[test]
    fn test_create_then_update() {
        let (_dir, store) = make_test_store();
        let mut rec = record("alice");
        assert_eq!(store.commit("alice", None, &rec).unwrap(), 1);

        rec.stats.total_sessions = 3;
        assert_eq!(store.commit("alice", Some(1), &rec).unwrap(), 2);

        let loaded = store.load("alice").unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.record, rec);
    }

    #[test]
    fn test_stale_version_conflicts() {
        let (_dir, store) = make_test_store();
        let rec = record("alice");
        store.commit("alice", None, &rec).unwrap();
        store.commit("alice", Some(1), &rec).unwrap();

        let err = store.commit("alice", Some(1), &rec).unwrap_err();
        assert!(err.is_conflict());
        let err = store.commit("alice", None, &rec).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.load("alice").unwrap().unwrap().version, 2);
    }

    #[test]
    fn test_rejects_path_like_user_ids() {
        let (_dir, store) = make_test_store();
        assert!(matches!(
            store.load("../escape"),
            Err(StoreError::InvalidUserId(_))
        ));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (dir, store) = make_test_store();
        store.commit("alice", None, &record("alice")).unwrap();
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("users"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty(), "no residual .tmp files");
    }

    #[test]
    fn test_stale_schema_is_rejected() {
        let (dir, store) = make_test_store();
        let mut rec = record("alice");
        store.commit("alice", None, &rec).unwrap();
        assert!(store.load("alice").unwrap().is_some());

        rec.schema_version = 0;
        let json = serde_json::to_string(&Versioned {
            version: 1,
            record: rec.clone(),
        })
        .unwrap();
        fs::write(dir.path().join("users").join("alice.json"), json).unwrap();
        assert!(matches!(
            store.load("alice"),
            Err(StoreError::SchemaMismatch {
                found: 0,
                expected: 1,
                ..
            })
        ));
        // and the stale file is never overwritten
        assert!(matches!(
            store.commit("alice", Some(1), &record("alice")),
            Err(StoreError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_record_with_impossible_level_is_rejected() {
        let (dir, store) = make_test_store();
        store.commit("alice", None, &record("alice")).unwrap();
        let path = dir.path().join("users").join("alice.json");
        let content = fs::read_to_string(&path).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&content).unwrap();
        value["record"]["progression"]["level"] = serde_json::json!(7);
        fs::write(&path, value.to_string()).unwrap();
        assert!(matches!(store.load("alice"), Err(StoreError::Json(_))));

        value["record"]["progression"]["level"] = serde_json::json!(0);
        fs::write(&path, value.to_string()).unwrap();
        assert!(matches!(store.load("alice"), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (dir, store) = make_test_store();
        fs::write(dir.path().join("users").join("alice.json"), "{ not json").unwrap();
        assert!(matches!(store.load("alice"), Err(StoreError::Json(_))));
    }
}
