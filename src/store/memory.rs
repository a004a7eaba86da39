use std::collections::HashMap;
use std::sync::Mutex;

use crate::store::schema::{UserRecord, Versioned};
use crate::store::{ProgressStore, StoreError, check_version};

/// In-process store with the same compare-and-swap contract as
/// [`JsonStore`](crate::store::json_store::JsonStore).
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Versioned<UserRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<String, Versioned<UserRecord>>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self, user_id: &str) -> Result<Option<Versioned<UserRecord>>, StoreError> {
        Ok(self.records().get(user_id).cloned())
    }

    fn commit(
        &self,
        user_id: &str,
        expected_version: Option<u64>,
        record: &UserRecord,
    ) -> Result<u64, StoreError> {
        let mut records = self.records();
        let found = records.get(user_id).map(|v| v.version);
        let version = check_version(user_id, expected_version, found)?;
        records.insert(
            user_id.to_string(),
            Versioned {
                version,
                record: record.clone(),
            },
        );
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progression::Role;
    use crate::identity::Identity;

    #[test]
    fn test_compare_and_swap() {
        let store = MemoryStore::new();
        let identity = Identity::new("u1", "u1@example.com", None).unwrap();
        let rec = UserRecord::new(&identity, Role::Assassin);

        assert_eq!(store.commit("u1", None, &rec).unwrap(), 1);
        assert!(store.commit("u1", None, &rec).unwrap_err().is_conflict());
        assert_eq!(store.commit("u1", Some(1), &rec).unwrap(), 2);
        assert!(store.commit("u1", Some(1), &rec).unwrap_err().is_conflict());
        assert_eq!(store.load("u1").unwrap().unwrap().version, 2);
        assert!(store.load("u2").unwrap().is_none());
    }
}
