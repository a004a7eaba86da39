pub mod json_store;
pub mod memory;
pub mod schema;

use thiserror::Error;

use crate::store::schema::{SCHEMA_VERSION, UserRecord, Versioned};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(
        "concurrent update for user '{user_id}': expected version {expected:?}, found {found:?}"
    )]
    ConcurrentUpdateConflict {
        user_id: String,
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("record for user '{user_id}' has schema version {found}, expected {expected}")]
    SchemaMismatch {
        user_id: String,
        found: u32,
        expected: u32,
    },

    #[error("invalid user id '{0}'")]
    InvalidUserId(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrentUpdateConflict { .. })
    }
}

/// Per-user record storage with compare-and-swap commits.
pub trait ProgressStore {
    fn load(&self, user_id: &str) -> Result<Option<Versioned<UserRecord>>, StoreError>;

    /// Write `record` if the stored version still equals `expected_version`
    /// (`None`: no record may exist yet). Returns the new version.
    fn commit(
        &self,
        user_id: &str,
        expected_version: Option<u64>,
        record: &UserRecord,
    ) -> Result<u64, StoreError>;
}

impl<S: ProgressStore + ?Sized> ProgressStore for &S {
    fn load(&self, user_id: &str) -> Result<Option<Versioned<UserRecord>>, StoreError> {
        (**self).load(user_id)
    }

    fn commit(
        &self,
        user_id: &str,
        expected_version: Option<u64>,
        record: &UserRecord,
    ) -> Result<u64, StoreError> {
        (**self).commit(user_id, expected_version, record)
    }
}

fn check_version(
    user_id: &str,
    expected: Option<u64>,
    found: Option<u64>,
) -> Result<u64, StoreError> {
    if expected != found {
        return Err(StoreError::ConcurrentUpdateConflict {
            user_id: user_id.to_string(),
            expected,
            found,
        });
    }
    Ok(found.map_or(1, |v| v + 1))
}

fn check_schema(user_id: &str, record: &UserRecord) -> Result<(), StoreError> {
    if record.is_current_schema() {
        return Ok(());
    }
    Err(StoreError::SchemaMismatch {
        user_id: user_id.to_string(),
        found: record.schema_version,
        expected: SCHEMA_VERSION,
    })
}
