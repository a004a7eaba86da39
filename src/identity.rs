use serde::{Deserialize, Serialize};

use crate::engine::error::ProgressionError;

const MAX_USER_ID_LEN: usize = 128;

/// Who is training, as handed over by whatever authenticated them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        display_name: Option<String>,
    ) -> Result<Self, ProgressionError> {
        let user_id = user_id.into();
        validate_user_id(&user_id)?;
        Ok(Self {
            user_id,
            email: email.into(),
            display_name,
        })
    }
}

/// User ids double as file names, so keep them to `[A-Za-z0-9_-]`.
pub fn validate_user_id(user_id: &str) -> Result<(), ProgressionError> {
    if user_id.is_empty() || user_id.len() > MAX_USER_ID_LEN {
        return Err(ProgressionError::invalid(format!(
            "user id must be 1-{MAX_USER_ID_LEN} characters"
        )));
    }
    if !user_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ProgressionError::invalid(format!(
            "user id '{user_id}' may only contain letters, digits, '_' and '-'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_validation() {
        assert!(validate_user_id("alice_01-b").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("../etc/passwd").is_err());
        assert!(validate_user_id("a b").is_err());
        assert!(validate_user_id(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_identity_new_rejects_bad_id() {
        assert!(Identity::new("bob", "bob@example.com", None).is_ok());
        assert!(Identity::new("bob/1", "bob@example.com", None).is_err());
    }
}
