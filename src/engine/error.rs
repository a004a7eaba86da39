use thiserror::Error;

/// Failures reported by the pure progression engine.
///
/// The engine never retries or logs; every error goes straight back to the
/// caller, which decides what the user sees.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProgressionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not enough skill points to unlock '{skill_id}' (available: {available})")]
    InsufficientSkillPoints { skill_id: String, available: u32 },

    #[error("skill '{0}' is not eligible for unlock yet")]
    NotEligible(String),

    #[error("unknown skill: '{0}'")]
    UnknownSkill(String),
}

impl ProgressionError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ProgressionError::InvalidInput(msg.into())
    }
}
