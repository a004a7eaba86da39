pub mod achievements;
pub mod attributes;
pub mod error;
pub mod leveling;
pub mod progression;
pub mod skill_tree;
pub mod streak;
pub mod xp;

pub use error::ProgressionError;
