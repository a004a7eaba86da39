//! Progression engine for a workout log: XP from logged sets, levels and
//! skill points, session streaks, and skill unlocks.
//!
//! `engine` holds the pure rules; `app` runs them against a `store` with
//! compare-and-swap commits.

pub mod app;
pub mod config;
pub mod engine;
pub mod identity;
pub mod session;
pub mod store;
