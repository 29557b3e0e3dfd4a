//! Experience and morale progression within a match.
//!
//! - `xp`: awards and level thresholds
//! - `morale`: end-of-round drift toward the team pool

pub mod xp;
pub mod morale;

pub use xp::{award_xp, level_for, settle_level, LevelChange};
pub use morale::MoraleDrift;
