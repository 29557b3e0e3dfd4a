//! Experience awards and levels.
//!
//! XP accumulates during the match; levels are settled once, at match end,
//! so a level gained mid-match never changes that match's combat.

use serde::{Deserialize, Serialize};

use crate::core::UnitId;
use crate::units::Unit;

/// A unit crossed one or more level thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub unit: UnitId,
    pub from: u8,
    pub to: u8,
    pub xp: u32,
}

/// Level reached with `xp` cumulative experience. Level 1 is the floor.
#[must_use]
pub fn level_for(xp: u32, thresholds: &[u32]) -> u8 {
    let reached = thresholds.iter().take_while(|&&t| xp >= t).count();
    u8::try_from(reached.max(1)).unwrap_or(u8::MAX)
}

/// Add XP to a unit's lifetime and match totals.
pub fn award_xp(unit: &mut Unit, amount: u32) {
    unit.xp = unit.xp.saturating_add(amount);
    unit.xp_earned = unit.xp_earned.saturating_add(amount);
}

/// Recompute the unit's level. Levels never go down.
pub fn settle_level(unit: &mut Unit, thresholds: &[u32]) -> Option<LevelChange> {
    let level = level_for(unit.xp, thresholds);
    if level <= unit.level {
        return None;
    }
    let change = LevelChange {
        unit: unit.id,
        from: unit.level,
        to: level,
        xp: unit.xp,
    };
    unit.level = level;
    Some(change)
}
