//! Teams: a fixed roster plus a shared morale pool and synergy state.

use serde::{Deserialize, Serialize};

use crate::core::{TeamId, UnitId};

use super::attributes::AttributeKind;
use super::role::Role;
use super::unit::{Unit, MAX_STAT};

/// Units a team fields in every match.
pub const ACTIVE_ROSTER_SIZE: usize = 8;

/// Activation bonus granted by an active field leader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Synergy {
    pub active: bool,
    /// Added to every trait activation chance on the team.
    pub bonus: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    /// League division label.
    pub division: String,
    pub units: Vec<Unit>,
    pub morale: f64,
    pub synergy: Synergy,
}

impl Team {
    /// Build a team; team morale starts at the roster's mean morale.
    pub fn new(id: TeamId, name: impl Into<String>, units: Vec<Unit>) -> Self {
        let morale = if units.is_empty() {
            0.0
        } else {
            units.iter().map(|u| u.morale).sum::<f64>() / units.len() as f64
        };
        let mut team = Self {
            id,
            name: name.into(),
            division: String::new(),
            units,
            morale,
            synergy: Synergy::default(),
        };
        team.refresh_synergy(true);
        team
    }

    /// Set the league division label (builder pattern).
    #[must_use]
    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = division.into();
        self
    }

    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Roster slot of a unit.
    #[must_use]
    pub fn slot_of(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|u| u.id == id)
    }

    #[must_use]
    pub fn field_leader(&self) -> Option<&Unit> {
        self.units.iter().find(|u| u.role == Role::FieldLeader)
    }

    #[must_use]
    pub fn field_leader_down(&self) -> bool {
        self.field_leader().map_or(true, |fl| fl.knocked_out)
    }

    #[must_use]
    pub fn knockouts(&self) -> usize {
        self.units.iter().filter(|u| u.knocked_out).count()
    }

    /// Sum of HP over units still standing.
    #[must_use]
    pub fn remaining_hp(&self) -> f64 {
        self.units.iter().filter(|u| !u.knocked_out).map(|u| u.hp).sum()
    }

    /// Change team morale, clamped to `[0, 100]`. Returns the applied delta.
    pub fn adjust_morale(&mut self, delta: f64) -> f64 {
        if !delta.is_finite() {
            return 0.0;
        }
        let before = self.morale;
        self.morale = (self.morale + delta).clamp(0.0, MAX_STAT);
        self.morale - before
    }

    /// Recompute synergy from the field leader's leadership.
    ///
    /// Each leadership point above 5 adds 1% activation chance; a leader
    /// below average grants nothing. Synergy lapses while the leader is
    /// knocked out.
    pub fn refresh_synergy(&mut self, enabled: bool) {
        self.synergy = match self.field_leader() {
            Some(fl) if enabled && !fl.knocked_out => {
                let lead = fl.effective_attribute(AttributeKind::Leadership);
                Synergy {
                    active: true,
                    bonus: ((lead - 5.0) * 0.01).max(0.0),
                }
            }
            _ => Synergy::default(),
        };
    }
}
