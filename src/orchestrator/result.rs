//! Match outcome and the structured result handed to callers.

use serde::{Deserialize, Serialize};

use crate::board::BoardState;
use crate::combat::ConvergenceRecord;
use crate::core::{MatchError, Side, SideMap, UnitId};
use crate::events::MatchEvent;
use crate::units::{Team, Unit};

use super::context::TraitLogEntry;
use super::round::RoundStep;

/// Terminal state of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    TeamAWin,
    TeamBWin,
    Draw,
    /// Aborted on an integrity violation or a repeated step failure.
    SimulationFailed,
}

impl MatchOutcome {
    #[must_use]
    pub fn win_for(side: Side) -> Self {
        match side {
            Side::A => MatchOutcome::TeamAWin,
            Side::B => MatchOutcome::TeamBWin,
        }
    }

    #[must_use]
    pub fn winner(self) -> Option<Side> {
        match self {
            MatchOutcome::TeamAWin => Some(Side::A),
            MatchOutcome::TeamBWin => Some(Side::B),
            _ => None,
        }
    }
}

/// Why the match ended. `side` is always the losing side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TerminationReason {
    FieldLeaderKnockedOut { side: Side },
    KnockoutLimit { side: Side },
    MoraleCollapse { side: Side },
    /// Both sides met a loss condition in the same round.
    MutualCollapse,
    /// Round limit reached; decided on remaining HP plus weighted material.
    RoundLimit { score_a: f64, score_b: f64 },
    Failure,
}

/// Why and where a match was aborted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub round: u32,
    /// Failing step, for step failures. `None` for integrity violations.
    pub step: Option<RoundStep>,
    pub error: String,
    /// JSON dump of the state at the time of failure.
    pub diagnostic: String,
}

/// HP, stamina and morale of a unit at match end.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub hp: f64,
    pub stamina: f64,
    pub morale: f64,
    pub knocked_out: bool,
}

impl UnitSnapshot {
    #[must_use]
    pub fn of(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            hp: unit.hp,
            stamina: unit.stamina,
            morale: unit.morale,
            knocked_out: unit.knocked_out,
        }
    }
}

/// Everything a finished match produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: String,
    pub day: u32,
    pub seed: u64,
    pub outcome: MatchOutcome,
    pub reason: TerminationReason,
    pub rounds_played: u32,
    pub teams: SideMap<Team>,
    /// Boards ordered by owning unit.
    pub boards: Vec<BoardState>,
    pub events: Vec<MatchEvent>,
    pub convergences: Vec<ConvergenceRecord>,
    pub trait_log: Vec<TraitLogEntry>,
    pub failure: Option<FailureReport>,
}

impl MatchResult {
    pub fn to_json(&self) -> Result<String, MatchError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, MatchError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, MatchError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MatchError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// The event log alone, as JSON.
    pub fn event_log_json(&self) -> Result<String, MatchError> {
        Ok(serde_json::to_string(&self.events)?)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.outcome == MatchOutcome::SimulationFailed
    }

    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.teams.iter().find_map(|(_, team)| team.unit(id))
    }

    /// Final unit states, side A first, in roster order.
    #[must_use]
    pub fn final_unit_states(&self) -> Vec<UnitSnapshot> {
        self.teams
            .iter()
            .flat_map(|(_, team)| team.units.iter().map(UnitSnapshot::of))
            .collect()
    }
}
