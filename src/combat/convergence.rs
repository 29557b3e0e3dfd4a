//! Cross-board convergences.
//!
//! Two units on opposing teams converge when, in the same round, both move a
//! piece (pawns excluded by default) to the same square on their own boards.
//! Candidates are resolved in a fixed order: by square, then by the better
//! role priority of the pair, then by unit ids. Each candidate passes a gate
//! (both active, both under the per-match cap, neither over its fair share
//! of this round's convergences) before the contested roll.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::board::{PieceKind, Square};
use crate::core::{
    CombatConfig, ContestWinner, ContestedRoll, ConvergenceConfig, FatigueTable, MatchConfig,
    ProbabilityEngine, Side, UnitId,
};
use crate::events::ConvergenceSkip;
use crate::traits::EffectTarget;
use crate::units::{AttributeKind, FatigueTier, Role, Unit};

/// Where a unit's move landed this round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFootprint {
    pub unit: UnitId,
    pub side: Side,
    pub role: Role,
    pub square: Square,
    pub piece: PieceKind,
}

/// A pair of opposing units that landed on the same square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvergenceCandidate {
    pub square: Square,
    /// Side A's unit.
    pub first: BoardFootprint,
    /// Side B's unit.
    pub second: BoardFootprint,
}

impl ConvergenceCandidate {
    fn sort_key(&self) -> (Square, u8, UnitId, UnitId) {
        let priority = self.first.role.priority().min(self.second.role.priority());
        let (lo, hi) = if self.first.unit <= self.second.unit {
            (self.first.unit, self.second.unit)
        } else {
            (self.second.unit, self.first.unit)
        };
        (self.square, priority, lo, hi)
    }

    #[must_use]
    pub fn units(&self) -> [UnitId; 2] {
        [self.first.unit, self.second.unit]
    }
}

/// Find every convergence candidate among this round's footprints, in
/// resolution order.
#[must_use]
pub fn detect(footprints: &[BoardFootprint], ignore_pawns: bool) -> Vec<ConvergenceCandidate> {
    let eligible = |f: &&BoardFootprint| !(ignore_pawns && f.piece == PieceKind::Pawn);
    let mut candidates: Vec<ConvergenceCandidate> = footprints
        .iter()
        .filter(|f| f.side == Side::A)
        .filter(eligible)
        .flat_map(|a| {
            footprints
                .iter()
                .filter(|f| f.side == Side::B)
                .filter(eligible)
                .filter(move |b| b.square == a.square)
                .map(move |b| ConvergenceCandidate {
                    square: a.square,
                    first: *a,
                    second: *b,
                })
        })
        .collect();
    candidates.sort_by_key(ConvergenceCandidate::sort_key);
    candidates
}

/// Per-round bookkeeping for conflicts and the fairness share.
#[derive(Clone, Debug, Default)]
pub struct ConvergenceTally {
    resolved: u32,
    per_unit: FxHashMap<UnitId, u32>,
}

impl ConvergenceTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convergences resolved so far this round.
    #[must_use]
    pub fn resolved(&self) -> u32 {
        self.resolved
    }

    /// Has `unit` already fought this round?
    #[must_use]
    pub fn is_claimed(&self, unit: UnitId) -> bool {
        self.per_unit.contains_key(&unit)
    }

    /// Fraction of this round's resolved convergences `unit` took part in.
    #[must_use]
    pub fn share(&self, unit: UnitId) -> f64 {
        if self.resolved == 0 {
            return 0.0;
        }
        f64::from(self.per_unit.get(&unit).copied().unwrap_or(0)) / f64::from(self.resolved)
    }

    pub fn record(&mut self, units: [UnitId; 2]) {
        self.resolved += 1;
        for unit in units {
            *self.per_unit.entry(unit).or_insert(0) += 1;
        }
    }
}

/// A resolved convergence, as kept in the match's convergence log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRecord {
    pub round: u32,
    pub square: Square,
    /// Side A's unit first.
    pub units: [UnitId; 2],
    pub scores: [f64; 2],
    pub roll: ContestedRoll,
    pub winner: Option<UnitId>,
    pub loser: Option<UnitId>,
    pub margin: f64,
    pub critical: bool,
    pub damage: f64,
    pub assists: Vec<UnitId>,
}

/// Scores, gates and contests convergences.
#[derive(Clone, Copy)]
pub struct ConvergenceResolver<'a> {
    config: &'a ConvergenceConfig,
    combat: &'a CombatConfig,
    fatigue: &'a FatigueTable,
    fairness: bool,
}

impl<'a> ConvergenceResolver<'a> {
    #[must_use]
    pub fn from_config(config: &'a MatchConfig) -> Self {
        Self {
            config: &config.convergence,
            combat: &config.combat,
            fatigue: &config.fatigue,
            fairness: config.features.fairness_policy,
        }
    }

    /// Combat score used in the contested roll.
    ///
    /// Attribute combat base with status modifiers, reduced by fatigue
    /// accuracy loss and scaled by morale (0.9 at 0 morale, 1.1 at 100).
    #[must_use]
    pub fn effective_score(&self, unit: &Unit) -> f64 {
        let mut attributes = unit.attributes;
        for kind in AttributeKind::ALL {
            *attributes.get_mut(kind) = unit.effective_attribute(kind);
        }
        let mut score = unit.status.modify(EffectTarget::CombatScore, attributes.combat_base());
        if unit.fatigue_tier(self.fatigue) >= FatigueTier::Minor {
            score *= 1.0 - self.fatigue.minor_accuracy_penalty;
        }
        score *= 0.9 + unit.morale / 500.0;
        score.max(0.0)
    }

    /// Check whether `unit` may take part in another convergence this round.
    pub fn gate_unit(&self, unit: &Unit, tally: &ConvergenceTally) -> Result<(), ConvergenceSkip> {
        if !unit.is_active() {
            return Err(ConvergenceSkip::Inactive(unit.id));
        }
        if unit.convergences >= self.config.max_per_unit {
            return Err(ConvergenceSkip::CapReached(unit.id));
        }
        if self.fairness
            && tally.resolved() >= self.config.fairness_min_sample
            && tally.share(unit.id) > self.config.fairness_share
        {
            return Err(ConvergenceSkip::FairnessShare(unit.id));
        }
        Ok(())
    }

    /// Gate both units, first failure wins.
    pub fn gate(&self, first: &Unit, second: &Unit, tally: &ConvergenceTally) -> Result<(), ConvergenceSkip> {
        self.gate_unit(first, tally)?;
        self.gate_unit(second, tally)
    }

    #[must_use]
    pub fn is_critical(&self, margin: f64) -> bool {
        margin >= self.combat.critical_margin
    }

    /// Roll the contest between two effective scores, side A first.
    pub fn contest(&self, scores: [f64; 2], dice: &mut ProbabilityEngine) -> ContestedRoll {
        dice.contested_roll(scores[0], scores[1])
    }

    /// Winner and loser ids, `None` on a tie.
    #[must_use]
    pub fn outcome(candidate: &ConvergenceCandidate, roll: &ContestedRoll) -> Option<(UnitId, UnitId)> {
        match roll.winner {
            ContestWinner::First => Some((candidate.first.unit, candidate.second.unit)),
            ContestWinner::Second => Some((candidate.second.unit, candidate.first.unit)),
            ContestWinner::Tie => None,
        }
    }
}

/// Allies of `winner` whose move landed within one king step of `square`.
#[must_use]
pub fn assists(footprints: &[BoardFootprint], winner: UnitId, side: Side, square: Square) -> Vec<UnitId> {
    let mut ids: Vec<UnitId> = footprints
        .iter()
        .filter(|f| f.side == side && f.unit != winner && f.square.distance(square) <= 1)
        .map(|f| f.unit)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
