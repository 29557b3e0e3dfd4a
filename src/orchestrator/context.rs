//! Per-match context and state.
//!
//! `MatchContext` is built once per match and owns everything the round loop
//! touches: shared configuration and trait catalog behind `Arc`, the roster
//! index, and the mutable `MatchState`. There is no process-wide registry;
//! each match in a matchday has its own context.
//!
//! `MatchState` holds its logs in `im::Vector` and its boards in
//! `im::OrdMap`, so cloning it for the per-round snapshot shares structure
//! with the live state instead of copying it.

use std::sync::Arc;

use im::{OrdMap, Vector};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::BoardState;
use crate::combat::ConvergenceRecord;
use crate::core::{MatchConfig, ProbabilityEngine, Side, SideMap, UnitId};
use crate::events::{EventBus, EventPayload, MatchEvent};
use crate::traits::{TraitCatalog, TraitId};
use crate::units::{Team, Unit};

/// One successful trait activation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraitLogEntry {
    pub round: u32,
    pub unit: UnitId,
    pub trait_id: TraitId,
    pub chance: f64,
    pub cost: f64,
    pub delta: f64,
    /// The effect formula failed; only the cost and cooldown applied.
    pub inert: bool,
}

/// Inputs for a single match.
#[derive(Clone, Debug)]
pub struct MatchSetup {
    pub match_id: String,
    pub day: u32,
    pub seed: u64,
    pub team_a: Team,
    pub team_b: Team,
    pub config: Arc<MatchConfig>,
    pub catalog: Arc<TraitCatalog>,
}

impl MatchSetup {
    /// Setup with default configuration, the standard trait catalog and seed 0.
    pub fn new(match_id: impl Into<String>, team_a: Team, team_b: Team) -> Self {
        Self {
            match_id: match_id.into(),
            day: 1,
            seed: 0,
            team_a,
            team_b,
            config: Arc::new(MatchConfig::default()),
            catalog: Arc::new(TraitCatalog::standard()),
        }
    }

    /// Set the RNG seed (builder pattern).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the matchday number (builder pattern).
    #[must_use]
    pub fn with_day(mut self, day: u32) -> Self {
        self.day = day;
        self
    }

    /// Set the configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: impl Into<Arc<MatchConfig>>) -> Self {
        self.config = config.into();
        self
    }

    /// Set the trait catalog (builder pattern).
    #[must_use]
    pub fn with_catalog(mut self, catalog: impl Into<Arc<TraitCatalog>>) -> Self {
        self.catalog = catalog.into();
        self
    }
}

/// Everything that changes during a match.
#[derive(Clone, Debug)]
pub struct MatchState {
    /// Current round, 0 before the first.
    pub round: u32,
    pub teams: SideMap<Team>,
    pub boards: OrdMap<UnitId, BoardState>,
    pub dice: ProbabilityEngine,
    pub events: Vector<MatchEvent>,
    pub convergences: Vector<ConvergenceRecord>,
    pub trait_log: Vector<TraitLogEntry>,
    next_seq: u64,
}

impl MatchState {
    #[must_use]
    pub fn new(teams: SideMap<Team>, seed: u64) -> Self {
        let boards = teams
            .iter()
            .flat_map(|(_, team)| team.units.iter().map(|u| (u.id, BoardState::new(u.id))))
            .collect();
        Self {
            round: 0,
            teams,
            boards,
            dice: ProbabilityEngine::new(seed),
            events: Vector::new(),
            convergences: Vector::new(),
            trait_log: Vector::new(),
            next_seq: 0,
        }
    }

    /// Append an event to the log and return it.
    pub fn record(
        &mut self,
        match_id: &str,
        unit_ids: impl IntoIterator<Item = UnitId>,
        payload: EventPayload,
    ) -> &MatchEvent {
        let event = MatchEvent::new(self.next_seq, match_id, self.round, unit_ids, payload);
        self.next_seq += 1;
        self.events.push_back(event);
        // Just pushed.
        &self.events[self.events.len() - 1]
    }
}

/// A match's configuration, roster index and state.
#[derive(Clone, Debug)]
pub struct MatchContext {
    pub match_id: String,
    pub day: u32,
    pub seed: u64,
    pub config: Arc<MatchConfig>,
    pub catalog: Arc<TraitCatalog>,
    pub state: MatchState,
    roster: FxHashMap<UnitId, (Side, usize)>,
    resolution_order: Vec<UnitId>,
}

impl MatchContext {
    /// Build a context from an already validated setup.
    #[must_use]
    pub fn new(setup: MatchSetup) -> Self {
        let teams = SideMap::from_pair(setup.team_a, setup.team_b);

        let mut roster = FxHashMap::default();
        let mut order: Vec<(u8, UnitId)> = Vec::new();
        for (side, team) in teams.iter() {
            for (slot, unit) in team.units.iter().enumerate() {
                roster.insert(unit.id, (side, slot));
                order.push((unit.role.priority(), unit.id));
            }
        }
        order.sort_unstable();

        Self {
            match_id: setup.match_id,
            day: setup.day,
            seed: setup.seed,
            config: setup.config,
            catalog: setup.catalog,
            state: MatchState::new(teams, setup.seed),
            roster,
            resolution_order: order.into_iter().map(|(_, id)| id).collect(),
        }
    }

    /// Side and roster slot of a unit.
    #[must_use]
    pub fn locate(&self, id: UnitId) -> Option<(Side, usize)> {
        self.roster.get(&id).copied()
    }

    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        let (side, slot) = self.locate(id)?;
        self.state.teams[side].units.get(slot)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        let (side, slot) = self.locate(id)?;
        self.state.teams[side].units.get_mut(slot)
    }

    /// The unit in the same roster slot on the other team.
    #[must_use]
    pub fn opponent_of(&self, id: UnitId) -> Option<UnitId> {
        let (side, slot) = self.locate(id)?;
        self.state.teams[side.opponent()].units.get(slot).map(|u| u.id)
    }

    /// Active teammates of `id`, in resolution order.
    #[must_use]
    pub fn active_allies(&self, id: UnitId) -> SmallVec<[UnitId; 8]> {
        let Some((side, _)) = self.locate(id) else {
            return SmallVec::new();
        };
        self.resolution_order
            .iter()
            .copied()
            .filter(|&other| other != id)
            .filter(|&other| {
                self.locate(other).map_or(false, |(s, _)| s == side)
                    && self.unit(other).map_or(false, Unit::is_active)
            })
            .collect()
    }

    /// All units by role priority, then id.
    #[must_use]
    pub fn resolution_order(&self) -> &[UnitId] {
        &self.resolution_order
    }

    /// Append an event and deliver it to subscribers.
    pub fn emit(
        &mut self,
        bus: &mut EventBus,
        unit_ids: impl IntoIterator<Item = UnitId>,
        payload: EventPayload,
    ) -> Result<(), crate::core::SubscriberError> {
        let event = self.state.record(&self.match_id, unit_ids, payload);
        bus.dispatch(event)
    }
}
