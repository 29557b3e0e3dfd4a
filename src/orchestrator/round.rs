//! One round of a match.
//!
//! ```text
//! Initiative → RequestMoves → PreMoveTraits → ExecuteMoves
//!            → Convergence → PostMoveTraits → EndOfRound → LossCheck
//! ```
//!
//! `RoundDriver` runs the first seven steps against a `MatchContext`. Each
//! step returns `Result<(), StepError>`; the orchestrator owns the snapshot
//! and retry policy. A step listed as skipped becomes a no-op, and every
//! later step tolerates the missing output (no initiative shuffle, no moves,
//! and so on).
//!
//! Trait reactions (HP drops, stamina crossings, ally events) are queued and
//! drained after each action rather than fired recursively, so a chain of
//! triggers resolves in a stable FIFO order.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{BoardOutcome, BoardState, FallbackMoveGenerator, OracleGateway, OracleMove};
use crate::combat::{
    assists, detect, ActionType, BoardFootprint, CombatCalibrator, CombatOutcome, CombatantView,
    ConvergenceRecord, ConvergenceResolver, ConvergenceTally,
};
use crate::core::{LossConditions, Side, SideMap, SubscriberError, UnitId};
use crate::events::{ConvergenceSkip, DamageSource, EventBus, EventPayload, KnockoutCause};
use crate::progression::{award_xp, MoraleDrift};
use crate::stamina::{Activity, StaminaEngine};
use crate::traits::{AllyEventKind, TraitEngine, TraitEvent, TraitOutcome};
use crate::units::{Injury, Role, StaminaChange, Team, Unit};

use super::context::{MatchContext, TraitLogEntry};
use super::result::{MatchOutcome, TerminationReason};

/// Steps of a round, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundStep {
    Initiative,
    RequestMoves,
    PreMoveTraits,
    ExecuteMoves,
    Convergence,
    PostMoveTraits,
    EndOfRound,
    LossCheck,
}

impl RoundStep {
    /// Steps run by `RoundDriver`. The loss check runs after the round commits.
    pub const SEQUENCE: [RoundStep; 7] = [
        RoundStep::Initiative,
        RoundStep::RequestMoves,
        RoundStep::PreMoveTraits,
        RoundStep::ExecuteMoves,
        RoundStep::Convergence,
        RoundStep::PostMoveTraits,
        RoundStep::EndOfRound,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            RoundStep::Initiative => "initiative",
            RoundStep::RequestMoves => "request-moves",
            RoundStep::PreMoveTraits => "pre-move-traits",
            RoundStep::ExecuteMoves => "execute-moves",
            RoundStep::Convergence => "convergence",
            RoundStep::PostMoveTraits => "post-move-traits",
            RoundStep::EndOfRound => "end-of-round",
            RoundStep::LossCheck => "loss-check",
        }
    }
}

impl std::fmt::Display for RoundStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A round step could not complete.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("{step} step: {source}")]
    Subscriber {
        step: RoundStep,
        #[source]
        source: SubscriberError,
    },

    #[error("{step} step: {unit} is not part of this match")]
    UnknownUnit { step: RoundStep, unit: UnitId },
}

impl StepError {
    #[must_use]
    pub fn step(&self) -> RoundStep {
        match self {
            StepError::Subscriber { step, .. } | StepError::UnknownUnit { step, .. } => *step,
        }
    }
}

/// Executes the steps of one round.
pub struct RoundDriver<'a> {
    ctx: &'a mut MatchContext,
    gateway: &'a mut OracleGateway,
    bus: &'a mut EventBus,
    fallback: FallbackMoveGenerator,
    step: RoundStep,
    initiative: Vec<UnitId>,
    moves: BTreeMap<UnitId, OracleMove>,
    activity: FxHashMap<UnitId, Activity>,
    footprints: Vec<BoardFootprint>,
    reactions: VecDeque<(UnitId, TraitEvent)>,
}

impl<'a> RoundDriver<'a> {
    pub fn new(
        ctx: &'a mut MatchContext,
        gateway: &'a mut OracleGateway,
        bus: &'a mut EventBus,
        fallback: FallbackMoveGenerator,
    ) -> Self {
        let initiative = active_in_order(ctx);
        Self {
            ctx,
            gateway,
            bus,
            fallback,
            step: RoundStep::Initiative,
            initiative,
            moves: BTreeMap::new(),
            activity: FxHashMap::default(),
            footprints: Vec::new(),
            reactions: VecDeque::new(),
        }
    }

    /// Run every step of the round, treating `skip` as a no-op.
    pub fn run(mut self, skip: Option<RoundStep>) -> Result<(), StepError> {
        for step in RoundStep::SEQUENCE {
            self.step = step;
            if skip == Some(step) {
                tracing::debug!(round = self.ctx.state.round, %step, "step skipped on retry");
                continue;
            }
            match step {
                RoundStep::Initiative => self.initiative()?,
                RoundStep::RequestMoves => self.request_moves()?,
                RoundStep::PreMoveTraits => {
                    self.batch(TraitEvent::RoundStart)?;
                    self.batch(TraitEvent::PreMove)?;
                }
                RoundStep::ExecuteMoves => self.execute_moves()?,
                RoundStep::Convergence => self.convergences()?,
                RoundStep::PostMoveTraits => self.batch(TraitEvent::PostMove)?,
                RoundStep::EndOfRound => self.end_of_round()?,
                RoundStep::LossCheck => {}
            }
        }
        Ok(())
    }

    // === Helpers ===

    fn round(&self) -> u32 {
        self.ctx.state.round
    }

    fn emit(&mut self, unit_ids: impl IntoIterator<Item = UnitId>, payload: EventPayload) -> Result<(), StepError> {
        let step = self.step;
        self.ctx
            .emit(self.bus, unit_ids, payload)
            .map_err(|source| StepError::Subscriber { step, source })
    }

    fn locate(&self, id: UnitId) -> Result<(Side, usize), StepError> {
        self.ctx.locate(id).ok_or(StepError::UnknownUnit { step: self.step, unit: id })
    }

    fn unit(&self, id: UnitId) -> Result<&Unit, StepError> {
        self.ctx.unit(id).ok_or(StepError::UnknownUnit { step: self.step, unit: id })
    }

    fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit, StepError> {
        let step = self.step;
        self.ctx.unit_mut(id).ok_or(StepError::UnknownUnit { step, unit: id })
    }

    fn board_mut(&mut self, id: UnitId) -> Result<&mut BoardState, StepError> {
        let step = self.step;
        self.ctx
            .state
            .boards
            .get_mut(&id)
            .ok_or(StepError::UnknownUnit { step, unit: id })
    }

    fn is_active(&self, id: UnitId) -> bool {
        self.ctx.unit(id).map_or(false, Unit::is_active)
    }

    fn mark_activity(&mut self, id: UnitId, activity: Activity) {
        let entry = self.activity.entry(id).or_insert(Activity::Idle);
        *entry = (*entry).max(activity);
    }

    // === Initiative and moves ===

    fn initiative(&mut self) -> Result<(), StepError> {
        let mut order = active_in_order(self.ctx);
        self.ctx.state.dice.shuffle(&mut order);
        self.initiative.clone_from(&order);
        self.emit([], EventPayload::RoundStarted { initiative: order })
    }

    fn request_moves(&mut self) -> Result<(), StepError> {
        let config = Arc::clone(&self.ctx.config);
        let round = self.round();

        for id in self.initiative.clone() {
            let unit = self.unit(id)?;
            if !unit.is_active() {
                continue;
            }
            let depth = if unit.role == Role::FieldLeader {
                config.oracle.depth.saturating_add(config.oracle.field_leader_depth_bonus)
            } else {
                config.oracle.depth
            };
            let board = self.board_mut(id)?;
            if board.is_finished() {
                continue;
            }
            let position = board.position.clone();

            let mv = match self.gateway.request(&position, depth) {
                Ok(mv) => mv,
                Err(err) => {
                    let mv = self.fallback.generate(&position, &mut self.ctx.state.dice);
                    self.board_mut(id)?.fallback_moves += 1;
                    if self.gateway.has_oracle() {
                        tracing::warn!(round, unit = %id, error = %err, "oracle failed, using fallback move");
                        self.emit([id], EventPayload::OracleFallback { reason: err.to_string() })?;
                    }
                    mv
                }
            };
            self.moves.insert(id, mv);
        }
        Ok(())
    }

    fn execute_moves(&mut self) -> Result<(), StepError> {
        let config = Arc::clone(&self.ctx.config);
        let calibrator = CombatCalibrator::from_config(&config);

        for id in self.initiative.clone() {
            let Some(mv) = self.moves.get(&id).cloned() else {
                continue;
            };
            // Knocked out earlier this step.
            if !self.is_active(id) {
                continue;
            }
            let (side, _) = self.locate(id)?;
            let role = self.unit(id)?.role;
            let finished = self.board_mut(id)?.apply(&mv);

            self.emit(
                [id],
                EventPayload::MoveExecuted {
                    notation: mv.notation.clone(),
                    piece: mv.piece,
                    to: mv.to,
                    material_delta: mv.material_delta,
                },
            )?;
            self.footprints.push(BoardFootprint {
                unit: id,
                side,
                role,
                square: mv.to,
                piece: mv.piece,
            });
            self.mark_activity(id, Activity::Moved);

            if mv.material_delta != 0 {
                if let Some(opponent) = self.ctx.opponent_of(id).filter(|&o| self.is_active(o)) {
                    if mv.material_delta > 0 {
                        self.mark_activity(id, Activity::Captured);
                        let action = ActionType::Capture {
                            material: mv.material_delta,
                        };
                        self.combat(&calibrator, id, opponent, action, DamageSource::Capture)?;
                    } else {
                        let action = ActionType::MaterialLoss {
                            material: -mv.material_delta,
                        };
                        self.combat(&calibrator, opponent, id, action, DamageSource::MaterialLoss)?;
                    }
                    self.drain_reactions()?;
                }
            }

            if let Some(outcome) = finished {
                self.board_finished(id, side, outcome)?;
            }
        }
        Ok(())
    }

    fn board_finished(&mut self, id: UnitId, side: Side, outcome: BoardOutcome) -> Result<(), StepError> {
        let config = Arc::clone(&self.ctx.config);
        if outcome == BoardOutcome::Won {
            award_xp(self.unit_mut(id)?, config.xp.board_win);
            self.ctx.state.teams[side].adjust_morale(config.morale.board_win_team_gain);
        }
        tracing::debug!(round = self.round(), unit = %id, ?outcome, "board finished");
        self.emit([id], EventPayload::BoardFinished { outcome })
    }

    // === Combat ===

    /// Calibrate and apply one hit from `attacker` to `defender`.
    fn combat(
        &mut self,
        calibrator: &CombatCalibrator<'_>,
        attacker: UnitId,
        defender: UnitId,
        action: ActionType,
        source: DamageSource,
    ) -> Result<CombatOutcome, StepError> {
        let round = self.round();
        let fatigue = &self.ctx.config.fatigue;
        let attacker_view = CombatantView::of(self.unit(attacker)?, fatigue);
        let defender_view = CombatantView::of(self.unit(defender)?, fatigue);
        let outcome = calibrator.resolve(&attacker_view, &defender_view, action, &mut self.ctx.state.dice);

        let defender_unit = self.unit_mut(defender)?;
        let report = defender_unit.apply_damage(outcome.damage, round);
        defender_unit.adjust_morale(outcome.defender_morale);
        award_xp(defender_unit, outcome.defender_xp);
        if let Some(severity) = outcome.injury {
            // Every severity sits out exactly one match.
            defender_unit.injuries.push(Injury {
                severity,
                round,
                recovery_matches: 1,
            });
        }

        let attacker_unit = self.unit_mut(attacker)?;
        attacker_unit.adjust_morale(outcome.attacker_morale);
        award_xp(attacker_unit, outcome.attacker_xp);

        let (attacker_side, _) = self.locate(attacker)?;
        let (defender_side, _) = self.locate(defender)?;
        self.ctx.state.teams[attacker_side].adjust_morale(outcome.attacker_team_morale);
        self.ctx.state.teams[defender_side].adjust_morale(outcome.defender_team_morale);

        if outcome.damage > 0.0 {
            self.emit(
                [defender, attacker],
                EventPayload::DamageApplied {
                    source,
                    amount: outcome.damage,
                    hp_after: report.hp_after,
                },
            )?;
            self.reactions.push_back((
                defender,
                TraitEvent::HpDropped {
                    before: report.hp_before,
                    after: report.hp_after,
                },
            ));
        }
        if let Some(severity) = outcome.injury {
            self.emit([defender], EventPayload::InjuryInflicted { severity })?;
        }
        if report.knocked_out {
            // The calibrator already charged the team morale loss.
            self.knockout(defender, KnockoutCause::Damage(source), false)?;
        }
        Ok(outcome)
    }

    fn knockout(&mut self, id: UnitId, cause: KnockoutCause, charge_team: bool) -> Result<(), StepError> {
        let config = Arc::clone(&self.ctx.config);
        let (side, _) = self.locate(id)?;
        let role = self.unit(id)?.role;
        self.board_mut(id)?.finish(BoardOutcome::Lost);

        tracing::info!(round = self.round(), unit = %id, ?cause, "unit knocked out");
        self.emit([id], EventPayload::KnockedOut { cause })?;

        let team = &mut self.ctx.state.teams[side];
        if charge_team {
            let m = &config.morale;
            let mut loss = m.knockout_team_loss * m.knockout_loss_multiplier;
            if role == Role::FieldLeader {
                loss += m.field_leader_team_loss;
            }
            team.adjust_morale(-loss);
        }
        if role == Role::FieldLeader {
            team.refresh_synergy(config.features.synergy);
        }

        for ally in self.ctx.active_allies(id) {
            self.reactions
                .push_back((ally, TraitEvent::Ally(AllyEventKind::KnockedOut)));
        }
        Ok(())
    }

    // === Traits ===

    fn batch(&mut self, event: TraitEvent) -> Result<(), StepError> {
        for id in self.ctx.resolution_order().to_vec() {
            self.fire(id, event)?;
            self.drain_reactions()?;
        }
        Ok(())
    }

    fn drain_reactions(&mut self) -> Result<(), StepError> {
        while let Some((id, event)) = self.reactions.pop_front() {
            self.fire(id, event)?;
        }
        Ok(())
    }

    /// Resolve every trait of `id` triggered by `event`, by trait id.
    fn fire(&mut self, id: UnitId, event: TraitEvent) -> Result<(), StepError> {
        let config = Arc::clone(&self.ctx.config);
        let catalog = Arc::clone(&self.ctx.catalog);
        let engine = TraitEngine::new(&catalog, &config.traits, &config.fatigue);

        let unit = self.unit(id)?;
        if !unit.is_active() {
            return Ok(());
        }
        for index in engine.triggered(unit, &event) {
            self.activate(&engine, id, index)?;
        }
        Ok(())
    }

    fn activate(&mut self, engine: &TraitEngine<'_>, id: UnitId, index: usize) -> Result<(), StepError> {
        let round = self.round();
        let step = self.step;
        let (side, slot) = self.locate(id)?;
        let state = &mut self.ctx.state;
        let synergy = state.teams[side].synergy.bonus;
        let Some(unit) = state.teams[side].units.get_mut(slot) else {
            return Err(StepError::UnknownUnit { step, unit: id });
        };

        match engine.resolve(unit, index, round, synergy, &mut state.dice) {
            TraitOutcome::Activated(activation) => {
                let config = Arc::clone(&self.ctx.config);
                award_xp(self.unit_mut(id)?, config.xp.trait_activation);
                self.ctx.state.trait_log.push_back(TraitLogEntry {
                    round,
                    unit: id,
                    trait_id: activation.trait_id,
                    chance: activation.chance,
                    cost: activation.cost,
                    delta: activation.delta,
                    inert: activation.inert.is_some(),
                });
                tracing::debug!(round, unit = %id, trait_id = %activation.trait_id, "trait activated");
                self.emit(
                    [id],
                    EventPayload::TraitActivated {
                        trait_id: activation.trait_id,
                        chance: activation.chance,
                        cost: activation.cost,
                        delta: activation.delta,
                    },
                )?;

                if let Some(err) = &activation.inert {
                    tracing::warn!(round, unit = %id, error = %err, "trait formula failed, activation is inert");
                    self.emit(
                        [id],
                        EventPayload::TraitFormulaFailed {
                            trait_id: err.trait_id,
                            reason: err.reason.clone(),
                        },
                    )?;
                }

                let source = DamageSource::Trait(activation.trait_id);
                let mut cause = KnockoutCause::Exhaustion;
                if let Some(hp) = activation.hp_change.filter(|hp| hp.hp_after < hp.hp_before) {
                    self.emit(
                        [id],
                        EventPayload::DamageApplied {
                            source,
                            amount: hp.hp_before - hp.hp_after,
                            hp_after: hp.hp_after,
                        },
                    )?;
                    self.reactions.push_back((
                        id,
                        TraitEvent::HpDropped {
                            before: hp.hp_before,
                            after: hp.hp_after,
                        },
                    ));
                    if hp.knocked_out {
                        cause = KnockoutCause::Damage(source);
                    }
                }
                for change in &activation.stamina_changes {
                    self.stamina_changed(id, change)?;
                }
                if activation.knocked_out() {
                    self.knockout(id, cause, true)?;
                }
                Ok(())
            }
            TraitOutcome::RollFailed { trait_id, chance } => {
                tracing::trace!(round, unit = %id, %trait_id, chance, "trait roll failed");
                Ok(())
            }
            TraitOutcome::Skipped { trait_id, reason } => {
                tracing::debug!(round, unit = %id, %trait_id, %reason, "trait skipped");
                self.emit(
                    [id],
                    EventPayload::TraitSkipped {
                        trait_id,
                        reason: reason.to_string(),
                    },
                )
            }
        }
    }

    fn stamina_changed(&mut self, id: UnitId, change: &StaminaChange) -> Result<(), StepError> {
        for crossing in &change.crossings {
            self.emit(
                [id],
                EventPayload::StaminaThresholdCrossed {
                    boundary: crossing.boundary,
                    direction: crossing.direction,
                    stamina: crossing.stamina,
                    reason: crossing.reason,
                },
            )?;
            self.reactions.push_back((
                id,
                TraitEvent::StaminaCrossed {
                    boundary: crossing.boundary,
                    direction: crossing.direction,
                },
            ));
        }
        Ok(())
    }

    // === Convergence ===

    fn convergences(&mut self) -> Result<(), StepError> {
        let config = Arc::clone(&self.ctx.config);
        let resolver = ConvergenceResolver::from_config(&config);
        let calibrator = CombatCalibrator::from_config(&config);
        let round = self.round();
        let mut tally = ConvergenceTally::new();

        'candidates: for candidate in detect(&self.footprints, config.convergence.ignore_pawns) {
            let square = candidate.square;
            let units = candidate.units();
            let [first, second] = units;

            for contested in units {
                if tally.is_claimed(contested) {
                    self.emit(units, EventPayload::ConvergenceConflict { square, contested })?;
                }
            }

            if let Err(reason) = resolver.gate(self.unit(first)?, self.unit(second)?, &tally) {
                tracing::debug!(round, %square, ?reason, "convergence skipped");
                self.emit(units, EventPayload::ConvergenceSkipped { square, reason })?;
                continue;
            }

            let mut pair = [(candidate.first.role.priority(), first), (candidate.second.role.priority(), second)];
            pair.sort_unstable();
            for (_, id) in pair {
                self.fire(id, TraitEvent::Convergence)?;
            }
            self.drain_reactions()?;

            // A convergence trait can knock out its own unit.
            for id in units {
                if !self.is_active(id) {
                    let reason = ConvergenceSkip::Inactive(id);
                    self.emit(units, EventPayload::ConvergenceSkipped { square, reason })?;
                    continue 'candidates;
                }
            }

            let scores = [
                resolver.effective_score(self.unit(first)?),
                resolver.effective_score(self.unit(second)?),
            ];
            let roll = resolver.contest(scores, &mut self.ctx.state.dice);
            let critical = resolver.is_critical(roll.margin);
            tally.record(units);
            for id in units {
                self.unit_mut(id)?.convergences += 1;
                self.mark_activity(id, Activity::Converged);
            }

            let mut record = ConvergenceRecord {
                round,
                square,
                units,
                scores,
                roll,
                winner: None,
                loser: None,
                margin: roll.margin,
                critical,
                damage: 0.0,
                assists: Vec::new(),
            };

            if let Some((winner, loser)) = ConvergenceResolver::outcome(&candidate, &roll) {
                let action = ActionType::Convergence {
                    margin: roll.margin,
                    critical,
                };
                let outcome = self.combat(&calibrator, winner, loser, action, DamageSource::Convergence)?;

                let (winner_side, _) = self.locate(winner)?;
                let helpers: Vec<UnitId> = assists(&self.footprints, winner, winner_side, square)
                    .into_iter()
                    .filter(|&id| self.is_active(id))
                    .collect();
                for &helper in &helpers {
                    award_xp(self.unit_mut(helper)?, config.xp.assist);
                }

                for ally in self.ctx.active_allies(winner) {
                    self.reactions
                        .push_back((ally, TraitEvent::Ally(AllyEventKind::ConvergenceWon)));
                }
                for ally in self.ctx.active_allies(loser) {
                    self.reactions
                        .push_back((ally, TraitEvent::Ally(AllyEventKind::ConvergenceLost)));
                }

                record.winner = Some(winner);
                record.loser = Some(loser);
                record.damage = outcome.damage;
                record.assists = helpers;
            }

            tracing::debug!(round, %square, winner = ?record.winner, margin = record.margin, critical, "convergence resolved");
            self.emit(
                units,
                EventPayload::ConvergenceResolved {
                    square,
                    winner: record.winner,
                    margin: record.margin,
                    critical,
                    damage: record.damage,
                    assists: record.assists.clone(),
                },
            )?;
            self.ctx.state.convergences.push_back(record);
            self.drain_reactions()?;
        }
        Ok(())
    }

    // === End of round ===

    fn end_of_round(&mut self) -> Result<(), StepError> {
        let config = Arc::clone(&self.ctx.config);
        let catalog = Arc::clone(&self.ctx.catalog);
        let stamina = StaminaEngine::from_config(&config);
        let traits = TraitEngine::new(&catalog, &config.traits, &config.fatigue);
        let drift = MoraleDrift::from_config(&config);
        let round = self.round();
        let order = self.ctx.resolution_order().to_vec();

        for &id in &order {
            if self.unit(id)?.knocked_out {
                continue;
            }
            let activity = self.activity.get(&id).copied().unwrap_or(Activity::Idle);
            let change = stamina.tick(self.unit_mut(id)?, activity, round);
            self.stamina_changed(id, &change)?;
            if change.knocked_out {
                self.knockout(id, KnockoutCause::Exhaustion, true)?;
                continue;
            }

            let (side, slot) = self.locate(id)?;
            let state = &mut self.ctx.state;
            let resigns = match state.teams[side].units.get(slot) {
                Some(unit) => stamina.forced_resignation(unit, &mut state.dice),
                None => false,
            };
            if resigns {
                let unit = self.unit_mut(id)?;
                unit.resigned = true;
                unit.mark_knockout(round);
                let remaining = unit.stamina;
                tracing::info!(round, unit = %id, stamina = remaining, "forced resignation");
                self.emit([id], EventPayload::ForcedResignation { stamina: remaining })?;
                // A resignation counts as a knockout for every loss condition.
                self.knockout(id, KnockoutCause::Resignation, true)?;
            }
        }
        self.drain_reactions()?;

        for &id in &order {
            if self.unit(id)?.knocked_out {
                continue;
            }
            let (side, _) = self.locate(id)?;
            let team_morale = self.ctx.state.teams[side].morale;
            let unit = self.unit_mut(id)?;
            traits.end_of_round(unit, round);
            let expired = unit.status.tick();
            drift.apply(unit, team_morale);
            award_xp(unit, config.xp.round_survived);

            for effect in expired {
                self.emit([id], EventPayload::StatusExpired { source: effect.source })?;
            }
        }

        for (_, team) in self.ctx.state.teams.iter_mut() {
            team.refresh_synergy(config.features.synergy);
        }
        Ok(())
    }
}

/// Active units by role priority, then id.
fn active_in_order(ctx: &MatchContext) -> Vec<UnitId> {
    ctx.resolution_order()
        .iter()
        .copied()
        .filter(|&id| ctx.unit(id).map_or(false, Unit::is_active))
        .collect()
}

// === Loss check ===

fn loss_reason(side: Side, team: &Team, loss: &LossConditions) -> Option<TerminationReason> {
    if loss.field_leader_knockout && team.field_leader_down() {
        Some(TerminationReason::FieldLeaderKnockedOut { side })
    } else if team.knockouts() >= loss.max_knockouts {
        Some(TerminationReason::KnockoutLimit { side })
    } else if team.morale <= loss.min_team_morale {
        Some(TerminationReason::MoraleCollapse { side })
    } else {
        None
    }
}

/// Evaluate the loss conditions for both sides.
///
/// Both sides losing in the same round is a draw.
#[must_use]
pub fn check_loss(teams: &SideMap<Team>, loss: &LossConditions) -> Option<(MatchOutcome, TerminationReason)> {
    let lost = teams.map(|side, team| loss_reason(side, team, loss));
    match (lost[Side::A], lost[Side::B]) {
        (None, None) => None,
        (Some(reason), None) => Some((MatchOutcome::TeamBWin, reason)),
        (None, Some(reason)) => Some((MatchOutcome::TeamAWin, reason)),
        (Some(_), Some(_)) => Some((MatchOutcome::Draw, TerminationReason::MutualCollapse)),
    }
}

/// Decide a match that reached the round limit: remaining HP plus board
/// material times the configured weight.
#[must_use]
pub fn round_limit_outcome<'b>(
    teams: &SideMap<Team>,
    boards: impl IntoIterator<Item = &'b BoardState>,
    loss: &LossConditions,
) -> (MatchOutcome, TerminationReason) {
    let mut material = SideMap::from_pair(0_i32, 0_i32);
    for board in boards {
        let owner = board.position.board;
        if teams[Side::A].unit(owner).is_some() {
            material[Side::A] += board.material();
        } else if teams[Side::B].unit(owner).is_some() {
            material[Side::B] += board.material();
        }
    }
    let score = |side: Side| teams[side].remaining_hp() + f64::from(material[side]) * loss.tiebreak_material_weight;
    let (score_a, score_b) = (score(Side::A), score(Side::B));
    let outcome = if (score_a - score_b).abs() < 1e-9 {
        MatchOutcome::Draw
    } else if score_a > score_b {
        MatchOutcome::TeamAWin
    } else {
        MatchOutcome::TeamBWin
    };
    (outcome, TerminationReason::RoundLimit { score_a, score_b })
}
