//! Match orchestrator: the round loop with snapshot, retry and termination.
//!
//! Each round runs against a snapshot of `MatchState`. When a step fails the
//! state is restored and the round is replayed once with the failing step
//! skipped; a second failure aborts the match as `SimulationFailed`. Because
//! the RNG is part of the snapshot, a replayed round draws the same numbers.

use std::sync::Arc;

use crate::board::{FallbackMoveGenerator, MoveOracle, OracleGateway};
use crate::core::{MatchError, Side, UnitId};
use crate::events::{EventBus, EventPayload, EventSubscriber, SubscriberId};
use crate::progression::settle_level;
use crate::units::validate_lineup;

use super::context::{MatchContext, MatchSetup};
use super::integrity;
use super::result::{FailureReport, MatchOutcome, MatchResult, TerminationReason};
use super::round::{check_loss, round_limit_outcome, RoundDriver};

/// Runs one match to completion.
pub struct MatchOrchestrator {
    ctx: MatchContext,
    gateway: OracleGateway,
    bus: EventBus,
    fallback: FallbackMoveGenerator,
}

impl MatchOrchestrator {
    /// Validate the setup and prepare the match. No oracle is attached; every
    /// move comes from the fallback generator until one is.
    pub fn new(setup: MatchSetup) -> Result<Self, MatchError> {
        setup.config.validate()?;
        validate_lineup(&setup.team_a, &setup.team_b, &setup.catalog)?;

        let mut ctx = MatchContext::new(setup);
        let synergy = ctx.config.features.synergy;
        for (_, team) in ctx.state.teams.iter_mut() {
            team.refresh_synergy(synergy);
        }

        Ok(Self {
            ctx,
            gateway: OracleGateway::offline(),
            bus: EventBus::new(),
            fallback: FallbackMoveGenerator::default(),
        })
    }

    /// Attach a move oracle (builder pattern).
    #[must_use]
    pub fn with_oracle(mut self, oracle: Arc<dyn MoveOracle>) -> Self {
        self.gateway = OracleGateway::new(oracle, &self.ctx.config.oracle);
        self
    }

    /// Register an event subscriber (builder pattern).
    #[must_use]
    pub fn with_subscriber(mut self, subscriber: Box<dyn EventSubscriber>) -> Self {
        self.subscribe(subscriber);
        self
    }

    /// Replace the fallback move generator (builder pattern).
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackMoveGenerator) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn EventSubscriber>) -> SubscriberId {
        self.bus.register(subscriber)
    }

    #[must_use]
    pub fn context(&self) -> &MatchContext {
        &self.ctx
    }

    /// Play the match. Never panics on engine errors; failures are reported
    /// in the result.
    pub fn run(mut self) -> MatchResult {
        let span = tracing::info_span!("match", id = %self.ctx.match_id, seed = self.ctx.seed);
        let _guard = span.enter();

        let team_a = self.ctx.state.teams[Side::A].id;
        let team_b = self.ctx.state.teams[Side::B].id;
        tracing::info!(%team_a, %team_b, "match started");
        self.lifecycle(
            [],
            EventPayload::MatchStarted {
                team_a,
                team_b,
                seed: self.ctx.seed,
            },
        );

        loop {
            self.ctx.state.round += 1;
            let round = self.ctx.state.round;

            if let Err(report) = self.play_round() {
                return self.abort(report);
            }

            if let Err(err) = integrity::check(&self.ctx.state, &self.ctx.config) {
                let error = err.to_string();
                tracing::error!(round, %error, "integrity check failed");
                let report = FailureReport {
                    round,
                    step: None,
                    diagnostic: integrity::diagnostic_dump(&self.ctx, &error),
                    error,
                };
                return self.abort(report);
            }

            let config = Arc::clone(&self.ctx.config);
            if let Some((outcome, reason)) = check_loss(&self.ctx.state.teams, &config.loss) {
                return self.finish(outcome, reason);
            }
            if round >= config.max_rounds {
                let (outcome, reason) =
                    round_limit_outcome(&self.ctx.state.teams, self.ctx.state.boards.values(), &config.loss);
                return self.finish(outcome, reason);
            }
        }
    }

    fn driver(&mut self) -> RoundDriver<'_> {
        RoundDriver::new(&mut self.ctx, &mut self.gateway, &mut self.bus, self.fallback)
    }

    /// Run the current round, retrying once without the failing step.
    fn play_round(&mut self) -> Result<(), FailureReport> {
        let round = self.ctx.state.round;
        let snapshot = self.ctx.state.clone();

        let first = match self.driver().run(None) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        let step = first.step();
        tracing::warn!(round, %step, error = %first, "round step failed, replaying round without it");

        self.ctx.state = snapshot;
        self.lifecycle(
            [],
            EventPayload::StepFailed {
                step,
                attempt: 1,
                error: first.to_string(),
            },
        );
        self.lifecycle([], EventPayload::RoundRetried { skipped: step });

        let second = match self.driver().run(Some(step)) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        let error = second.to_string();
        self.lifecycle(
            [],
            EventPayload::StepFailed {
                step: second.step(),
                attempt: 2,
                error: error.clone(),
            },
        );
        Err(FailureReport {
            round,
            step: Some(second.step()),
            diagnostic: integrity::diagnostic_dump(&self.ctx, &error),
            error,
        })
    }

    /// Record a lifecycle event. Subscriber errors are logged, not fatal.
    fn lifecycle(&mut self, unit_ids: impl IntoIterator<Item = UnitId>, payload: EventPayload) {
        if let Err(err) = self.ctx.emit(&mut self.bus, unit_ids, payload) {
            tracing::warn!(error = %err, "subscriber failed on lifecycle event");
        }
    }

    fn finish(mut self, outcome: MatchOutcome, reason: TerminationReason) -> MatchResult {
        let config = Arc::clone(&self.ctx.config);
        let mut level_ups = Vec::new();
        for (_, team) in self.ctx.state.teams.iter_mut() {
            for unit in &mut team.units {
                level_ups.extend(settle_level(unit, &config.xp.level_thresholds));
            }
        }
        for change in level_ups {
            tracing::debug!(unit = %change.unit, from = change.from, to = change.to, "level up");
            self.lifecycle(
                [change.unit],
                EventPayload::LevelUp {
                    level: change.to,
                    xp: change.xp,
                },
            );
        }

        tracing::info!(rounds = self.ctx.state.round, ?outcome, ?reason, "match finished");
        self.lifecycle([], EventPayload::MatchEnded { outcome, reason });
        self.into_result(outcome, reason, None)
    }

    fn abort(mut self, report: FailureReport) -> MatchResult {
        tracing::error!(round = report.round, step = ?report.step, error = %report.error, "match aborted");
        let (outcome, reason) = (MatchOutcome::SimulationFailed, TerminationReason::Failure);
        self.lifecycle([], EventPayload::MatchEnded { outcome, reason });
        self.into_result(outcome, reason, Some(report))
    }

    fn into_result(self, outcome: MatchOutcome, reason: TerminationReason, failure: Option<FailureReport>) -> MatchResult {
        let ctx = self.ctx;
        let state = ctx.state;
        MatchResult {
            match_id: ctx.match_id,
            day: ctx.day,
            seed: ctx.seed,
            outcome,
            reason,
            rounds_played: state.round,
            teams: state.teams,
            boards: state.boards.values().cloned().collect(),
            events: state.events.iter().cloned().collect(),
            convergences: state.convergences.iter().cloned().collect(),
            trait_log: state.trait_log.iter().cloned().collect(),
            failure,
        }
    }
}

impl std::fmt::Debug for MatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchOrchestrator")
            .field("match_id", &self.ctx.match_id)
            .field("round", &self.ctx.state.round)
            .field("gateway", &self.gateway)
            .field("subscribers", &self.bus.len())
            .finish()
    }
}
