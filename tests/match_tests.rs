//! End-to-end match tests: determinism, termination, recovery and the oracle.

use std::sync::Arc;
use std::time::Duration;

use meta_league::board::{OracleMove, PieceKind, Square};
use meta_league::core::{FeatureFlags, MatchConfig, Side, SubscriberError, UnitId};
use meta_league::events::{EventPayload, EventSubscriber, EventType, KnockoutCause, MatchEvent};
use meta_league::orchestrator::{MatchOrchestrator, MatchOutcome, MatchResult, MatchSetup, RoundStep, TerminationReason};
use meta_league::sample::{sample_team, ScriptedOracle, TeamBuilder};
use meta_league::traits::TraitCatalog;

fn square(name: &str) -> Square {
    Square::parse(name).unwrap()
}

fn setup(seed: u64) -> MatchSetup {
    let catalog = TraitCatalog::standard();
    MatchSetup::new("m-1", sample_team(1, "North", &catalog), sample_team(2, "South", &catalog)).with_seed(seed)
}

fn play(setup: MatchSetup) -> MatchResult {
    MatchOrchestrator::new(setup).unwrap().run()
}

fn count(result: &MatchResult, event_type: EventType) -> usize {
    result.events.iter().filter(|e| e.event_type == event_type).count()
}

/// Config with the random side systems switched off.
fn quiet_config() -> MatchConfig {
    let features = FeatureFlags {
        injuries: false,
        forced_resignation: false,
        ..FeatureFlags::default()
    };
    MatchConfig::default().with_features(features).with_oracle_timeout(None)
}

/// Every board scripted with quiet knight moves on its own rank, so no two
/// opposing units ever land on the same square.
fn quiet_script() -> ScriptedOracle {
    let files = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let mut oracle = ScriptedOracle::new();
    for (slot, file) in files.iter().enumerate() {
        let a = square(&format!("{file}3"));
        let b = square(&format!("{file}6"));
        oracle = oracle
            .with_script(UnitId::new(100 + slot as u32), vec![OracleMove::quiet(PieceKind::Knight, a)])
            .with_script(UnitId::new(200 + slot as u32), vec![OracleMove::quiet(PieceKind::Knight, b)]);
    }
    oracle
}

fn bare_setup(seed: u64, config: MatchConfig) -> MatchSetup {
    let catalog = TraitCatalog::standard();
    let a = TeamBuilder::new(1, "North").without_traits().build(&catalog);
    let b = TeamBuilder::new(2, "South").without_traits().build(&catalog);
    MatchSetup::new("scripted", a, b).with_seed(seed).with_config(config)
}

/// Fails on the listed event types, at most `limit` times.
struct Failing {
    types: Vec<EventType>,
    limit: usize,
    failures: usize,
}

impl Failing {
    fn new(types: Vec<EventType>, limit: usize) -> Self {
        Self {
            types,
            limit,
            failures: 0,
        }
    }
}

impl EventSubscriber for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn interests(&self) -> Vec<EventType> {
        self.types.clone()
    }

    fn on_event(&mut self, event: &MatchEvent) -> Result<(), SubscriberError> {
        if self.failures < self.limit {
            self.failures += 1;
            return Err(SubscriberError::new("failing", format!("rejected {:?}", event.event_type)));
        }
        Ok(())
    }
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_same_seed_same_log() {
    let first = play(setup(42)).to_json().unwrap();
    let second = play(setup(42)).to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_different_seed_different_log() {
    let first = play(setup(1)).event_log_json().unwrap();
    let second = play(setup(2)).event_log_json().unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_event_sequence_is_dense() {
    let result = play(setup(11));
    for (i, event) in result.events.iter().enumerate() {
        assert_eq!(event.seq, i as u64);
        assert_eq!(event.match_id, "m-1");
    }
}

// =============================================================================
// Termination
// =============================================================================

#[test]
fn test_field_leader_knockout_ends_match() {
    // A's field leader takes a queen every round; B's field leader shuffles
    // its knight. 27 damage per capture knocks B's leader out in round 4.
    let capture = OracleMove::quiet(PieceKind::Queen, square("e4")).with_material(9);
    let oracle = quiet_script().with_script(UnitId::new(100), vec![capture]);

    let result = MatchOrchestrator::new(bare_setup(5, quiet_config()))
        .unwrap()
        .with_oracle(Arc::new(oracle))
        .run();

    assert_eq!(result.outcome, MatchOutcome::TeamAWin);
    assert_eq!(result.reason, TerminationReason::FieldLeaderKnockedOut { side: Side::B });
    assert_eq!(result.rounds_played, 4);

    let leader = result.unit(UnitId::new(200)).unwrap();
    assert!(leader.knocked_out);
    assert_eq!(leader.knockout_round, Some(4));
    assert_eq!(leader.hp, 0.0);

    let damage: Vec<f64> = result
        .events
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::DamageApplied { amount, .. } if e.involves(UnitId::new(200)) => Some(*amount),
            _ => None,
        })
        .collect();
    assert_eq!(damage, vec![27.0, 27.0, 27.0, 27.0]);
}

#[test]
fn test_knockout_detected_in_the_round_it_happens() {
    let capture = OracleMove::quiet(PieceKind::Queen, square("e4")).with_material(9);
    let oracle = quiet_script().with_script(UnitId::new(100), vec![capture]);
    let result = MatchOrchestrator::new(bare_setup(5, quiet_config()))
        .unwrap()
        .with_oracle(Arc::new(oracle))
        .run();

    let knockout = result
        .events
        .iter()
        .find(|e| e.event_type == EventType::KnockedOut)
        .unwrap();
    assert_eq!(knockout.round, 4);
    assert_eq!(knockout.unit_ids.as_slice(), &[UnitId::new(200)]);
    assert!(matches!(
        knockout.payload,
        EventPayload::KnockedOut {
            cause: KnockoutCause::Damage(_)
        }
    ));

    // Every knocked-out unit in any match carries the round of its event.
    let result = play(setup(23));
    for event in result.events.iter().filter(|e| e.event_type == EventType::KnockedOut) {
        let unit = result.unit(event.unit_ids[0]).unwrap();
        assert_eq!(unit.knockout_round, Some(event.round));
    }
}

/// Quiet match where the listed team A slots start in severe fatigue and
/// every severe-fatigue roll resigns.
fn resigning_setup(slots: &[usize]) -> MatchSetup {
    let features = FeatureFlags {
        injuries: false,
        ..FeatureFlags::default()
    };
    let mut config = MatchConfig::default().with_features(features).with_oracle_timeout(None);
    config.fatigue.forced_resignation_percent = 100.0;

    let catalog = TraitCatalog::standard();
    let mut a = TeamBuilder::new(1, "North").without_traits().build(&catalog);
    let b = TeamBuilder::new(2, "South").without_traits().build(&catalog);
    for &slot in slots {
        a.units[slot].stamina = 15.0;
    }
    MatchSetup::new("resign", a, b).with_seed(3).with_config(config)
}

#[test]
fn test_resigning_field_leader_ends_match() {
    let result = MatchOrchestrator::new(resigning_setup(&[0]))
        .unwrap()
        .with_oracle(Arc::new(quiet_script()))
        .run();

    assert_eq!(result.outcome, MatchOutcome::TeamBWin);
    assert_eq!(result.reason, TerminationReason::FieldLeaderKnockedOut { side: Side::A });
    assert_eq!(result.rounds_played, 1);

    let leader = result.unit(UnitId::new(100)).unwrap();
    assert!(leader.resigned);
    assert!(leader.knocked_out);
    assert_eq!(leader.knockout_round, Some(1));
    assert!(!result.teams[Side::A].synergy.active);

    let knockout = result
        .events
        .iter()
        .find(|e| e.event_type == EventType::KnockedOut)
        .unwrap();
    assert_eq!(knockout.round, 1);
    assert_eq!(knockout.unit_ids.as_slice(), &[UnitId::new(100)]);
    assert!(matches!(
        knockout.payload,
        EventPayload::KnockedOut {
            cause: KnockoutCause::Resignation
        }
    ));
}

#[test]
fn test_resignations_count_toward_knockout_limit() {
    let result = MatchOrchestrator::new(resigning_setup(&[1, 2, 3, 4, 5]))
        .unwrap()
        .with_oracle(Arc::new(quiet_script()))
        .run();

    assert_eq!(result.outcome, MatchOutcome::TeamBWin);
    assert_eq!(result.reason, TerminationReason::KnockoutLimit { side: Side::A });
    assert_eq!(result.rounds_played, 1);

    let team = &result.teams[Side::A];
    assert_eq!(team.knockouts(), 5);
    assert_eq!(count(&result, EventType::ForcedResignation), 5);
    let standing: f64 = team.units.iter().filter(|u| !u.resigned).map(|u| u.hp).sum();
    assert_eq!(team.remaining_hp(), standing);
}

#[test]
fn test_round_limit_tiebreak() {
    let config = quiet_config().with_max_rounds(3);
    let result = MatchOrchestrator::new(bare_setup(9, config))
        .unwrap()
        .with_oracle(Arc::new(quiet_script()))
        .run();

    // Identical rosters and mirrored quiet moves: nothing separates the sides.
    assert_eq!(result.rounds_played, 3);
    assert_eq!(result.outcome, MatchOutcome::Draw);
    assert!(matches!(result.reason, TerminationReason::RoundLimit { .. }));
    assert_eq!(count(&result, EventType::ConvergenceResolved), 0);
}

#[test]
fn test_level_up_at_match_end() {
    let result = play(setup(31));
    let ended = result.events.iter().position(|e| e.event_type == EventType::MatchEnded).unwrap();
    for (i, event) in result.events.iter().enumerate() {
        if event.event_type == EventType::LevelUp {
            assert!(i < ended);
            let unit = result.unit(event.unit_ids[0]).unwrap();
            assert!(unit.level > 1);
        }
    }
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn test_step_failure_is_retried() {
    let result = MatchOrchestrator::new(setup(8))
        .unwrap()
        .with_subscriber(Box::new(Failing::new(vec![EventType::MoveExecuted], 1)))
        .run();

    assert!(!result.is_failed(), "{:?}", result.failure);
    assert!(result.events.iter().any(|e| matches!(
        e.payload,
        EventPayload::StepFailed {
            step: RoundStep::ExecuteMoves,
            attempt: 1,
            ..
        }
    )));
    assert!(result.events.iter().any(|e| matches!(
        e.payload,
        EventPayload::RoundRetried {
            skipped: RoundStep::ExecuteMoves
        }
    )));
    // The replayed round ran without moves.
    assert!(!result
        .events
        .iter()
        .any(|e| e.round == 1 && e.event_type == EventType::MoveExecuted));
}

#[test]
fn test_second_failure_aborts() {
    let failing = Failing::new(vec![EventType::RoundStarted, EventType::MoveExecuted], usize::MAX);
    let result = MatchOrchestrator::new(setup(8))
        .unwrap()
        .with_subscriber(Box::new(failing))
        .run();

    assert!(result.is_failed());
    assert_eq!(result.reason, TerminationReason::Failure);
    assert_eq!(result.rounds_played, 1);

    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.round, 1);
    assert_eq!(failure.step, Some(RoundStep::ExecuteMoves));
    let dump: serde_json::Value = serde_json::from_str(&failure.diagnostic).unwrap();
    assert_eq!(dump["round"], 1);

    assert_eq!(count(&result, EventType::StepFailed), 2);
    assert_eq!(result.events.last().unwrap().event_type, EventType::MatchEnded);
}

// =============================================================================
// Oracle
// =============================================================================

#[test]
fn test_slow_oracle_falls_back() {
    let config = MatchConfig::default().with_max_rounds(1).with_oracle_timeout(Some(20));
    let oracle = quiet_script().with_delay(Duration::from_millis(200));
    let result = MatchOrchestrator::new(setup(4).with_config(config))
        .unwrap()
        .with_oracle(Arc::new(oracle))
        .run();

    let reasons: Vec<&str> = result
        .events
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::OracleFallback { reason } => Some(reason.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(reasons.len(), 16);
    assert!(reasons[0].contains("did not answer"));
    assert!(result.boards.iter().all(|b| b.fallback_moves == 1));
    assert_eq!(count(&result, EventType::MoveExecuted), 16);
}

#[test]
fn test_scripted_moves_are_played() {
    let config = quiet_config().with_max_rounds(2);
    let result = MatchOrchestrator::new(bare_setup(3, config))
        .unwrap()
        .with_oracle(Arc::new(quiet_script()))
        .run();

    assert_eq!(count(&result, EventType::OracleFallback), 0);
    let moved = result
        .events
        .iter()
        .find(|e| e.event_type == EventType::MoveExecuted && e.involves(UnitId::new(203)))
        .unwrap();
    assert!(matches!(&moved.payload, EventPayload::MoveExecuted { notation, .. } if notation == "Nd6"));
    assert!(result.boards.iter().all(|b| b.position.ply == 2));
}

// =============================================================================
// Traits
// =============================================================================

#[test]
fn test_trait_activations_respect_cooldowns() {
    let catalog = TraitCatalog::standard();
    for seed in 0..5 {
        let result = play(setup(seed));
        let mut log = result.trait_log.clone();
        log.sort_by_key(|entry| (entry.unit, entry.trait_id, entry.round));
        for pair in log.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.unit != next.unit || prev.trait_id != next.trait_id {
                continue;
            }
            let cooldown = catalog.get(prev.trait_id).unwrap().cooldown;
            assert!(
                next.round > prev.round + cooldown,
                "{:?} reactivated in round {} after round {}",
                prev.trait_id,
                next.round,
                prev.round
            );
        }
    }
}
