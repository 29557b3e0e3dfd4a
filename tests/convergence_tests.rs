//! Convergence resolution inside full matches and through the public
//! calibrator API.

use std::sync::Arc;

use meta_league::board::{OracleMove, PieceKind, Square};
use meta_league::combat::{ActionType, CombatCalibrator, CombatantView, ConvergenceResolver};
use meta_league::core::{ContestWinner, ContestedRoll, FeatureFlags, MatchConfig, TeamId, UnitId};
use meta_league::events::{ConvergenceSkip, EventPayload, EventType};
use meta_league::orchestrator::{MatchOrchestrator, MatchResult, MatchSetup};
use meta_league::sample::{sample_team, ScriptedOracle, TeamBuilder};
use meta_league::traits::TraitCatalog;
use meta_league::units::{Role, Unit};

fn square(name: &str) -> Square {
    Square::parse(name).unwrap()
}

/// Slot 1 of side A (a rook) and slot 2 of side B (a knight) land on d4
/// every round; everyone else stays on their own rank.
fn duel_oracle() -> ScriptedOracle {
    let files = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let mut oracle = ScriptedOracle::new();
    for (slot, file) in files.iter().enumerate() {
        let a = OracleMove::quiet(PieceKind::Knight, square(&format!("{file}3")));
        let b = OracleMove::quiet(PieceKind::Knight, square(&format!("{file}6")));
        oracle = oracle
            .with_script(UnitId::new(100 + slot as u32), vec![a])
            .with_script(UnitId::new(200 + slot as u32), vec![b]);
    }
    oracle
        .with_script(UnitId::new(101), vec![OracleMove::quiet(PieceKind::Rook, square("d4"))])
        .with_script(UnitId::new(202), vec![OracleMove::quiet(PieceKind::Knight, square("d4"))])
}

fn duel(seed: u64, rounds: u32) -> MatchResult {
    let features = FeatureFlags {
        injuries: false,
        forced_resignation: false,
        ..FeatureFlags::default()
    };
    let config = MatchConfig::default()
        .with_features(features)
        .with_oracle_timeout(None)
        .with_max_rounds(rounds);
    let catalog = TraitCatalog::standard();
    let a = TeamBuilder::new(1, "North").without_traits().build(&catalog);
    let b = TeamBuilder::new(2, "South").without_traits().build(&catalog);
    let setup = MatchSetup::new("duel", a, b).with_seed(seed).with_config(config);
    MatchOrchestrator::new(setup)
        .unwrap()
        .with_oracle(Arc::new(duel_oracle()))
        .run()
}

fn fighter(id: u32, team: u32) -> Unit {
    Unit::new(UnitId::new(id), format!("f{id}"), TeamId::new(team), Role::Vanguard)
}

// =============================================================================
// Per-match cap
// =============================================================================

#[test]
fn test_cap_limits_convergences_per_match() {
    for seed in [1, 2, 3] {
        let result = duel(seed, 5);
        let cap = MatchConfig::default().convergence.max_per_unit;

        assert!(result.convergences.len() as u32 <= cap);
        for record in &result.convergences {
            assert_eq!(record.square, square("d4"));
            assert_eq!(record.units, [UnitId::new(101), UnitId::new(202)]);
        }

        let both_standing = !result.unit(UnitId::new(101)).unwrap().knocked_out
            && !result.unit(UnitId::new(202)).unwrap().knocked_out;
        if both_standing {
            assert_eq!(result.convergences.len() as u32, cap);
            let capped = result
                .events
                .iter()
                .filter(|e| {
                    matches!(
                        e.payload,
                        EventPayload::ConvergenceSkipped {
                            reason: ConvergenceSkip::CapReached(_),
                            ..
                        }
                    )
                })
                .count();
            assert_eq!(capped, 2);
            assert!(result
                .events
                .iter()
                .filter(|e| e.event_type == EventType::ConvergenceSkipped)
                .all(|e| e.round > 3));
        }
    }
}

#[test]
fn test_records_match_events() {
    let result = duel(4, 3);
    let resolved: Vec<_> = result
        .events
        .iter()
        .filter(|e| e.event_type == EventType::ConvergenceResolved)
        .collect();
    assert_eq!(resolved.len(), result.convergences.len());

    for (event, record) in resolved.iter().zip(&result.convergences) {
        assert_eq!(event.round, record.round);
        match &event.payload {
            EventPayload::ConvergenceResolved {
                winner,
                margin,
                critical,
                damage,
                ..
            } => {
                assert_eq!(*winner, record.winner);
                assert_eq!(*margin, record.margin);
                assert_eq!(*critical, record.critical);
                assert_eq!(*damage, record.damage);
            }
            other => panic!("unexpected payload {other:?}"),
        }
        // A tie deals no damage.
        if record.winner.is_none() {
            assert_eq!(record.damage, 0.0);
            assert!(record.loser.is_none());
        }
    }
}

#[test]
fn test_critical_iff_margin_over_threshold() {
    let threshold = MatchConfig::default().combat.critical_margin;
    let catalog = TraitCatalog::standard();
    for seed in 0..6 {
        let setup = MatchSetup::new("crit", sample_team(1, "North", &catalog), sample_team(2, "South", &catalog))
            .with_seed(seed);
        let result = MatchOrchestrator::new(setup).unwrap().run();
        for record in &result.convergences {
            assert_eq!(record.critical, record.margin >= threshold, "{record:?}");
            assert!((record.margin - (record.roll.total_a - record.roll.total_b).abs()).abs() < 1e-9);
        }
    }
}

// =============================================================================
// Calibrated outcome
// =============================================================================

#[test]
fn test_seventy_against_forty() {
    let config = {
        let mut config = MatchConfig::default();
        config.features.injuries = false;
        config
    };
    let resolver = ConvergenceResolver::from_config(&config);
    let calibrator = CombatCalibrator::from_config(&config);

    let roll = ContestedRoll::from_totals(70.0, 40.0);
    assert_eq!(roll.winner, ContestWinner::First);
    assert_eq!(roll.margin, 30.0);
    assert!(resolver.is_critical(roll.margin));

    let attacker = CombatantView::of(&fighter(1, 1), &config.fatigue);
    let defender = CombatantView::of(&fighter(2, 2), &config.fatigue);
    let mut dice = meta_league::core::ProbabilityEngine::new(3);

    // (6 + 30 × 0.2) × 2 = 24 before the critical multiplier.
    let plain = calibrator.resolve(
        &attacker,
        &defender,
        ActionType::Convergence {
            margin: 30.0,
            critical: false,
        },
        &mut dice,
    );
    assert_eq!(plain.damage, 24.0);
    assert_eq!(plain.attacker_xp, 10);

    let critical = calibrator.resolve(
        &attacker,
        &defender,
        ActionType::Convergence {
            margin: 30.0,
            critical: true,
        },
        &mut dice,
    );
    assert_eq!(critical.damage, 36.0);
    assert_eq!(critical.attacker_xp, 15);
    assert_eq!(critical.defender_xp, 2);
    assert!(critical.attacker_morale > 0.0);
    assert!(critical.defender_morale < 0.0);
    assert!(critical.injury.is_none());
}

#[test]
fn test_even_totals_tie() {
    let roll = ContestedRoll::from_totals(50.0, 50.0);
    assert_eq!(roll.winner, ContestWinner::Tie);
    assert_eq!(roll.margin, 0.0);
}
