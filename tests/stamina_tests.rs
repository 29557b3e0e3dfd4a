//! Stamina bounds, threshold crossings and the decay/recovery composition.

use proptest::prelude::*;

use meta_league::core::{MatchConfig, TeamId, UnitId};
use meta_league::stamina::{Activity, StaminaEngine};
use meta_league::units::{CrossingDirection, FatigueTier, Role, StaminaReason, Unit};

fn runner(stamina: f64) -> Unit {
    Unit::new(UnitId::new(7), "Vale", TeamId::new(1), Role::Ranger).with_stamina(stamina)
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_eight_rounds_of_cost_decay_and_recovery() {
    let config = MatchConfig::default();
    let engine = StaminaEngine::from_config(&config);
    let boundaries = config.fatigue.boundaries();
    let mut unit = runner(100.0);

    let mut crossings = Vec::new();
    for round in 1..=8 {
        let cost = unit.adjust_stamina(-5.0, StaminaReason::TraitCost, round, &boundaries);
        crossings.extend(cost.crossings);
        let tick = engine.tick(&mut unit, Activity::Moved, round);
        crossings.extend(tick.crossings);
    }

    // 100 - 8 * (5 + 4 - 3)
    assert!((unit.stamina - 52.0).abs() < 1e-9);
    assert!(unit.stamina > config.fatigue.moderate);
    assert_eq!(unit.fatigue_tier(&config.fatigue), FatigueTier::Minor);

    // Only the 60 boundary was crossed, once, going down.
    assert_eq!(crossings.len(), 1);
    assert_eq!(crossings[0].boundary, 60.0);
    assert_eq!(crossings[0].direction, CrossingDirection::Falling);
    assert!(!unit.knocked_out);
}

#[test]
fn test_exhaustion_knocks_out_in_the_same_adjustment() {
    let config = MatchConfig::default();
    let engine = StaminaEngine::from_config(&config);
    let mut unit = runner(1.0);

    let change = engine.tick(&mut unit, Activity::Converged, 6);
    assert_eq!(change.after, 0.0);
    assert!(change.knocked_out);
    assert!(unit.knocked_out);
    assert_eq!(unit.knockout_round, Some(6));
}

#[test]
fn test_bench_recovery_rises_through_boundaries() {
    let config = MatchConfig::default();
    let engine = StaminaEngine::from_config(&config);
    let mut unit = runner(39.0);

    // Idle: 4.5 recovery - 2.0 decay.
    let change = engine.tick(&mut unit, Activity::Idle, 1);
    assert!((change.after - 41.5).abs() < 1e-9);
    assert_eq!(change.crossings.len(), 1);
    assert_eq!(change.crossings[0].direction, CrossingDirection::Rising);
    assert_eq!(change.crossings[0].reason, StaminaReason::Recovery);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Stamina never leaves [0, 100] whatever is thrown at it.
    #[test]
    fn prop_stamina_stays_in_bounds(
        start in 0.0f64..=100.0,
        deltas in prop::collection::vec(-150.0f64..150.0, 1..40)
    ) {
        let boundaries = MatchConfig::default().fatigue.boundaries();
        let mut unit = runner(start);
        for (round, delta) in deltas.into_iter().enumerate() {
            unit.adjust_stamina(delta, StaminaReason::TraitEffect, round as u32 + 1, &boundaries);
            prop_assert!((0.0..=100.0).contains(&unit.stamina));
        }
    }

    /// Every reported crossing really happened, each boundary is reported at
    /// most once per adjustment, and none is missed.
    #[test]
    fn prop_crossings_are_exact(
        start in 1.0f64..=100.0,
        delta in -100.0f64..100.0
    ) {
        let boundaries = MatchConfig::default().fatigue.boundaries();
        let mut unit = runner(start);
        let change = unit.adjust_stamina(delta, StaminaReason::Decay, 1, &boundaries);

        for crossing in &change.crossings {
            let b = crossing.boundary;
            match crossing.direction {
                CrossingDirection::Falling => prop_assert!(change.before > b && change.after <= b),
                CrossingDirection::Rising => prop_assert!(change.before <= b && change.after > b),
            }
        }

        let expected = boundaries
            .iter()
            .filter(|&&b| (change.before > b) != (change.after > b))
            .count();
        prop_assert_eq!(change.crossings.len(), expected);
    }

    /// A unit is knocked out exactly when its stamina reaches zero.
    #[test]
    fn prop_zero_stamina_is_knockout(start in 0.5f64..=100.0, delta in -120.0f64..0.0) {
        let boundaries = MatchConfig::default().fatigue.boundaries();
        let mut unit = runner(start);
        let change = unit.adjust_stamina(delta, StaminaReason::Decay, 3, &boundaries);
        prop_assert_eq!(change.knocked_out, unit.stamina == 0.0);
        prop_assert_eq!(unit.knocked_out, unit.stamina == 0.0);
    }
}
