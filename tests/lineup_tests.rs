//! Lineup validation before the first round.

use meta_league::core::{MatchError, TeamId, UnitId, ValidationError};
use meta_league::orchestrator::{MatchOrchestrator, MatchSetup};
use meta_league::sample::sample_team;
use meta_league::traits::{TraitCatalog, TraitId};
use meta_league::units::{validate_lineup, Division, Role, Team, TraitInstance};

fn teams() -> (Team, Team, TraitCatalog) {
    let catalog = TraitCatalog::standard();
    let a = sample_team(1, "North", &catalog);
    let b = sample_team(2, "South", &catalog);
    (a, b, catalog)
}

#[test]
fn test_sample_lineups_are_valid() {
    let (a, b, catalog) = teams();
    assert_eq!(validate_lineup(&a, &b, &catalog), Ok(()));
}

#[test]
fn test_short_roster() {
    let (mut a, b, catalog) = teams();
    a.units.pop();
    assert_eq!(
        validate_lineup(&a, &b, &catalog),
        Err(ValidationError::RosterSize {
            team: TeamId::new(1),
            expected: 8,
            found: 7,
        })
    );
}

#[test]
fn test_two_field_leaders() {
    let (a, mut b, catalog) = teams();
    // Slot 7 is a spare vanguard; promote it.
    b.units[7].role = Role::FieldLeader;
    b.units[7].division = Role::FieldLeader.division();
    assert_eq!(
        validate_lineup(&a, &b, &catalog),
        Err(ValidationError::FieldLeaderCount {
            team: TeamId::new(2),
            found: 2,
        })
    );
}

#[test]
fn test_unit_fielded_by_both_sides() {
    let (a, mut b, catalog) = teams();
    let mut borrowed = a.units[3].clone();
    borrowed.team_id = b.id;
    b.units[3] = borrowed;
    assert_eq!(
        validate_lineup(&a, &b, &catalog),
        Err(ValidationError::DuplicateUnit(UnitId::new(103)))
    );
}

#[test]
fn test_division_mismatch() {
    let (mut a, b, catalog) = teams();
    let unit = &mut a.units[4];
    unit.division = match unit.division {
        Division::Operations => Division::Intelligence,
        Division::Intelligence => Division::Operations,
    };
    assert!(matches!(
        validate_lineup(&a, &b, &catalog),
        Err(ValidationError::DivisionMismatch { unit, .. }) if unit == UnitId::new(104)
    ));
}

#[test]
fn test_unknown_trait() {
    let (mut a, b, catalog) = teams();
    a.units[2].traits.push(TraitInstance::new(TraitId::new(999), 5.0));
    assert_eq!(
        validate_lineup(&a, &b, &catalog),
        Err(ValidationError::UnknownTrait {
            unit: UnitId::new(102),
            trait_id: TraitId::new(999),
        })
    );
}

#[test]
fn test_stats_out_of_range() {
    let (a, mut b, catalog) = teams();
    b.units[1].stamina = 140.0;
    assert!(matches!(
        validate_lineup(&a, &b, &catalog),
        Err(ValidationError::StatOutOfRange { field: "stamina", .. })
    ));

    let (mut a, b, catalog) = teams();
    a.units[6].attributes.focus = 11.0;
    assert!(matches!(
        validate_lineup(&a, &b, &catalog),
        Err(ValidationError::StatOutOfRange { field: "focus", .. })
    ));
}

#[test]
fn test_dead_unit_rejected() {
    let (mut a, b, catalog) = teams();
    a.units[1].life = 0;
    assert_eq!(
        validate_lineup(&a, &b, &catalog),
        Err(ValidationError::AlreadyKnockedOut(UnitId::new(101)))
    );
}

#[test]
fn test_unit_at_knockout_hp_rejected() {
    let (mut a, b, catalog) = teams();
    a.units[2].hp = 3.0;
    assert_eq!(
        validate_lineup(&a, &b, &catalog),
        Err(ValidationError::AlreadyKnockedOut(UnitId::new(102)))
    );

    let err = MatchOrchestrator::new(MatchSetup::new("dead", a, b)).unwrap_err();
    assert!(matches!(
        err,
        MatchError::Validation(ValidationError::AlreadyKnockedOut(_))
    ));
}

#[test]
fn test_orchestrator_refuses_invalid_lineup() {
    let (mut a, b, _) = teams();
    a.units.truncate(5);
    let err = MatchOrchestrator::new(MatchSetup::new("short", a, b)).unwrap_err();
    assert!(matches!(err, MatchError::Validation(ValidationError::RosterSize { .. })));
    assert!(err.to_string().contains("5"));
}
