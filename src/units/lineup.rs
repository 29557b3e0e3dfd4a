//! Lineup validation, run once before the first round.

use rustc_hash::FxHashSet;

use crate::core::ValidationError;
use crate::traits::TraitCatalog;

use super::role::Role;
use super::team::{Team, ACTIVE_ROSTER_SIZE};
use super::unit::MAX_STAT;

/// Check both lineups of a match.
///
/// Rejects rosters that are not exactly eight units, unit ids used twice
/// anywhere in the match, teams without exactly one field leader, units whose
/// division does not match their role, unknown traits, out-of-range stats,
/// and units that would already count as knocked out.
pub fn validate_lineup(
    team_a: &Team,
    team_b: &Team,
    catalog: &TraitCatalog,
) -> Result<(), ValidationError> {
    if team_a.id == team_b.id {
        return Err(ValidationError::SameTeam(team_a.id));
    }

    let mut seen = FxHashSet::default();
    for team in [team_a, team_b] {
        validate_team(team, catalog)?;
        for unit in &team.units {
            if !seen.insert(unit.id) {
                return Err(ValidationError::DuplicateUnit(unit.id));
            }
        }
    }
    Ok(())
}

fn validate_team(team: &Team, catalog: &TraitCatalog) -> Result<(), ValidationError> {
    if team.units.len() != ACTIVE_ROSTER_SIZE {
        return Err(ValidationError::RosterSize {
            team: team.id,
            expected: ACTIVE_ROSTER_SIZE,
            found: team.units.len(),
        });
    }

    let leaders = team
        .units
        .iter()
        .filter(|u| u.role == Role::FieldLeader)
        .count();
    if leaders != 1 {
        return Err(ValidationError::FieldLeaderCount {
            team: team.id,
            found: leaders,
        });
    }

    for unit in &team.units {
        if unit.team_id != team.id {
            return Err(ValidationError::TeamMismatch {
                unit: unit.id,
                expected: team.id,
                found: unit.team_id,
            });
        }

        let expected = unit.role.division();
        if unit.division != expected {
            return Err(ValidationError::DivisionMismatch {
                unit: unit.id,
                role: unit.role,
                expected,
                found: unit.division,
            });
        }

        for (field, value) in [("hp", unit.hp), ("stamina", unit.stamina), ("morale", unit.morale)] {
            if !(0.0..=MAX_STAT).contains(&value) {
                return Err(ValidationError::StatOutOfRange {
                    unit: unit.id,
                    field,
                    value,
                });
            }
        }

        if unit.is_dead() || unit.knocked_out {
            return Err(ValidationError::AlreadyKnockedOut(unit.id));
        }

        if let Some((kind, value)) = unit.attributes.out_of_range() {
            return Err(ValidationError::StatOutOfRange {
                unit: unit.id,
                field: kind.name(),
                value,
            });
        }

        for instance in &unit.traits {
            if !catalog.contains(instance.trait_id) {
                return Err(ValidationError::UnknownTrait {
                    unit: unit.id,
                    trait_id: instance.trait_id,
                });
            }
        }
    }

    if !(0.0..=MAX_STAT).contains(&team.morale) {
        return Err(ValidationError::StatOutOfRange {
            unit: team.units[0].id,
            field: "team morale",
            value: team.morale,
        });
    }

    Ok(())
}
