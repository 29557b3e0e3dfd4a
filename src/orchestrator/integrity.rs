//! Post-round invariant checks.
//!
//! Run after every committed round. A violation means the engine itself is
//! wrong, so the match is aborted rather than retried.

use serde_json::json;

use crate::core::{IntegrityError, MatchConfig};
use crate::units::{Role, TraitPhase, MAX_STAT};

use super::context::{MatchContext, MatchState};

/// Events included in a diagnostic dump.
const DUMP_EVENTS: usize = 20;

fn in_range(value: f64) -> bool {
    value.is_finite() && (0.0..=MAX_STAT).contains(&value)
}

/// Verify the state invariants that must hold between rounds.
pub fn check(state: &MatchState, config: &MatchConfig) -> Result<(), IntegrityError> {
    for (_, team) in state.teams.iter() {
        if !in_range(team.morale) {
            return Err(IntegrityError::TeamMoraleOutOfRange {
                team: team.id,
                value: team.morale,
            });
        }

        let leaders = team.units.iter().filter(|u| u.role == Role::FieldLeader).count();
        if leaders != 1 {
            return Err(IntegrityError::FieldLeaderCount {
                team: team.id,
                found: leaders,
            });
        }

        for unit in &team.units {
            let id = unit.id;
            if !in_range(unit.stamina) {
                return Err(IntegrityError::StaminaOutOfRange { unit: id, value: unit.stamina });
            }
            if !in_range(unit.morale) {
                return Err(IntegrityError::MoraleOutOfRange { unit: id, value: unit.morale });
            }
            if !in_range(unit.hp) {
                return Err(IntegrityError::HpOutOfRange { unit: id, value: unit.hp });
            }
            if unit.is_dead() && !unit.knocked_out {
                return Err(IntegrityError::UndetectedKnockout { unit: id });
            }
            if let Some(instance) = unit
                .traits
                .iter()
                .find(|t| t.phase == TraitPhase::Activated && !t.activated_in(state.round))
            {
                return Err(IntegrityError::TraitActiveDuringCooldown {
                    unit: id,
                    trait_id: instance.trait_id,
                });
            }
            let cap = config.convergence.max_per_unit;
            if unit.convergences > cap {
                return Err(IntegrityError::ConvergenceCapExceeded {
                    unit: id,
                    count: unit.convergences,
                    cap,
                });
            }
        }
    }
    Ok(())
}

/// JSON snapshot of the match for a failure report.
#[must_use]
pub fn diagnostic_dump(ctx: &MatchContext, error: &str) -> String {
    let events = &ctx.state.events;
    let recent: Vec<_> = events
        .iter()
        .skip(events.len().saturating_sub(DUMP_EVENTS))
        .collect();
    let dump = json!({
        "match_id": ctx.match_id,
        "round": ctx.state.round,
        "error": error,
        "teams": ctx.state.teams,
        "recent_events": recent,
    });
    serde_json::to_string_pretty(&dump)
        .unwrap_or_else(|e| format!("match {} round {}: {error} (dump failed: {e})", ctx.match_id, ctx.state.round))
}
