//! Error taxonomy.
//!
//! | Error               | Handling                                          |
//! |---------------------|---------------------------------------------------|
//! | `ValidationError`   | fatal before the first round                      |
//! | `OracleError`       | recovered with the fallback move generator        |
//! | `TraitFormulaError` | trait is inert for that activation                |
//! | `IntegrityError`    | fatal, match ends as `SimulationFailed`           |
//! | `SubscriberError`   | fails the current round step                      |

use std::time::Duration;

use thiserror::Error;

use super::ids::{TeamId, UnitId};
use crate::traits::TraitId;
use crate::units::{Division, Role};

/// Lineup or configuration rejected before simulation starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{team} fields {found} active units, expected {expected}")]
    RosterSize {
        team: TeamId,
        expected: usize,
        found: usize,
    },

    #[error("{0} appears more than once in the match")]
    DuplicateUnit(UnitId),

    #[error("{team} has {found} field leaders, expected exactly one")]
    FieldLeaderCount { team: TeamId, found: usize },

    #[error("{unit} has role {role} which belongs to the {expected:?} division, not {found:?}")]
    DivisionMismatch {
        unit: UnitId,
        role: Role,
        expected: Division,
        found: Division,
    },

    #[error("{unit} is listed under {found}, expected {expected}")]
    TeamMismatch {
        unit: UnitId,
        expected: TeamId,
        found: TeamId,
    },

    #[error("both sides field {0}")]
    SameTeam(TeamId),

    #[error("{unit} references unknown trait {trait_id}")]
    UnknownTrait { unit: UnitId, trait_id: TraitId },

    #[error("{0} is registered twice")]
    DuplicateTrait(TraitId),

    #[error("{unit} has {field} = {value}, outside the allowed range")]
    StatOutOfRange {
        unit: UnitId,
        field: &'static str,
        value: f64,
    },

    #[error("{0} is already knocked out (hp, stamina or life at the knockout threshold)")]
    AlreadyKnockedOut(UnitId),

    #[error("unknown role code {0:?}")]
    UnknownRole(String),

    #[error("invalid trait formula {formula:?}: {reason}")]
    TraitFormula { formula: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The move oracle could not produce a usable move.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("oracle did not answer within {0:?}")]
    Timeout(Duration),

    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("oracle returned an unusable move: {0}")]
    InvalidMove(String),
}

/// A trait effect could not be evaluated against the unit's current state.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{trait_id} formula failed: {reason}")]
pub struct TraitFormulaError {
    pub trait_id: TraitId,
    pub reason: String,
}

/// An event subscriber rejected an event.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("subscriber {subscriber} failed: {reason}")]
pub struct SubscriberError {
    pub subscriber: String,
    pub reason: String,
}

impl SubscriberError {
    pub fn new(subscriber: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            subscriber: subscriber.into(),
            reason: reason.into(),
        }
    }
}

/// Post-round invariant check failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("{unit} stamina {value} is outside [0, 100]")]
    StaminaOutOfRange { unit: UnitId, value: f64 },

    #[error("{unit} morale {value} is outside [0, 100]")]
    MoraleOutOfRange { unit: UnitId, value: f64 },

    #[error("{unit} hp {value} is outside [0, 100]")]
    HpOutOfRange { unit: UnitId, value: f64 },

    #[error("{team} morale {value} is outside [0, 100]")]
    TeamMoraleOutOfRange { team: TeamId, value: f64 },

    #[error("{unit} meets the knockout condition but is not marked knocked out")]
    UndetectedKnockout { unit: UnitId },

    #[error("{team} has {found} field leaders")]
    FieldLeaderCount { team: TeamId, found: usize },

    #[error("{unit} activated {trait_id} while cooling down")]
    TraitActiveDuringCooldown { unit: UnitId, trait_id: TraitId },

    #[error("{unit} took part in {count} convergences, cap is {cap}")]
    ConvergenceCapExceeded { unit: UnitId, count: u32, cap: u32 },
}

/// Top-level error for the crate's public entry points.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("match integrity violated: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary encoding error: {0}")]
    Binary(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, MatchError>;
