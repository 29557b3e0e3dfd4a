//! Units and teams.
//!
//! A `Unit` is one participant: attributes, resources (HP, stamina, morale),
//! traits, status effects and progression. A `Team` is the eight units a side
//! fields plus its morale pool and synergy.

pub mod attributes;
pub mod role;
pub mod status;
pub mod unit;
pub mod team;
pub mod lineup;

pub use attributes::{AttributeKind, Attributes, ATTRIBUTE_BASELINE, ATTRIBUTE_MAX, ATTRIBUTE_MIN};
pub use role::{Division, Role};
pub use status::{StatusEffect, StatusEffects};
pub use unit::{
    CrossingDirection, DamageReport, FatigueTier, Injury, InjurySeverity, StaminaChange,
    StaminaReason, ThresholdCrossing, TraitInstance, TraitPhase, Unit, DEFAULT_MORALE,
    KNOCKOUT_HP, MAX_STAT,
};
pub use team::{Synergy, Team, ACTIVE_ROSTER_SIZE};
pub use lineup::validate_lineup;
