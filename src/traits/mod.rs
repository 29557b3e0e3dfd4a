//! Trait system.
//!
//! - `definition`: trait ids, triggers, parsed effect formulas
//! - `catalog`: shared registry of definitions, including the standard set
//! - `engine`: eligibility, cost, activation and cooldown state machine

pub mod definition;
pub mod catalog;
pub mod engine;

pub use definition::{
    AllyEventKind, CostCategory, EffectTarget, FormulaKind, TraitDefinition, TraitEffect, TraitId,
    TraitSpec, TraitTrigger,
};
pub use catalog::TraitCatalog;
pub use engine::{Activation, Eligibility, TraitEngine, TraitEvent, TraitOutcome};
