//! Core engine types: identifiers, RNG, probability, configuration, errors.
//!
//! Everything here is independent of the round loop and is shared by every
//! other module.

pub mod ids;
pub mod rng;
pub mod dice;
pub mod config;
pub mod error;

pub use ids::{Side, SideMap, TeamId, UnitId};
pub use rng::{MatchRng, MatchRngState};
pub use dice::{ContestWinner, ContestedRoll, ProbabilityEngine, D20};
pub use config::{
    CombatConfig, ConvergenceConfig, CostMultipliers, FatigueTable, FeatureFlags,
    LossConditions, MatchConfig, MoraleConfig, OracleConfig, StaminaConfig, TraitConfig,
    XpConfig,
};
pub use error::{
    IntegrityError, MatchError, OracleError, Result, SubscriberError, TraitFormulaError,
    ValidationError,
};
