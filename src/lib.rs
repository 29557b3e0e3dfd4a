//! # meta-league
//!
//! Per-round match orchestration for a league of chess-playing units.
//!
//! Every unit plays its own board against the opposing unit in the same
//! roster slot. Moves come from an external move oracle; this crate turns
//! them into a match: stamina and fatigue, traits, combat damage,
//! cross-board convergences, morale, XP, loss conditions and a complete
//! event log.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: all randomness flows through one seeded
//!    `ProbabilityEngine` per match. Same seed, same inputs, same log.
//!
//! 2. **No globals**: configuration and the trait catalog are shared behind
//!    `Arc`; each match owns its `MatchContext`.
//!
//! 3. **Configuration Over Convention**: every tunable lives in
//!    `MatchConfig`, loadable from TOML and validated before the first round.
//!
//! ## Architecture
//!
//! - **Round steps return `Result`**: the orchestrator snapshots state before
//!   each round, retries once with the failing step skipped, and aborts on a
//!   second failure.
//!
//! - **Persistent Data Structures**: O(1) snapshot clones via `im-rs`.
//!
//! ## Modules
//!
//! - `core`: ids, RNG and dice, configuration, errors
//! - `units`: attributes, roles, units, teams, lineup validation
//! - `traits`: trait definitions, catalog and the activation state machine
//! - `events`: event types, log records and the subscriber bus
//! - `board`: move oracle boundary, fallback moves, per-board state
//! - `stamina`: decay, recovery and fatigue effects
//! - `combat`: damage calibration and convergence resolution
//! - `progression`: XP, levels and morale drift
//! - `orchestrator`: the round loop and the match result
//! - `matchday`: parallel fixtures and round-robin pairing
//! - `sample`: ready-made rosters and a scripted oracle
//!
//! ## Example
//!
//! ```
//! use meta_league::sample::sample_team;
//! use meta_league::{MatchOrchestrator, MatchSetup, TraitCatalog};
//!
//! let catalog = TraitCatalog::standard();
//! let setup = MatchSetup::new(
//!     "friendly",
//!     sample_team(1, "North", &catalog),
//!     sample_team(2, "South", &catalog),
//! )
//! .with_seed(42);
//!
//! let result = MatchOrchestrator::new(setup).unwrap().run();
//! assert!(!result.is_failed());
//! ```

pub mod core;
pub mod units;
pub mod traits;
pub mod events;
pub mod board;
pub mod stamina;
pub mod combat;
pub mod progression;
pub mod orchestrator;
pub mod matchday;
pub mod sample;

// Re-export commonly used types
pub use crate::core::{
    MatchConfig, MatchError, MatchRng, ProbabilityEngine, Side, SideMap, TeamId, UnitId,
};

pub use crate::units::{Attributes, Role, Team, Unit};

pub use crate::traits::{TraitCatalog, TraitDefinition, TraitEngine, TraitId};

pub use crate::events::{EventBus, EventPayload, EventSubscriber, EventType, MatchEvent};

pub use crate::board::{FallbackMoveGenerator, MoveOracle, OracleMove, Position};

pub use crate::stamina::StaminaEngine;

pub use crate::combat::{CombatCalibrator, ConvergenceResolver};

pub use crate::orchestrator::{
    MatchOrchestrator, MatchOutcome, MatchResult, MatchSetup, RoundStep, TerminationReason,
};

pub use crate::matchday::{Fixture, Matchday};
