//! Match orchestration.
//!
//! - `context`: per-match setup, state and roster index
//! - `round`: the seven round steps and the loss checks
//! - `integrity`: post-round invariant checks
//! - `runner`: `MatchOrchestrator`, the round loop with snapshot and retry
//! - `result`: outcome, termination reason and the serializable result

pub mod context;
pub mod round;
pub mod integrity;
pub mod runner;
pub mod result;

pub use context::{MatchContext, MatchSetup, MatchState, TraitLogEntry};
pub use round::{check_loss, round_limit_outcome, RoundDriver, RoundStep, StepError};
pub use runner::MatchOrchestrator;
pub use result::{FailureReport, MatchOutcome, MatchResult, TerminationReason, UnitSnapshot};
