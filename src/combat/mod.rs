//! Combat resolution.
//!
//! - `calibrator`: damage, injury, morale and XP for captures, material
//!   losses and convergences
//! - `convergence`: detection, gating and contested rolls for cross-board
//!   convergences

pub mod calibrator;
pub mod convergence;

pub use calibrator::{ActionType, CombatCalibrator, CombatOutcome, CombatantView};
pub use convergence::{
    assists, detect, BoardFootprint, ConvergenceCandidate, ConvergenceRecord, ConvergenceResolver,
    ConvergenceTally,
};
