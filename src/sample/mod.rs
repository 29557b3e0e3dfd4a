//! Ready-made rosters and a scripted oracle.
//!
//! Used by the tests, the benchmark and anyone wiring the engine up for the
//! first time:
//! - `sample_team` builds a valid eight-unit lineup with the standard traits
//! - `ScriptedOracle` replays fixed moves per board

mod roster;
mod oracle;

pub use roster::{sample_team, TeamBuilder, SAMPLE_ROLES};
pub use oracle::ScriptedOracle;
