//! Matchdays: many fixtures played in parallel.
//!
//! - `schedule`: fixtures and round-robin pairing
//! - `runner`: per-fixture seeding and the parallel run
//!
//! Each fixture gets its own seed derived from the matchday seed and the
//! match id, so results do not depend on which worker thread played it.

mod schedule;
mod runner;

pub use schedule::{round_robin_pairings, Fixture};
pub use runner::{match_seed, Matchday};
