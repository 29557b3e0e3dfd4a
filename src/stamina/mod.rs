//! Stamina decay, recovery and fatigue effects.
//!
//! Stamina falls with activity and recovers a little every round; the net
//! change is applied once per unit per round through `Unit::adjust_stamina`,
//! so fatigue boundary crossings are reported exactly once. Fatigue tiers
//! are read from current stamina whenever they matter; crossings only feed
//! the event log and `StaminaThreshold` traits.

pub mod engine;

pub use engine::{Activity, FatigueEffects, StaminaEngine};
