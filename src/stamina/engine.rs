//! Per-round stamina decay, recovery and the forced-resignation roll.

use serde::{Deserialize, Serialize};

use crate::core::{FatigueTable, MatchConfig, ProbabilityEngine, StaminaConfig};
use crate::units::{FatigueTier, StaminaChange, StaminaReason, Unit};

/// What a unit did this round, for decay purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Activity {
    /// No move: board finished, resigned, or nothing requested.
    Idle,
    Moved,
    Captured,
    Converged,
}

/// Continuous penalties for a fatigue tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FatigueEffects {
    /// Multiplier on effective combat score.
    pub accuracy_factor: f64,
    /// Multiplier on damage received.
    pub damage_taken_factor: f64,
    /// Multiplier on trait activation chance.
    pub activation_factor: f64,
}

#[derive(Clone, Copy)]
pub struct StaminaEngine<'a> {
    config: &'a StaminaConfig,
    fatigue: &'a FatigueTable,
    forced_resignation: bool,
}

impl<'a> StaminaEngine<'a> {
    #[must_use]
    pub fn new(config: &'a StaminaConfig, fatigue: &'a FatigueTable) -> Self {
        Self {
            config,
            fatigue,
            forced_resignation: true,
        }
    }

    /// Engine with the match's feature flags applied.
    #[must_use]
    pub fn from_config(config: &'a MatchConfig) -> Self {
        Self {
            config: &config.stamina,
            fatigue: &config.fatigue,
            forced_resignation: config.features.forced_resignation,
        }
    }

    fn activity_modifier(&self, activity: Activity) -> f64 {
        match activity {
            Activity::Idle => self.config.idle_activity,
            Activity::Moved => self.config.move_activity,
            Activity::Captured => self.config.capture_activity,
            Activity::Converged => self.config.convergence_activity,
        }
    }

    /// Stamina lost this round.
    #[must_use]
    pub fn decay(&self, activity: Activity) -> f64 {
        self.config.base_decay * self.activity_modifier(activity) * self.config.global_multiplier
    }

    /// Stamina regained this round, never negative.
    #[must_use]
    pub fn recovery(&self, unit: &Unit, activity: Activity) -> f64 {
        let mut recovery = self.config.base_recovery;
        if activity == Activity::Idle {
            recovery *= self.config.bench_bonus;
        }
        recovery -= self.config.trait_penalty * unit.cooling_traits() as f64;
        recovery.max(0.0)
    }

    /// Net change decay and recovery would apply.
    #[must_use]
    pub fn net_change(&self, unit: &Unit, activity: Activity) -> f64 {
        self.recovery(unit, activity) - self.decay(activity)
    }

    /// Apply one round of decay and recovery as a single adjustment.
    pub fn tick(&self, unit: &mut Unit, activity: Activity, round: u32) -> StaminaChange {
        let net = self.net_change(unit, activity);
        let reason = if net < 0.0 {
            StaminaReason::Decay
        } else {
            StaminaReason::Recovery
        };
        unit.adjust_stamina(net, reason, round, &self.fatigue.boundaries())
    }

    #[must_use]
    pub fn fatigue_effects(&self, tier: FatigueTier) -> FatigueEffects {
        let f = self.fatigue;
        let accuracy_factor = if tier >= FatigueTier::Minor {
            1.0 - f.minor_accuracy_penalty
        } else {
            1.0
        };
        let damage_taken_factor = match tier {
            FatigueTier::Severe => 1.0 + f.severe_damage_taken,
            FatigueTier::Moderate => 1.0 + f.moderate_damage_taken,
            _ => 1.0,
        };
        let activation_factor = if tier >= FatigueTier::Moderate {
            1.0 - f.moderate_activation_penalty
        } else {
            1.0
        };
        FatigueEffects {
            accuracy_factor,
            damage_taken_factor,
            activation_factor,
        }
    }

    /// Roll for a fatigue resignation. Only severely fatigued, active units
    /// roll; everyone else returns `false` without consuming randomness.
    pub fn forced_resignation(&self, unit: &Unit, dice: &mut ProbabilityEngine) -> bool {
        if !self.forced_resignation || !unit.is_active() {
            return false;
        }
        if unit.fatigue_tier(self.fatigue) != FatigueTier::Severe {
            return false;
        }
        dice.percent_chance(self.fatigue.forced_resignation_percent)
    }
}
