//! Morale drift toward the team pool.

use crate::core::{FatigueTable, MatchConfig, MoraleConfig};
use crate::units::{AttributeKind, FatigueTier, Unit};

/// End-of-round morale adjustment for a single unit.
///
/// Unit morale closes a fraction of the gap to its team's morale each
/// round. Willpower speeds recovery toward a higher pool and slows the slide
/// toward a lower one. Severe fatigue costs a flat amount on top.
#[derive(Clone, Copy)]
pub struct MoraleDrift<'a> {
    config: &'a MoraleConfig,
    fatigue: &'a FatigueTable,
    enabled: bool,
}

impl<'a> MoraleDrift<'a> {
    #[must_use]
    pub fn from_config(config: &'a MatchConfig) -> Self {
        Self {
            config: &config.morale,
            fatigue: &config.fatigue,
            enabled: config.features.morale_drift,
        }
    }

    /// Drift this round would apply, before clamping.
    #[must_use]
    pub fn drift(&self, unit: &Unit, team_morale: f64) -> f64 {
        let gap = team_morale - unit.morale;
        let willpower = (unit.effective_attribute(AttributeKind::Willpower) - 5.0) / 5.0;
        let scale = if gap > 0.0 {
            1.0 + willpower * 0.5
        } else {
            1.0 - willpower * 0.3
        };
        gap * self.config.drift_rate * scale.max(0.0)
    }

    /// Apply drift and fatigue loss. Returns the applied change.
    pub fn apply(&self, unit: &mut Unit, team_morale: f64) -> f64 {
        if unit.knocked_out {
            return 0.0;
        }
        let mut delta = 0.0;
        if self.enabled {
            delta += self.drift(unit, team_morale);
        }
        if unit.fatigue_tier(self.fatigue) == FatigueTier::Severe {
            delta -= self.config.severe_fatigue_loss;
        }
        unit.adjust_morale(delta)
    }
}
