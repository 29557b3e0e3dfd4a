//! Match configuration.
//!
//! Every tunable of the engine lives in `MatchConfig`, grouped by subsystem:
//! - `StaminaConfig`: decay, recovery and activity modifiers
//! - `FatigueTable`: tier boundaries and their penalties
//! - `TraitConfig`: activation chance and cost scaling
//! - `CombatConfig`: damage, critical and injury tuning
//! - `ConvergenceConfig`: per-unit cap and fairness policy
//! - `MoraleConfig` / `XpConfig`: progression deltas
//! - `LossConditions`, `OracleConfig`, `FeatureFlags`
//!
//! All structs implement `Default` with the league's standard values and
//! deserialize with `#[serde(default)]`, so a TOML override only needs the
//! keys it changes.
//!
//! ```
//! use meta_league::core::MatchConfig;
//!
//! let config = MatchConfig::from_toml_str("max_rounds = 12\n[stamina]\nbase_decay = 5.0\n").unwrap();
//! assert_eq!(config.max_rounds, 12);
//! assert_eq!(config.stamina.base_decay, 5.0);
//! assert_eq!(config.stamina.base_recovery, 3.0);
//! ```

use serde::{Deserialize, Serialize};

use super::error::{MatchError, ValidationError};

/// Stamina decay and recovery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaminaConfig {
    /// Stamina lost per round at activity modifier 1.0.
    pub base_decay: f64,
    /// Stamina regained per round before penalties.
    pub base_recovery: f64,
    /// Scales every decay.
    pub global_multiplier: f64,
    /// Recovery multiplier for units that did not act this round.
    pub bench_bonus: f64,
    /// Recovery lost per trait currently cooling down.
    pub trait_penalty: f64,
    pub idle_activity: f64,
    pub move_activity: f64,
    pub capture_activity: f64,
    pub convergence_activity: f64,
}

impl Default for StaminaConfig {
    fn default() -> Self {
        Self {
            base_decay: 4.0,
            base_recovery: 3.0,
            global_multiplier: 1.0,
            bench_bonus: 1.5,
            trait_penalty: 0.5,
            idle_activity: 0.5,
            move_activity: 1.0,
            capture_activity: 1.25,
            convergence_activity: 1.5,
        }
    }
}

/// Fatigue tier boundaries and penalties.
///
/// A unit is in a tier when its stamina is at or below the tier's boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueTable {
    pub minor: f64,
    pub moderate: f64,
    pub severe: f64,
    /// Fraction removed from effective combat score at minor fatigue or worse.
    pub minor_accuracy_penalty: f64,
    /// Extra damage taken at moderate fatigue.
    pub moderate_damage_taken: f64,
    /// Fraction removed from trait activation chance at moderate fatigue or worse.
    pub moderate_activation_penalty: f64,
    /// Extra damage taken at severe fatigue.
    pub severe_damage_taken: f64,
    /// Percent chance per round that a severely fatigued unit resigns its board.
    pub forced_resignation_percent: f64,
}

impl Default for FatigueTable {
    fn default() -> Self {
        Self {
            minor: 60.0,
            moderate: 40.0,
            severe: 20.0,
            minor_accuracy_penalty: 0.05,
            moderate_damage_taken: 0.10,
            moderate_activation_penalty: 0.25,
            severe_damage_taken: 0.20,
            forced_resignation_percent: 2.0,
        }
    }
}

impl FatigueTable {
    /// Tier boundaries, highest first.
    #[must_use]
    pub fn boundaries(&self) -> [f64; 3] {
        [self.minor, self.moderate, self.severe]
    }
}

/// Stamina cost multipliers by trait cost category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostMultipliers {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub extreme: f64,
}

impl Default for CostMultipliers {
    fn default() -> Self {
        Self {
            low: 0.5,
            medium: 1.0,
            high: 2.0,
            extreme: 3.0,
        }
    }
}

/// Trait activation and cost tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraitConfig {
    pub min_activation_chance: f64,
    pub max_activation_chance: f64,
    /// Chance added per attribute point above 5 (removed below 5).
    pub attribute_modifier_per_point: f64,
    pub cost_multipliers: CostMultipliers,
    /// Cost reduction per willpower point above 5.
    pub willpower_cost_reduction: f64,
    pub max_willpower_reduction: f64,
    /// Cost growth per round after the first.
    pub round_cost_scaling: f64,
    pub max_round_cost_scaling: f64,
}

impl Default for TraitConfig {
    fn default() -> Self {
        Self {
            min_activation_chance: 0.20,
            max_activation_chance: 0.95,
            attribute_modifier_per_point: 0.04,
            cost_multipliers: CostMultipliers::default(),
            willpower_cost_reduction: 0.1,
            max_willpower_reduction: 0.5,
            round_cost_scaling: 0.02,
            max_round_cost_scaling: 1.2,
        }
    }
}

/// Damage, critical and injury tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub global_damage_multiplier: f64,
    pub convergence_damage_multiplier: f64,
    /// Damage per point of captured material.
    pub capture_damage_per_material: f64,
    /// Damage per point of material lost on the unit's own board.
    pub material_loss_damage_per_material: f64,
    pub convergence_base_damage: f64,
    /// Damage added per point of contest margin.
    pub margin_damage_scale: f64,
    /// Contest margin at or above which a convergence is a critical success.
    pub critical_margin: f64,
    pub critical_damage_multiplier: f64,
    pub critical_xp_multiplier: f64,
    pub low_stamina_threshold: f64,
    pub low_stamina_extra_damage: f64,
    /// Damage reduction per durability point above 5.
    pub durability_reduction_per_point: f64,
    pub injury_base_chance: f64,
    /// Injury chance removed per resilience point above 5.
    pub resilience_injury_reduction: f64,
    pub moderate_injury_damage: f64,
    pub severe_injury_damage: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            global_damage_multiplier: 1.0,
            convergence_damage_multiplier: 2.0,
            capture_damage_per_material: 3.0,
            material_loss_damage_per_material: 3.0,
            convergence_base_damage: 6.0,
            margin_damage_scale: 0.2,
            critical_margin: 30.0,
            critical_damage_multiplier: 1.5,
            critical_xp_multiplier: 1.5,
            low_stamina_threshold: 35.0,
            low_stamina_extra_damage: 0.20,
            durability_reduction_per_point: 0.03,
            injury_base_chance: 0.25,
            resilience_injury_reduction: 0.03,
            moderate_injury_damage: 20.0,
            severe_injury_damage: 30.0,
        }
    }
}

/// Convergence cap and fairness policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Maximum convergences a unit may take part in per match.
    pub max_per_unit: u32,
    /// Share of a round's convergences above which a unit is not targeted again.
    pub fairness_share: f64,
    /// Resolved convergences in the round before the share is enforced.
    pub fairness_min_sample: u32,
    /// Ignore pawn moves when matching destination squares.
    pub ignore_pawns: bool,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_per_unit: 3,
            fairness_share: 0.5,
            fairness_min_sample: 2,
            ignore_pawns: true,
        }
    }
}

/// Unit and team morale deltas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoraleConfig {
    pub capture_gain: f64,
    pub material_loss: f64,
    pub convergence_win: f64,
    pub convergence_loss: f64,
    /// Team morale lost when one of its units is knocked out.
    pub knockout_team_loss: f64,
    pub knockout_loss_multiplier: f64,
    /// Additional team morale lost when the field leader falls.
    pub field_leader_team_loss: f64,
    /// Fraction of the gap to team morale closed per round.
    pub drift_rate: f64,
    /// Morale lost per round at severe fatigue.
    pub severe_fatigue_loss: f64,
    pub board_win_team_gain: f64,
}

impl Default for MoraleConfig {
    fn default() -> Self {
        Self {
            capture_gain: 1.0,
            material_loss: 1.0,
            convergence_win: 3.0,
            convergence_loss: 3.0,
            knockout_team_loss: 10.0,
            knockout_loss_multiplier: 1.1,
            field_leader_team_loss: 15.0,
            drift_rate: 0.1,
            severe_fatigue_loss: 1.0,
            board_win_team_gain: 5.0,
        }
    }
}

/// Experience awards and level thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpConfig {
    pub capture_base: u32,
    pub per_material: u32,
    pub convergence_win: u32,
    pub convergence_loss: u32,
    pub assist: u32,
    pub knockout: u32,
    pub trait_activation: u32,
    pub round_survived: u32,
    pub board_win: u32,
    /// Cumulative XP required for each level, starting at level 1.
    pub level_thresholds: Vec<u32>,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            capture_base: 2,
            per_material: 1,
            convergence_win: 10,
            convergence_loss: 2,
            assist: 3,
            knockout: 15,
            trait_activation: 1,
            round_survived: 1,
            board_win: 20,
            level_thresholds: vec![0, 50, 120, 200, 300, 450],
        }
    }
}

/// Conditions that end a match before the round limit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossConditions {
    pub field_leader_knockout: bool,
    pub max_knockouts: usize,
    pub min_team_morale: f64,
    /// Weight of board material in the round-limit tiebreak.
    pub tiebreak_material_weight: f64,
}

impl Default for LossConditions {
    fn default() -> Self {
        Self {
            field_leader_knockout: true,
            max_knockouts: 5,
            min_team_morale: 0.0,
            tiebreak_material_weight: 3.0,
        }
    }
}

/// Move oracle access.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub depth: u8,
    /// Extra search depth granted to the field leader's board.
    pub field_leader_depth_bonus: u8,
    /// Per-request timeout. `None` calls the oracle inline.
    pub timeout_ms: Option<u64>,
    /// Failures in a row before the oracle is bypassed for the rest of the match.
    pub max_consecutive_failures: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            depth: 8,
            field_leader_depth_bonus: 2,
            timeout_ms: Some(250),
            max_consecutive_failures: 5,
        }
    }
}

/// Optional subsystems.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub injuries: bool,
    pub morale_drift: bool,
    pub forced_resignation: bool,
    pub fairness_policy: bool,
    pub synergy: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            injuries: true,
            morale_drift: true,
            forced_resignation: true,
            fairness_policy: true,
            synergy: true,
        }
    }
}

/// Complete match configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub max_rounds: u32,
    pub stamina: StaminaConfig,
    pub fatigue: FatigueTable,
    pub traits: TraitConfig,
    pub combat: CombatConfig,
    pub convergence: ConvergenceConfig,
    pub morale: MoraleConfig,
    pub xp: XpConfig,
    pub loss: LossConditions,
    pub oracle: OracleConfig,
    pub features: FeatureFlags,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_rounds: 30,
            stamina: StaminaConfig::default(),
            fatigue: FatigueTable::default(),
            traits: TraitConfig::default(),
            combat: CombatConfig::default(),
            convergence: ConvergenceConfig::default(),
            morale: MoraleConfig::default(),
            xp: XpConfig::default(),
            loss: LossConditions::default(),
            oracle: OracleConfig::default(),
            features: FeatureFlags::default(),
        }
    }
}

impl MatchConfig {
    /// Parse a TOML override and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, MatchError> {
        let config: MatchConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the round limit (builder pattern).
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Replace the feature flags (builder pattern).
    #[must_use]
    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Set the oracle timeout (builder pattern).
    #[must_use]
    pub fn with_oracle_timeout(mut self, timeout_ms: Option<u64>) -> Self {
        self.oracle.timeout_ms = timeout_ms;
        self
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        fn fail(reason: impl Into<String>) -> Result<(), ValidationError> {
            Err(ValidationError::InvalidConfig(reason.into()))
        }

        if self.max_rounds == 0 {
            return fail("max_rounds must be at least 1");
        }

        let f = &self.fatigue;
        if !(100.0 > f.minor && f.minor > f.moderate && f.moderate > f.severe && f.severe > 0.0) {
            return fail("fatigue boundaries must satisfy 100 > minor > moderate > severe > 0");
        }
        if !(0.0..=100.0).contains(&f.forced_resignation_percent) {
            return fail("fatigue.forced_resignation_percent must be within [0, 100]");
        }

        let t = &self.traits;
        if !(0.0 <= t.min_activation_chance
            && t.min_activation_chance <= t.max_activation_chance
            && t.max_activation_chance <= 1.0)
        {
            return fail("trait activation chance bounds must satisfy 0 <= min <= max <= 1");
        }
        if !(0.0..1.0).contains(&t.max_willpower_reduction) {
            return fail("traits.max_willpower_reduction must be within [0, 1)");
        }

        let (s, cb, m, cm) = (&self.stamina, &self.combat, &self.morale, &t.cost_multipliers);
        for (name, value) in [
            ("stamina.base_decay", s.base_decay),
            ("stamina.base_recovery", s.base_recovery),
            ("stamina.global_multiplier", s.global_multiplier),
            ("stamina.bench_bonus", s.bench_bonus),
            ("stamina.trait_penalty", s.trait_penalty),
            ("stamina.idle_activity", s.idle_activity),
            ("stamina.move_activity", s.move_activity),
            ("stamina.capture_activity", s.capture_activity),
            ("stamina.convergence_activity", s.convergence_activity),
            ("fatigue.moderate_damage_taken", f.moderate_damage_taken),
            ("fatigue.severe_damage_taken", f.severe_damage_taken),
            ("traits.attribute_modifier_per_point", t.attribute_modifier_per_point),
            ("traits.willpower_cost_reduction", t.willpower_cost_reduction),
            ("traits.round_cost_scaling", t.round_cost_scaling),
            ("traits.max_round_cost_scaling", t.max_round_cost_scaling),
            ("traits.cost_multipliers.low", cm.low),
            ("traits.cost_multipliers.medium", cm.medium),
            ("traits.cost_multipliers.high", cm.high),
            ("traits.cost_multipliers.extreme", cm.extreme),
            ("combat.global_damage_multiplier", cb.global_damage_multiplier),
            ("combat.convergence_damage_multiplier", cb.convergence_damage_multiplier),
            ("combat.capture_damage_per_material", cb.capture_damage_per_material),
            ("combat.material_loss_damage_per_material", cb.material_loss_damage_per_material),
            ("combat.convergence_base_damage", cb.convergence_base_damage),
            ("combat.margin_damage_scale", cb.margin_damage_scale),
            ("combat.critical_margin", cb.critical_margin),
            ("combat.critical_damage_multiplier", cb.critical_damage_multiplier),
            ("combat.critical_xp_multiplier", cb.critical_xp_multiplier),
            ("combat.low_stamina_extra_damage", cb.low_stamina_extra_damage),
            ("combat.durability_reduction_per_point", cb.durability_reduction_per_point),
            ("combat.resilience_injury_reduction", cb.resilience_injury_reduction),
            ("combat.moderate_injury_damage", cb.moderate_injury_damage),
            ("combat.severe_injury_damage", cb.severe_injury_damage),
            ("morale.capture_gain", m.capture_gain),
            ("morale.material_loss", m.material_loss),
            ("morale.convergence_win", m.convergence_win),
            ("morale.convergence_loss", m.convergence_loss),
            ("morale.knockout_team_loss", m.knockout_team_loss),
            ("morale.knockout_loss_multiplier", m.knockout_loss_multiplier),
            ("morale.field_leader_team_loss", m.field_leader_team_loss),
            ("morale.severe_fatigue_loss", m.severe_fatigue_loss),
            ("morale.board_win_team_gain", m.board_win_team_gain),
            ("loss.tiebreak_material_weight", self.loss.tiebreak_material_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return fail(format!("{name} must be a non-negative number"));
            }
        }

        for (name, value) in [
            ("fatigue.minor_accuracy_penalty", f.minor_accuracy_penalty),
            ("fatigue.moderate_activation_penalty", f.moderate_activation_penalty),
            ("combat.injury_base_chance", cb.injury_base_chance),
            ("morale.drift_rate", m.drift_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return fail(format!("{name} must be within [0, 1]"));
            }
        }

        for (name, value) in [
            ("combat.low_stamina_threshold", cb.low_stamina_threshold),
            ("loss.min_team_morale", self.loss.min_team_morale),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return fail(format!("{name} must be within [0, 100]"));
            }
        }
        if cb.moderate_injury_damage > cb.severe_injury_damage {
            return fail("combat.moderate_injury_damage must not exceed severe_injury_damage");
        }

        let c = &self.convergence;
        if c.max_per_unit == 0 {
            return fail("convergence.max_per_unit must be at least 1");
        }
        if !(c.fairness_share > 0.0 && c.fairness_share <= 1.0) {
            return fail("convergence.fairness_share must be within (0, 1]");
        }

        let levels = &self.xp.level_thresholds;
        if levels.is_empty() || levels.windows(2).any(|w| w[0] >= w[1]) {
            return fail("xp.level_thresholds must be non-empty and strictly ascending");
        }

        if self.loss.max_knockouts == 0 {
            return fail("loss.max_knockouts must be at least 1");
        }
        if self.oracle.timeout_ms == Some(0) {
            return fail("oracle.timeout_ms must be positive when set");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_boundaries() {
        assert_eq!(FatigueTable::default().boundaries(), [60.0, 40.0, 20.0]);
    }

    #[test]
    fn test_toml_partial_override() {
        let config = MatchConfig::from_toml_str(
            r#"
            max_rounds = 20

            [convergence]
            max_per_unit = 2

            [features]
            injuries = false
            "#,
        )
        .unwrap();

        assert_eq!(config.max_rounds, 20);
        assert_eq!(config.convergence.max_per_unit, 2);
        assert_eq!(config.convergence.fairness_share, 0.5);
        assert!(!config.features.injuries);
        assert!(config.features.synergy);
    }

    #[test]
    fn test_toml_rejects_bad_boundaries() {
        let err = MatchConfig::from_toml_str("[fatigue]\nminor = 30.0\n").unwrap_err();
        assert!(matches!(err, MatchError::Validation(ValidationError::InvalidConfig(_))));
    }

    #[test]
    fn test_toml_syntax_error() {
        let err = MatchConfig::from_toml_str("max_rounds = = 3").unwrap_err();
        assert!(matches!(err, MatchError::ConfigParse(_)));
    }

    #[test]
    fn test_rejects_unsorted_levels() {
        let mut config = MatchConfig::default();
        config.xp.level_thresholds = vec![0, 100, 50];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_tuning() {
        let invalid = |edit: fn(&mut MatchConfig)| {
            let mut config = MatchConfig::default();
            edit(&mut config);
            matches!(config.validate(), Err(ValidationError::InvalidConfig(_)))
        };
        assert!(invalid(|c| c.combat.critical_margin = f64::NAN));
        assert!(invalid(|c| c.combat.low_stamina_threshold = f64::INFINITY));
        assert!(invalid(|c| c.combat.low_stamina_threshold = 120.0));
        assert!(invalid(|c| c.combat.durability_reduction_per_point = -0.03));
        assert!(invalid(|c| c.stamina.trait_penalty = -1.0));
        assert!(invalid(|c| c.morale.knockout_team_loss = f64::NAN));
        assert!(invalid(|c| c.morale.drift_rate = 1.5));
        assert!(invalid(|c| c.combat.injury_base_chance = f64::NAN));
        assert!(invalid(|c| c.combat.moderate_injury_damage = 50.0));
        assert!(!invalid(|c| c.combat.critical_margin = 0.0));
    }

    #[test]
    fn test_builders() {
        let config = MatchConfig::default()
            .with_max_rounds(4)
            .with_oracle_timeout(None);
        assert_eq!(config.max_rounds, 4);
        assert_eq!(config.oracle.timeout_ms, None);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = MatchConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: MatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
