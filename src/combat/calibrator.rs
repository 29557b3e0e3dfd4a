//! Damage, injury, morale and XP for a single combat action.
//!
//! `CombatCalibrator::resolve` is a pure function of the two combatant views
//! and the action, plus at most one draw from the match dice for the injury
//! roll. It never touches `Unit`s; the orchestrator applies the outcome.

use serde::{Deserialize, Serialize};

use crate::core::{CombatConfig, FatigueTable, MatchConfig, MoraleConfig, ProbabilityEngine, TeamId, UnitId, XpConfig};
use crate::traits::EffectTarget;
use crate::units::{AttributeKind, FatigueTier, InjurySeverity, Role, Unit, KNOCKOUT_HP};

/// Snapshot of what combat needs to know about one unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatantView {
    pub unit: UnitId,
    pub team: TeamId,
    pub role: Role,
    pub hp: f64,
    pub stamina: f64,
    pub tier: FatigueTier,
    pub durability: f64,
    pub resilience: f64,
    /// Product of active `DamageDealt` modifiers.
    pub damage_dealt: f64,
    /// Product of active `DamageTaken` modifiers.
    pub damage_taken: f64,
}

impl CombatantView {
    #[must_use]
    pub fn of(unit: &Unit, table: &FatigueTable) -> Self {
        Self {
            unit: unit.id,
            team: unit.team_id,
            role: unit.role,
            hp: unit.hp,
            stamina: unit.stamina,
            tier: unit.fatigue_tier(table),
            durability: unit.effective_attribute(AttributeKind::Durability),
            resilience: unit.effective_attribute(AttributeKind::Resilience),
            damage_dealt: unit.status.modify(EffectTarget::DamageDealt, 1.0).max(0.0),
            damage_taken: unit.status.modify(EffectTarget::DamageTaken, 1.0).max(0.0),
        }
    }
}

/// What kind of hit is being calibrated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionType {
    /// The attacker captured `material` on its board.
    Capture { material: i32 },
    /// The defender lost `material` on its own board.
    MaterialLoss { material: i32 },
    /// The attacker won a convergence by `margin`.
    Convergence { margin: f64, critical: bool },
}

impl ActionType {
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(self, ActionType::Convergence { critical: true, .. })
    }
}

/// Everything one combat action changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatOutcome {
    /// Final damage to the defender, rounded to 0.1.
    pub damage: f64,
    /// The damage will take the defender to the knockout threshold.
    pub predicted_knockout: bool,
    pub injury: Option<InjurySeverity>,
    pub attacker_morale: f64,
    pub defender_morale: f64,
    pub attacker_team_morale: f64,
    pub defender_team_morale: f64,
    pub attacker_xp: u32,
    pub defender_xp: u32,
}

#[derive(Clone, Copy)]
pub struct CombatCalibrator<'a> {
    combat: &'a CombatConfig,
    morale: &'a MoraleConfig,
    xp: &'a XpConfig,
    fatigue: &'a FatigueTable,
    injuries: bool,
}

impl<'a> CombatCalibrator<'a> {
    #[must_use]
    pub fn from_config(config: &'a MatchConfig) -> Self {
        Self {
            combat: &config.combat,
            morale: &config.morale,
            xp: &config.xp,
            fatigue: &config.fatigue,
            injuries: config.features.injuries,
        }
    }

    /// Damage before any multiplier.
    #[must_use]
    pub fn base_damage(&self, action: ActionType) -> f64 {
        match action {
            ActionType::Capture { material } => f64::from(material.max(0)) * self.combat.capture_damage_per_material,
            ActionType::MaterialLoss { material } => {
                f64::from(material.max(0)) * self.combat.material_loss_damage_per_material
            }
            ActionType::Convergence { margin, .. } => {
                self.combat.convergence_base_damage + margin.max(0.0) * self.combat.margin_damage_scale
            }
        }
    }

    /// Final damage for `action`, rounded to 0.1.
    #[must_use]
    pub fn damage(&self, attacker: &CombatantView, defender: &CombatantView, action: ActionType) -> f64 {
        let c = self.combat;
        let mut damage = self.base_damage(action) * c.global_damage_multiplier;

        if let ActionType::Convergence { critical, .. } = action {
            damage *= c.convergence_damage_multiplier;
            if critical {
                damage *= c.critical_damage_multiplier;
            }
        }

        damage *= attacker.damage_dealt;
        damage *= defender.damage_taken;

        damage *= match defender.tier {
            FatigueTier::Severe => 1.0 + self.fatigue.severe_damage_taken,
            FatigueTier::Moderate => 1.0 + self.fatigue.moderate_damage_taken,
            _ => 1.0,
        };
        if defender.stamina < c.low_stamina_threshold {
            damage *= 1.0 + c.low_stamina_extra_damage;
        }
        damage *= (1.0 - (defender.durability - 5.0) * c.durability_reduction_per_point).max(0.0);

        if !damage.is_finite() {
            return 0.0;
        }
        (damage.max(0.0) * 10.0).round() / 10.0
    }

    /// Chance in `[0, 1]` that `damage` injures the defender.
    #[must_use]
    pub fn injury_chance(&self, defender: &CombatantView, damage: f64) -> f64 {
        let c = self.combat;
        (c.injury_base_chance + damage / 100.0 - (defender.resilience - 5.0) * c.resilience_injury_reduction)
            .clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn injury_severity(&self, damage: f64) -> InjurySeverity {
        if damage >= self.combat.severe_injury_damage {
            InjurySeverity::Severe
        } else if damage >= self.combat.moderate_injury_damage {
            InjurySeverity::Moderate
        } else {
            InjurySeverity::Minor
        }
    }

    /// Calibrate one action.
    pub fn resolve(
        &self,
        attacker: &CombatantView,
        defender: &CombatantView,
        action: ActionType,
        dice: &mut ProbabilityEngine,
    ) -> CombatOutcome {
        let damage = self.damage(attacker, defender, action);
        let predicted_knockout = damage > 0.0 && defender.hp - damage <= KNOCKOUT_HP;

        let injury_gate = predicted_knockout || defender.stamina < self.combat.low_stamina_threshold;
        let injury = if self.injuries && damage > 0.0 && injury_gate {
            dice.chance(self.injury_chance(defender, damage))
                .then(|| self.injury_severity(damage))
        } else {
            None
        };

        let m = self.morale;
        let x = self.xp;
        let mut outcome = CombatOutcome {
            damage,
            predicted_knockout,
            injury,
            attacker_morale: 0.0,
            defender_morale: 0.0,
            attacker_team_morale: 0.0,
            defender_team_morale: 0.0,
            attacker_xp: 0,
            defender_xp: 0,
        };

        match action {
            ActionType::Capture { material } | ActionType::MaterialLoss { material } => {
                let material = material.max(0).unsigned_abs();
                outcome.attacker_morale = m.capture_gain;
                outcome.defender_morale = -m.material_loss;
                outcome.attacker_xp = x.capture_base + x.per_material * material;
            }
            ActionType::Convergence { critical, .. } => {
                outcome.attacker_morale = m.convergence_win;
                outcome.defender_morale = -m.convergence_loss;
                let win = f64::from(x.convergence_win);
                outcome.attacker_xp = if critical {
                    (win * self.combat.critical_xp_multiplier).round() as u32
                } else {
                    x.convergence_win
                };
                outcome.defender_xp = x.convergence_loss;
            }
        }

        if predicted_knockout {
            outcome.attacker_xp += x.knockout;
            outcome.defender_team_morale = -(m.knockout_team_loss * m.knockout_loss_multiplier);
            if defender.role == Role::FieldLeader {
                outcome.defender_team_morale -= m.field_leader_team_loss;
            }
        }

        outcome
    }
}
