//! Trait activation state machine.
//!
//! Each trait instance moves through:
//!
//! ```text
//! Idle ──trigger──▶ Eligible ──roll──▶ Activated ──▶ CoolingDown ──▶ Idle
//! ```
//!
//! Eligibility requires the trigger to match, no remaining cooldown, no
//! earlier activation this round, enough stamina for the scaled cost, and no
//! fatigue lock on the trait's cost category. Cooldown counts whole rounds
//! after the activation round, so a cooldown of 2 used in round 3 blocks
//! rounds 4 and 5.

use smallvec::SmallVec;

use crate::core::{FatigueTable, ProbabilityEngine, TraitConfig, TraitFormulaError};
use crate::units::{
    AttributeKind, CrossingDirection, DamageReport, FatigueTier, StaminaChange, StaminaReason, StatusEffect,
    TraitPhase, Unit,
};

use super::catalog::TraitCatalog;
use super::definition::{
    AllyEventKind, CostCategory, EffectTarget, FormulaKind, TraitDefinition, TraitId, TraitTrigger,
};

/// A match moment traits can react to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraitEvent {
    RoundStart,
    PreMove,
    PostMove,
    /// HP moved from `before` to `after` (both on the 0–100 scale).
    HpDropped { before: f64, after: f64 },
    StaminaCrossed {
        boundary: f64,
        direction: CrossingDirection,
    },
    Ally(AllyEventKind),
    Convergence,
}

impl TraitEvent {
    /// Does this event satisfy `trigger`?
    #[must_use]
    pub fn matches(&self, trigger: &TraitTrigger) -> bool {
        match (self, trigger) {
            (TraitEvent::RoundStart, TraitTrigger::RoundStart)
            | (TraitEvent::PreMove, TraitTrigger::PreMove)
            | (TraitEvent::PostMove, TraitTrigger::PostMove)
            | (TraitEvent::Convergence, TraitTrigger::Convergence) => true,
            (TraitEvent::HpDropped { before, after }, TraitTrigger::HpBelow { percent }) => {
                *before >= *percent && *after < *percent
            }
            (
                TraitEvent::StaminaCrossed { boundary, direction },
                TraitTrigger::StaminaThreshold {
                    boundary: wanted,
                    direction: wanted_direction,
                },
            ) => (boundary - wanted).abs() < 1e-9 && direction == wanted_direction,
            (TraitEvent::Ally(kind), TraitTrigger::AllyEvent(wanted)) => kind == wanted,
            _ => false,
        }
    }
}

/// Why a triggered trait did or did not become eligible.
#[derive(Clone, Debug, PartialEq)]
pub enum Eligibility {
    Eligible,
    Inactive,
    UnknownTrait,
    AlreadyActivated,
    CoolingDown { remaining: u32 },
    FatigueLocked { tier: FatigueTier },
    InsufficientStamina { required: f64, available: f64 },
}

impl std::fmt::Display for Eligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Eligibility::Eligible => write!(f, "eligible"),
            Eligibility::Inactive => write!(f, "unit inactive"),
            Eligibility::UnknownTrait => write!(f, "trait not in catalog"),
            Eligibility::AlreadyActivated => write!(f, "already activated this round"),
            Eligibility::CoolingDown { remaining } => write!(f, "cooling down ({remaining} rounds)"),
            Eligibility::FatigueLocked { tier } => write!(f, "locked by {tier:?} fatigue"),
            Eligibility::InsufficientStamina { required, available } => {
                write!(f, "needs {required:.1} stamina, has {available:.1}")
            }
        }
    }
}

/// What a successful activation did.
#[derive(Clone, Debug, PartialEq)]
pub struct Activation {
    pub trait_id: TraitId,
    pub chance: f64,
    pub cost: f64,
    pub target: EffectTarget,
    /// Change applied to a resource target, or the status value added.
    pub delta: f64,
    /// Stamina changes from the effect and from paying the cost, in order.
    pub stamina_changes: SmallVec<[StaminaChange; 2]>,
    pub hp_change: Option<DamageReport>,
    /// The effect could not be evaluated; the activation is still consumed.
    pub inert: Option<TraitFormulaError>,
}

impl Activation {
    /// The activation knocked its own unit out.
    #[must_use]
    pub fn knocked_out(&self) -> bool {
        self.hp_change.map_or(false, |h| h.knocked_out)
            || self.stamina_changes.iter().any(|c| c.knocked_out)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TraitOutcome {
    Activated(Activation),
    RollFailed { trait_id: TraitId, chance: f64 },
    Skipped { trait_id: TraitId, reason: Eligibility },
}

/// Evaluates triggers, eligibility, costs and effects for one match.
#[derive(Clone, Copy)]
pub struct TraitEngine<'a> {
    catalog: &'a TraitCatalog,
    config: &'a TraitConfig,
    fatigue: &'a FatigueTable,
}

impl<'a> TraitEngine<'a> {
    #[must_use]
    pub fn new(catalog: &'a TraitCatalog, config: &'a TraitConfig, fatigue: &'a FatigueTable) -> Self {
        Self {
            catalog,
            config,
            fatigue,
        }
    }

    /// Indices of the unit's traits whose trigger matches `event`, by trait id.
    #[must_use]
    pub fn triggered(&self, unit: &Unit, event: &TraitEvent) -> SmallVec<[usize; 4]> {
        let mut hits: SmallVec<[usize; 4]> = unit
            .traits
            .iter()
            .enumerate()
            .filter(|(_, instance)| {
                self.catalog
                    .get(instance.trait_id)
                    .map_or(false, |def| event.matches(&def.trigger))
            })
            .map(|(index, _)| index)
            .collect();
        hits.sort_by_key(|&index| unit.traits[index].trait_id);
        hits
    }

    /// Scaled stamina cost of activating `def` for `unit` in `round`.
    #[must_use]
    pub fn stamina_cost(&self, def: &TraitDefinition, base_cost: f64, unit: &Unit, round: u32) -> f64 {
        let m = &self.config.cost_multipliers;
        let category = match def.category {
            CostCategory::Low => m.low,
            CostCategory::Medium => m.medium,
            CostCategory::High => m.high,
            CostCategory::Extreme => m.extreme,
        };
        let willpower = unit.effective_attribute(AttributeKind::Willpower);
        let reduction = ((willpower - 5.0) * self.config.willpower_cost_reduction)
            .clamp(0.0, self.config.max_willpower_reduction);
        let scaling = (1.0 + f64::from(round.saturating_sub(1)) * self.config.round_cost_scaling)
            .min(self.config.max_round_cost_scaling);
        base_cost * category * (1.0 - reduction) * scaling
    }

    /// Activation chance, clamped to the configured bounds.
    #[must_use]
    pub fn activation_chance(&self, def: &TraitDefinition, unit: &Unit, synergy: f64) -> f64 {
        let mut chance = def.base_chance
            + (unit.effective_attribute(def.attribute) - 5.0) * self.config.attribute_modifier_per_point
            + synergy;
        if unit.fatigue_tier(self.fatigue) >= FatigueTier::Moderate {
            chance *= 1.0 - self.fatigue.moderate_activation_penalty;
        }
        chance = unit.status.modify(EffectTarget::ActivationChance, chance);
        chance.clamp(self.config.min_activation_chance, self.config.max_activation_chance)
    }

    fn fatigue_locked(&self, category: CostCategory, tier: FatigueTier) -> bool {
        match tier {
            FatigueTier::Severe => category >= CostCategory::High,
            FatigueTier::Moderate => category == CostCategory::Extreme,
            _ => false,
        }
    }

    /// Eligibility of a triggered trait instance.
    #[must_use]
    pub fn eligibility(&self, unit: &Unit, index: usize, round: u32) -> Eligibility {
        let Some(instance) = unit.traits.get(index) else {
            return Eligibility::UnknownTrait;
        };
        let Some(def) = self.catalog.get(instance.trait_id) else {
            return Eligibility::UnknownTrait;
        };
        if !unit.is_active() {
            return Eligibility::Inactive;
        }
        if instance.activated_in(round) {
            return Eligibility::AlreadyActivated;
        }
        if instance.is_cooling_down() {
            return Eligibility::CoolingDown {
                remaining: instance.cooldown_remaining,
            };
        }
        let tier = unit.fatigue_tier(self.fatigue);
        if self.fatigue_locked(def.category, tier) {
            return Eligibility::FatigueLocked { tier };
        }
        let required = self.stamina_cost(def, instance.stamina_cost, unit, round);
        if unit.stamina < required {
            return Eligibility::InsufficientStamina {
                required,
                available: unit.stamina,
            };
        }
        Eligibility::Eligible
    }

    /// Run one triggered trait through the state machine.
    pub fn resolve(
        &self,
        unit: &mut Unit,
        index: usize,
        round: u32,
        synergy: f64,
        dice: &mut ProbabilityEngine,
    ) -> TraitOutcome {
        let Some(trait_id) = unit.traits.get(index).map(|t| t.trait_id) else {
            return TraitOutcome::Skipped {
                trait_id: TraitId::new(u32::MAX),
                reason: Eligibility::UnknownTrait,
            };
        };
        let eligibility = self.eligibility(unit, index, round);
        let Some(def) = self.catalog.get(trait_id) else {
            return TraitOutcome::Skipped {
                trait_id,
                reason: Eligibility::UnknownTrait,
            };
        };
        if eligibility != Eligibility::Eligible {
            return TraitOutcome::Skipped {
                trait_id,
                reason: eligibility,
            };
        }

        let chance = self.activation_chance(def, unit, synergy);
        if !dice.chance(chance) {
            return TraitOutcome::RollFailed { trait_id, chance };
        }

        let cost = self.stamina_cost(def, unit.traits[index].stamina_cost, unit, round);
        let boundaries = self.fatigue.boundaries();

        let mut activation = Activation {
            trait_id,
            chance,
            cost,
            target: def.effect.target,
            delta: 0.0,
            stamina_changes: SmallVec::new(),
            hp_change: None,
            inert: None,
        };

        match apply_effect(def, unit, round, &boundaries) {
            Ok(applied) => {
                activation.delta = applied.delta;
                activation.hp_change = applied.hp_change;
                if let Some(change) = applied.stamina_change {
                    activation.stamina_changes.push(change);
                }
            }
            Err(err) => activation.inert = Some(err),
        }

        if cost > 0.0 {
            activation
                .stamina_changes
                .push(unit.adjust_stamina(-cost, StaminaReason::TraitCost, round, &boundaries));
        }

        let instance = &mut unit.traits[index];
        instance.cooldown_remaining = def.cooldown;
        instance.phase = TraitPhase::Activated;
        instance.last_activated = Some(round);
        instance.activations += 1;

        TraitOutcome::Activated(activation)
    }

    /// End-of-round cooldown tick.
    ///
    /// Instances activated this round start cooling down without losing a
    /// round. Returns the traits that became available again.
    pub fn end_of_round(&self, unit: &mut Unit, round: u32) -> SmallVec<[TraitId; 4]> {
        let mut ready = SmallVec::new();
        for instance in &mut unit.traits {
            if instance.activated_in(round) {
                instance.phase = if instance.cooldown_remaining > 0 {
                    TraitPhase::CoolingDown
                } else {
                    TraitPhase::Idle
                };
                continue;
            }
            if instance.cooldown_remaining > 0 {
                instance.cooldown_remaining -= 1;
                if instance.cooldown_remaining == 0 {
                    instance.phase = TraitPhase::Idle;
                    ready.push(instance.trait_id);
                } else {
                    instance.phase = TraitPhase::CoolingDown;
                }
            } else {
                instance.phase = TraitPhase::Idle;
            }
        }
        ready
    }
}

struct AppliedEffect {
    delta: f64,
    hp_change: Option<DamageReport>,
    stamina_change: Option<StaminaChange>,
}

fn apply_effect(
    def: &TraitDefinition,
    unit: &mut Unit,
    round: u32,
    boundaries: &[f64; 3],
) -> Result<AppliedEffect, TraitFormulaError> {
    let effect = def.effect;
    let fail = |reason: &str| TraitFormulaError {
        trait_id: def.id,
        reason: reason.to_string(),
    };

    if !effect.value.is_finite() {
        return Err(fail("value is not finite"));
    }
    if effect.kind == FormulaKind::Multiplicative && effect.value <= 0.0 {
        return Err(fail("factor must be positive"));
    }

    if !effect.target.is_resource() {
        if effect.duration == 0 {
            return Err(fail("status effect has no duration"));
        }
        unit.status.push(StatusEffect {
            source: def.id,
            target: effect.target,
            kind: effect.kind,
            value: effect.value,
            remaining_rounds: effect.duration,
        });
        return Ok(AppliedEffect {
            delta: effect.value,
            hp_change: None,
            stamina_change: None,
        });
    }

    let current = match effect.target {
        EffectTarget::Hp => unit.hp,
        EffectTarget::Stamina => unit.stamina,
        _ => unit.morale,
    };
    let delta = match effect.kind {
        FormulaKind::Flat => effect.value,
        FormulaKind::Additive => current * effect.value / 100.0,
        FormulaKind::Multiplicative => current * (effect.value - 1.0),
    };
    if !delta.is_finite() {
        return Err(fail("result is not finite"));
    }

    let mut applied = AppliedEffect {
        delta,
        hp_change: None,
        stamina_change: None,
    };
    match effect.target {
        EffectTarget::Hp if delta < 0.0 => {
            applied.hp_change = Some(unit.apply_damage(-delta, round));
        }
        EffectTarget::Hp => {
            let hp_before = unit.hp;
            unit.heal(delta);
            applied.hp_change = Some(DamageReport {
                hp_before,
                hp_after: unit.hp,
                knocked_out: false,
            });
        }
        EffectTarget::Stamina => {
            applied.stamina_change =
                Some(unit.adjust_stamina(delta, StaminaReason::TraitEffect, round, boundaries));
        }
        _ => {
            applied.delta = unit.adjust_morale(delta);
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MatchConfig, TeamId, UnitId};
    use crate::traits::TraitEffect;
    use crate::units::{Attributes, Role};

    fn certain() -> MatchConfig {
        let mut config = MatchConfig::default();
        config.traits.max_activation_chance = 1.0;
        config
    }

    fn catalog() -> TraitCatalog {
        let mut catalog = TraitCatalog::new();
        catalog
            .register(
                TraitDefinition::new(
                    TraitId::new(1),
                    "Surge",
                    TraitTrigger::PreMove,
                    TraitEffect::additive(EffectTarget::CombatScore, 10.0),
                )
                .with_cost(5.0)
                .with_cooldown(2)
                .with_chance(1.0),
            )
            .unwrap();
        catalog
            .register(
                TraitDefinition::new(
                    TraitId::new(2),
                    "Frenzy",
                    TraitTrigger::PreMove,
                    TraitEffect::flat(EffectTarget::Hp, -3.0),
                )
                .with_cost(2.0)
                .with_category(CostCategory::Extreme)
                .with_chance(1.0),
            )
            .unwrap();
        catalog
    }

    fn unit(catalog: &TraitCatalog) -> Unit {
        let mut u = Unit::new(UnitId::new(1), "Kite", TeamId::new(1), Role::Enforcer);
        for def in catalog.sorted() {
            u = u.with_trait(def);
        }
        u
    }

    #[test]
    fn test_event_matching() {
        let hp = TraitTrigger::HpBelow { percent: 50.0 };
        assert!(TraitEvent::HpDropped { before: 55.0, after: 45.0 }.matches(&hp));
        assert!(!TraitEvent::HpDropped { before: 45.0, after: 40.0 }.matches(&hp));

        let stamina = TraitTrigger::StaminaThreshold {
            boundary: 40.0,
            direction: CrossingDirection::Falling,
        };
        assert!(TraitEvent::StaminaCrossed {
            boundary: 40.0,
            direction: CrossingDirection::Falling
        }
        .matches(&stamina));
        assert!(!TraitEvent::StaminaCrossed {
            boundary: 40.0,
            direction: CrossingDirection::Rising
        }
        .matches(&stamina));
        assert!(!TraitEvent::PreMove.matches(&TraitTrigger::PostMove));
    }

    #[test]
    fn test_triggered_sorted_by_id() {
        let catalog = catalog();
        let mut u = unit(&catalog);
        u.traits.reverse();
        let config = MatchConfig::default();
        let engine = TraitEngine::new(&catalog, &config.traits, &config.fatigue);

        let hits = engine.triggered(&u, &TraitEvent::PreMove);
        let ids: Vec<_> = hits.iter().map(|&i| u.traits[i].trait_id.raw()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(engine.triggered(&u, &TraitEvent::PostMove).is_empty());
    }

    #[test]
    fn test_cost_scaling() {
        let catalog = catalog();
        let config = MatchConfig::default();
        let engine = TraitEngine::new(&catalog, &config.traits, &config.fatigue);
        let def = catalog.get(TraitId::new(1)).unwrap();

        let average = unit(&catalog);
        assert!((engine.stamina_cost(def, 5.0, &average, 1) - 5.0).abs() < 1e-9);
        // 2% per round after the first, capped at 1.2
        assert!((engine.stamina_cost(def, 5.0, &average, 6) - 5.5).abs() < 1e-9);
        assert!((engine.stamina_cost(def, 5.0, &average, 40) - 6.0).abs() < 1e-9);

        let strong_willed = unit(&catalog).with_attributes(Attributes::default().with(AttributeKind::Willpower, 8.0));
        assert!((engine.stamina_cost(def, 5.0, &strong_willed, 1) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_activation_chance_clamped() {
        let catalog = catalog();
        let config = MatchConfig::default();
        let engine = TraitEngine::new(&catalog, &config.traits, &config.fatigue);
        let def = catalog.get(TraitId::new(1)).unwrap();
        let u = unit(&catalog);

        assert_eq!(engine.activation_chance(def, &u, 0.0), 0.95);

        let low = def.clone().with_chance(0.0);
        assert_eq!(engine.activation_chance(&low, &u, 0.0), 0.20);
    }

    #[test]
    fn test_fatigue_lock() {
        let catalog = catalog();
        let config = MatchConfig::default();
        let engine = TraitEngine::new(&catalog, &config.traits, &config.fatigue);

        let tired = unit(&catalog).with_stamina(35.0);
        let frenzy = tired.trait_index(TraitId::new(2)).unwrap();
        assert_eq!(
            engine.eligibility(&tired, frenzy, 1),
            Eligibility::FatigueLocked {
                tier: FatigueTier::Moderate
            }
        );
        let surge = tired.trait_index(TraitId::new(1)).unwrap();
        assert_eq!(engine.eligibility(&tired, surge, 1), Eligibility::Eligible);
    }

    #[test]
    fn test_insufficient_stamina_skips() {
        let catalog = catalog();
        let config = certain();
        let engine = TraitEngine::new(&catalog, &config.traits, &config.fatigue);
        let mut dice = ProbabilityEngine::new(1);

        let mut u = unit(&catalog).with_stamina(4.0);
        let surge = u.trait_index(TraitId::new(1)).unwrap();
        let outcome = engine.resolve(&mut u, surge, 1, 0.0, &mut dice);
        assert!(matches!(
            outcome,
            TraitOutcome::Skipped {
                reason: Eligibility::InsufficientStamina { .. },
                ..
            }
        ));
        assert_eq!(u.stamina, 4.0);
    }

    #[test]
    fn test_activation_applies_and_charges() {
        let catalog = catalog();
        let config = certain();
        let engine = TraitEngine::new(&catalog, &config.traits, &config.fatigue);
        let mut dice = ProbabilityEngine::new(3);

        let mut u = unit(&catalog);
        let frenzy = u.trait_index(TraitId::new(2)).unwrap();
        let TraitOutcome::Activated(activation) = engine.resolve(&mut u, frenzy, 1, 0.0, &mut dice) else {
            panic!("expected activation");
        };

        assert_eq!(u.hp, 97.0);
        assert!((u.stamina - 94.0).abs() < 1e-9); // 2 × extreme 3.0
        assert_eq!(activation.cost, 6.0);
        assert_eq!(u.traits[frenzy].last_activated, Some(1));

        let again = engine.resolve(&mut u, frenzy, 1, 0.0, &mut dice);
        assert!(matches!(
            again,
            TraitOutcome::Skipped {
                reason: Eligibility::AlreadyActivated,
                ..
            }
        ));
    }

    #[test]
    fn test_cooldown_two_rounds() {
        let catalog = catalog();
        let config = certain();
        let engine = TraitEngine::new(&catalog, &config.traits, &config.fatigue);
        let mut dice = ProbabilityEngine::new(8);

        let mut u = unit(&catalog);
        let surge = u.trait_index(TraitId::new(1)).unwrap();

        assert!(matches!(engine.resolve(&mut u, surge, 3, 0.0, &mut dice), TraitOutcome::Activated(_)));
        engine.end_of_round(&mut u, 3);
        assert_eq!(u.traits[surge].phase, TraitPhase::CoolingDown);

        for round in [4, 5] {
            assert!(matches!(
                engine.eligibility(&u, surge, round),
                Eligibility::CoolingDown { .. }
            ));
            engine.end_of_round(&mut u, round);
        }

        assert_eq!(engine.eligibility(&u, surge, 6), Eligibility::Eligible);
        assert_eq!(u.traits[surge].phase, TraitPhase::Idle);
    }

    #[test]
    fn test_invalid_effect_is_inert() {
        let mut catalog = TraitCatalog::new();
        catalog
            .register(
                TraitDefinition::new(
                    TraitId::new(5),
                    "Glitch",
                    TraitTrigger::PostMove,
                    TraitEffect::multiplicative(EffectTarget::Stamina, -2.0),
                )
                .with_chance(1.0),
            )
            .unwrap();
        let config = certain();
        let engine = TraitEngine::new(&catalog, &config.traits, &config.fatigue);
        let mut dice = ProbabilityEngine::new(2);

        let mut u = unit(&catalog);
        let TraitOutcome::Activated(activation) = engine.resolve(&mut u, 0, 1, 0.0, &mut dice) else {
            panic!("expected activation");
        };
        assert!(activation.inert.is_some());
        assert_eq!(u.stamina, 95.0);
    }
}
