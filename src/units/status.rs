//! Timed status effects left behind by trait activations.

use serde::{Deserialize, Serialize};

use crate::traits::{EffectTarget, FormulaKind, TraitId};

/// A modifier that stays on a unit for a number of rounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub source: TraitId,
    pub target: EffectTarget,
    pub kind: FormulaKind,
    pub value: f64,
    /// End-of-round ticks left before the effect expires.
    pub remaining_rounds: u32,
}

/// All status effects on a unit, in application order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    effects: Vec<StatusEffect>,
}

impl StatusEffects {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: StatusEffect) {
        self.effects.push(effect);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    /// Apply every effect on `target` to `base`.
    ///
    /// Flat values are added first, additive percentages are summed and
    /// applied once, multiplicative factors are applied last.
    #[must_use]
    pub fn modify(&self, target: EffectTarget, base: f64) -> f64 {
        let mut flat = 0.0;
        let mut percent = 0.0;
        let mut factor = 1.0;
        for effect in self.effects.iter().filter(|e| e.target == target) {
            match effect.kind {
                FormulaKind::Flat => flat += effect.value,
                FormulaKind::Additive => percent += effect.value,
                FormulaKind::Multiplicative => factor *= effect.value,
            }
        }
        (base + flat) * (1.0 + percent / 100.0) * factor
    }

    /// Count down one round and remove expired effects.
    pub fn tick(&mut self) -> Vec<StatusEffect> {
        for effect in &mut self.effects {
            effect.remaining_rounds = effect.remaining_rounds.saturating_sub(1);
        }
        let (expired, active): (Vec<_>, Vec<_>) = std::mem::take(&mut self.effects)
            .into_iter()
            .partition(|e| e.remaining_rounds == 0);
        self.effects = active;
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(target: EffectTarget, kind: FormulaKind, value: f64, rounds: u32) -> StatusEffect {
        StatusEffect {
            source: TraitId::new(1),
            target,
            kind,
            value,
            remaining_rounds: rounds,
        }
    }

    #[test]
    fn test_modify_order() {
        let mut status = StatusEffects::new();
        status.push(effect(EffectTarget::CombatScore, FormulaKind::Multiplicative, 2.0, 1));
        status.push(effect(EffectTarget::CombatScore, FormulaKind::Flat, 10.0, 1));
        status.push(effect(EffectTarget::CombatScore, FormulaKind::Additive, 50.0, 1));

        // (40 + 10) * 1.5 * 2
        assert!((status.modify(EffectTarget::CombatScore, 40.0) - 150.0).abs() < 1e-9);
        assert_eq!(status.modify(EffectTarget::DamageTaken, 1.0), 1.0);
    }

    #[test]
    fn test_tick_expires() {
        let mut status = StatusEffects::new();
        status.push(effect(EffectTarget::DamageDealt, FormulaKind::Additive, 15.0, 1));
        status.push(effect(EffectTarget::DamageTaken, FormulaKind::Additive, -10.0, 2));

        let expired = status.tick();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].target, EffectTarget::DamageDealt);
        assert_eq!(status.len(), 1);

        assert_eq!(status.tick().len(), 1);
        assert!(status.is_empty());
    }
}
