//! Trait definitions.
//!
//! A trait couples a trigger with an effect:
//!
//! - `TraitTrigger`: the match moment the trait listens for
//! - `TraitEffect`: what happens when it activates, as a tagged formula
//!   (`Additive` percent, `Multiplicative` factor, or `Flat` amount) applied
//!   to an `EffectTarget`
//!
//! Formulas written as text (`"+15%"`, `"-10"`, `"x1.5"`) are parsed once at
//! catalog load by `TraitEffect::parse`; the engine never sees strings.

use serde::{Deserialize, Serialize};

use crate::core::ValidationError;
use crate::units::{AttributeKind, CrossingDirection};

/// Unique identifier for a trait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TraitId(pub u32);

impl TraitId {
    /// Create a new trait ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TraitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trait({})", self.0)
    }
}

/// Events a teammate can experience that allies' traits react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllyEventKind {
    KnockedOut,
    ConvergenceWon,
    ConvergenceLost,
}

/// When a trait is considered for activation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TraitTrigger {
    RoundStart,
    PreMove,
    PostMove,
    /// HP drops below this percentage of maximum.
    HpBelow { percent: f64 },
    /// Stamina crosses a fatigue boundary in the given direction.
    StaminaThreshold {
        boundary: f64,
        direction: CrossingDirection,
    },
    AllyEvent(AllyEventKind),
    /// The owner is about to contest a convergence.
    Convergence,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormulaKind {
    /// Percentage of the current value (`+15%`).
    Additive,
    /// Factor on the current value (`x1.5`).
    Multiplicative,
    /// Absolute amount (`-10`).
    Flat,
}

/// What an effect changes.
///
/// `Hp`, `Stamina` and `Morale` are changed immediately. The others become
/// timed status modifiers on the unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectTarget {
    Hp,
    Stamina,
    Morale,
    CombatScore,
    DamageDealt,
    DamageTaken,
    ActivationChance,
    XpGain,
    Attribute(AttributeKind),
}

impl EffectTarget {
    /// Applied once to a resource rather than held as a status.
    #[must_use]
    pub const fn is_resource(self) -> bool {
        matches!(self, EffectTarget::Hp | EffectTarget::Stamina | EffectTarget::Morale)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraitEffect {
    pub kind: FormulaKind,
    pub target: EffectTarget,
    pub value: f64,
    /// Rounds a status modifier lasts. Ignored for resource targets.
    pub duration: u32,
}

impl TraitEffect {
    #[must_use]
    pub const fn flat(target: EffectTarget, value: f64) -> Self {
        Self {
            kind: FormulaKind::Flat,
            target,
            value,
            duration: 1,
        }
    }

    #[must_use]
    pub const fn additive(target: EffectTarget, percent: f64) -> Self {
        Self {
            kind: FormulaKind::Additive,
            target,
            value: percent,
            duration: 1,
        }
    }

    #[must_use]
    pub const fn multiplicative(target: EffectTarget, factor: f64) -> Self {
        Self {
            kind: FormulaKind::Multiplicative,
            target,
            value: factor,
            duration: 1,
        }
    }

    /// Set the status duration (builder pattern).
    #[must_use]
    pub const fn for_rounds(mut self, rounds: u32) -> Self {
        self.duration = rounds;
        self
    }

    /// Parse a text formula.
    ///
    /// ```
    /// use meta_league::traits::{EffectTarget, FormulaKind, TraitEffect};
    ///
    /// let effect = TraitEffect::parse("+15%", EffectTarget::DamageDealt).unwrap();
    /// assert_eq!(effect.kind, FormulaKind::Additive);
    /// assert_eq!(effect.value, 15.0);
    ///
    /// assert_eq!(TraitEffect::parse("x1.5", EffectTarget::CombatScore).unwrap().kind, FormulaKind::Multiplicative);
    /// assert_eq!(TraitEffect::parse("-10", EffectTarget::Hp).unwrap().value, -10.0);
    /// assert!(TraitEffect::parse("lots", EffectTarget::Hp).is_err());
    /// ```
    pub fn parse(formula: &str, target: EffectTarget) -> Result<Self, ValidationError> {
        let text = formula.trim();
        let invalid = |reason: &str| ValidationError::TraitFormula {
            formula: formula.to_string(),
            reason: reason.to_string(),
        };
        let number = |s: &str| -> Result<f64, ValidationError> {
            let value: f64 = s
                .trim()
                .parse()
                .map_err(|_| invalid("expected a number"))?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(invalid("value must be finite"))
            }
        };

        if text.is_empty() {
            return Err(invalid("empty formula"));
        }

        let factor = text
            .strip_prefix('x')
            .or_else(|| text.strip_prefix('X'))
            .or_else(|| text.strip_prefix('*'))
            .or_else(|| text.strip_prefix('×'));
        if let Some(rest) = factor {
            let value = number(rest)?;
            if value <= 0.0 {
                return Err(invalid("factor must be positive"));
            }
            return Ok(Self::multiplicative(target, value));
        }

        if let Some(rest) = text.strip_suffix('%') {
            return Ok(Self::additive(target, number(rest)?));
        }

        Ok(Self::flat(target, number(text)?))
    }
}

/// Stamina cost band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum CostCategory {
    Low,
    #[default]
    Medium,
    High,
    Extreme,
}

/// A trait as defined in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraitDefinition {
    pub id: TraitId,
    pub name: String,
    pub trigger: TraitTrigger,
    pub effect: TraitEffect,
    /// Base stamina cost, scaled by category, willpower and round.
    pub stamina_cost: f64,
    pub category: CostCategory,
    /// Whole rounds the trait is unavailable after the activation round.
    pub cooldown: u32,
    /// Activation chance for an average unit, in `[0, 1]`.
    pub base_chance: f64,
    /// Attribute that shifts the activation chance.
    pub attribute: AttributeKind,
}

impl TraitDefinition {
    pub fn new(id: TraitId, name: impl Into<String>, trigger: TraitTrigger, effect: TraitEffect) -> Self {
        Self {
            id,
            name: name.into(),
            trigger,
            effect,
            stamina_cost: 5.0,
            category: CostCategory::Medium,
            cooldown: 0,
            base_chance: 0.5,
            attribute: AttributeKind::Focus,
        }
    }

    /// Set the base stamina cost (builder pattern).
    #[must_use]
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.stamina_cost = cost;
        self
    }

    /// Set the cost category (builder pattern).
    #[must_use]
    pub fn with_category(mut self, category: CostCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the cooldown (builder pattern).
    #[must_use]
    pub fn with_cooldown(mut self, rounds: u32) -> Self {
        self.cooldown = rounds;
        self
    }

    /// Set the base activation chance (builder pattern).
    #[must_use]
    pub fn with_chance(mut self, chance: f64) -> Self {
        self.base_chance = chance;
        self
    }

    /// Set the governing attribute (builder pattern).
    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeKind) -> Self {
        self.attribute = attribute;
        self
    }
}

fn default_duration() -> u32 {
    1
}

fn default_cost() -> f64 {
    5.0
}

fn default_chance() -> f64 {
    0.5
}

fn default_attribute() -> AttributeKind {
    AttributeKind::Focus
}

/// Trait definition as written in a data file, with a text formula.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraitSpec {
    pub id: u32,
    pub name: String,
    pub trigger: TraitTrigger,
    pub target: EffectTarget,
    pub formula: String,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default = "default_cost")]
    pub stamina_cost: f64,
    #[serde(default)]
    pub category: CostCategory,
    #[serde(default)]
    pub cooldown: u32,
    #[serde(default = "default_chance")]
    pub base_chance: f64,
    #[serde(default = "default_attribute")]
    pub attribute: AttributeKind,
}

impl TraitSpec {
    /// Parse the formula and check ranges.
    pub fn into_definition(self) -> Result<TraitDefinition, ValidationError> {
        let effect = TraitEffect::parse(&self.formula, self.target)?.for_rounds(self.duration);
        if !effect.target.is_resource() && effect.duration == 0 {
            return Err(ValidationError::TraitFormula {
                formula: self.formula,
                reason: "status effects need a duration of at least one round".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.base_chance) {
            return Err(ValidationError::InvalidConfig(format!(
                "trait {} base_chance {} is outside [0, 1]",
                self.name, self.base_chance
            )));
        }
        if !self.stamina_cost.is_finite() || self.stamina_cost < 0.0 {
            return Err(ValidationError::InvalidConfig(format!(
                "trait {} stamina_cost must be a non-negative number",
                self.name
            )));
        }

        Ok(TraitDefinition {
            id: TraitId::new(self.id),
            name: self.name,
            trigger: self.trigger,
            effect,
            stamina_cost: self.stamina_cost,
            category: self.category,
            cooldown: self.cooldown,
            base_chance: self.base_chance,
            attribute: self.attribute,
        })
    }
}
