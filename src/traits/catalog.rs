//! Trait catalog for definition lookup.
//!
//! The `TraitCatalog` stores every trait definition a match may reference.
//! It is built once, validated, shared read-only by all matches of a day.

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::core::{MatchError, ValidationError};
use crate::units::{AttributeKind, CrossingDirection};

use super::definition::{
    AllyEventKind, CostCategory, EffectTarget, TraitDefinition, TraitEffect, TraitId, TraitSpec,
    TraitTrigger,
};

/// Registry of trait definitions.
///
/// ## Example
///
/// ```
/// use meta_league::traits::{EffectTarget, TraitCatalog, TraitDefinition, TraitEffect, TraitId, TraitTrigger};
///
/// let mut catalog = TraitCatalog::new();
/// let steady = TraitDefinition::new(
///     TraitId::new(1),
///     "Steady",
///     TraitTrigger::PreMove,
///     TraitEffect::additive(EffectTarget::CombatScore, 10.0),
/// );
/// catalog.register(steady).unwrap();
///
/// assert_eq!(catalog.get(TraitId::new(1)).unwrap().name, "Steady");
/// let again = catalog.get(TraitId::new(1)).unwrap().clone();
/// assert!(catalog.register(again).is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct TraitCatalog {
    traits: FxHashMap<TraitId, TraitDefinition>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    traits: Vec<TraitSpec>,
}

impl TraitCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Ids must be unique.
    pub fn register(&mut self, def: TraitDefinition) -> Result<(), ValidationError> {
        if self.traits.contains_key(&def.id) {
            return Err(ValidationError::DuplicateTrait(def.id));
        }
        self.traits.insert(def.id, def);
        Ok(())
    }

    /// Build a catalog from data-file specs, parsing every formula.
    pub fn from_specs(specs: impl IntoIterator<Item = TraitSpec>) -> Result<Self, ValidationError> {
        let mut catalog = Self::new();
        for spec in specs {
            catalog.register(spec.into_definition()?)?;
        }
        Ok(catalog)
    }

    /// Parse a TOML document with a `[[traits]]` array.
    pub fn from_toml_str(text: &str) -> Result<Self, MatchError> {
        let file: CatalogFile = toml::from_str(text)?;
        Ok(Self::from_specs(file.traits)?)
    }

    #[must_use]
    pub fn get(&self, id: TraitId) -> Option<&TraitDefinition> {
        self.traits.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: TraitId) -> bool {
        self.traits.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.traits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    /// All definitions, ordered by id.
    #[must_use]
    pub fn sorted(&self) -> Vec<&TraitDefinition> {
        let mut defs: Vec<_> = self.traits.values().collect();
        defs.sort_by_key(|d| d.id);
        defs
    }

    /// Find a definition by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&TraitDefinition> {
        self.traits.values().find(|d| d.name == name)
    }

    /// The league's standard trait set.
    #[must_use]
    pub fn standard() -> Self {
        let defs = [
            TraitDefinition::new(
                TraitId::new(1),
                "Regenerative Core",
                TraitTrigger::RoundStart,
                TraitEffect::flat(EffectTarget::Hp, 4.0),
            )
            .with_cost(4.0)
            .with_category(CostCategory::Low)
            .with_cooldown(1)
            .with_attribute(AttributeKind::Durability),
            TraitDefinition::new(
                TraitId::new(2),
                "Berserker",
                TraitTrigger::HpBelow { percent: 50.0 },
                TraitEffect::additive(EffectTarget::DamageDealt, 25.0).for_rounds(2),
            )
            .with_cost(6.0)
            .with_category(CostCategory::High)
            .with_cooldown(3)
            .with_chance(0.6)
            .with_attribute(AttributeKind::Strength),
            TraitDefinition::new(
                TraitId::new(3),
                "Tactician",
                TraitTrigger::PreMove,
                TraitEffect::additive(EffectTarget::CombatScore, 10.0),
            )
            .with_cooldown(2)
            .with_chance(0.4),
            TraitDefinition::new(
                TraitId::new(4),
                "Shield Wall",
                TraitTrigger::Convergence,
                TraitEffect::additive(EffectTarget::DamageTaken, -20.0),
            )
            .with_cooldown(1)
            .with_attribute(AttributeKind::Durability),
            TraitDefinition::new(
                TraitId::new(5),
                "Second Wind",
                TraitTrigger::StaminaThreshold {
                    boundary: 40.0,
                    direction: CrossingDirection::Falling,
                },
                TraitEffect::flat(EffectTarget::Stamina, 12.0),
            )
            .with_cost(0.0)
            .with_category(CostCategory::Low)
            .with_cooldown(4)
            .with_chance(0.6)
            .with_attribute(AttributeKind::Willpower),
            TraitDefinition::new(
                TraitId::new(6),
                "Rally",
                TraitTrigger::AllyEvent(AllyEventKind::KnockedOut),
                TraitEffect::flat(EffectTarget::Morale, 10.0),
            )
            .with_cost(2.0)
            .with_category(CostCategory::Low)
            .with_cooldown(2)
            .with_attribute(AttributeKind::Leadership),
            TraitDefinition::new(
                TraitId::new(7),
                "Coward",
                TraitTrigger::Convergence,
                TraitEffect::multiplicative(EffectTarget::CombatScore, 0.8),
            )
            .with_cost(0.0)
            .with_category(CostCategory::Low)
            .with_attribute(AttributeKind::Resilience),
            TraitDefinition::new(
                TraitId::new(8),
                "Adrenaline Surge",
                TraitTrigger::StaminaThreshold {
                    boundary: 20.0,
                    direction: CrossingDirection::Falling,
                },
                TraitEffect::additive(EffectTarget::CombatScore, 20.0).for_rounds(2),
            )
            .with_cost(4.0)
            .with_cooldown(5)
            .with_attribute(AttributeKind::Willpower),
            TraitDefinition::new(
                TraitId::new(9),
                "Focus Lock",
                TraitTrigger::PostMove,
                TraitEffect::flat(EffectTarget::Attribute(AttributeKind::Focus), 1.0).for_rounds(2),
            )
            .with_cooldown(2)
            .with_chance(0.35),
            TraitDefinition::new(
                TraitId::new(10),
                "Vengeance",
                TraitTrigger::AllyEvent(AllyEventKind::ConvergenceLost),
                TraitEffect::additive(EffectTarget::DamageDealt, 15.0).for_rounds(2),
            )
            .with_category(CostCategory::High)
            .with_cooldown(2)
            .with_attribute(AttributeKind::Strength),
        ];

        let mut catalog = Self::new();
        for def in defs {
            catalog.traits.insert(def.id, def);
        }
        catalog
    }
}
