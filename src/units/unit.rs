//! Unit state and its mutators.
//!
//! Every change to HP, stamina or morale goes through a method on `Unit` so
//! the clamping and knockout rules hold no matter which subsystem caused it:
//!
//! - stamina and morale stay within `[0, 100]`, HP within `[0, 100]`
//! - a unit is dead once HP ≤ 5, stamina = 0, or its life counter is 0
//! - the mutator that makes a unit dead marks it knocked out immediately,
//!   recording the round

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{FatigueTable, TeamId, UnitId};
use crate::traits::{EffectTarget, TraitDefinition, TraitId};

use super::attributes::{AttributeKind, Attributes, ATTRIBUTE_MAX, ATTRIBUTE_MIN};
use super::role::{Division, Role};
use super::status::StatusEffects;

/// Upper bound of HP, stamina and morale.
pub const MAX_STAT: f64 = 100.0;

/// HP at or below which a unit is knocked out.
pub const KNOCKOUT_HP: f64 = 5.0;

/// Morale a freshly loaded unit starts with.
pub const DEFAULT_MORALE: f64 = 70.0;

/// Fatigue band derived from current stamina.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FatigueTier {
    Fresh,
    Minor,
    Moderate,
    Severe,
}

impl FatigueTier {
    #[must_use]
    pub fn from_stamina(stamina: f64, table: &FatigueTable) -> Self {
        if stamina <= table.severe {
            FatigueTier::Severe
        } else if stamina <= table.moderate {
            FatigueTier::Moderate
        } else if stamina <= table.minor {
            FatigueTier::Minor
        } else {
            FatigueTier::Fresh
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossingDirection {
    /// Stamina dropped from above the boundary to at or below it.
    Falling,
    /// Stamina rose from at or below the boundary to above it.
    Rising,
}

/// Why stamina changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaminaReason {
    Decay,
    Recovery,
    TraitCost,
    TraitEffect,
}

/// One fatigue boundary crossed by a single stamina adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCrossing {
    pub unit: UnitId,
    pub boundary: f64,
    pub direction: CrossingDirection,
    pub stamina: f64,
    pub reason: StaminaReason,
}

/// Result of `Unit::adjust_stamina`.
#[derive(Clone, Debug, PartialEq)]
pub struct StaminaChange {
    pub before: f64,
    pub after: f64,
    /// Boundaries crossed, in the order stamina travelled through them.
    pub crossings: SmallVec<[ThresholdCrossing; 3]>,
    /// This adjustment knocked the unit out.
    pub knocked_out: bool,
}

impl StaminaChange {
    fn unchanged(value: f64) -> Self {
        Self {
            before: value,
            after: value,
            crossings: SmallVec::new(),
            knocked_out: false,
        }
    }
}

/// Result of `Unit::apply_damage`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageReport {
    pub hp_before: f64,
    pub hp_after: f64,
    /// This damage knocked the unit out.
    pub knocked_out: bool,
}

/// Where a trait instance is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TraitPhase {
    #[default]
    Idle,
    Activated,
    CoolingDown,
}

/// A trait owned by a unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraitInstance {
    pub trait_id: TraitId,
    /// Base stamina cost before category and round scaling.
    pub stamina_cost: f64,
    pub cooldown_remaining: u32,
    pub phase: TraitPhase,
    pub last_activated: Option<u32>,
    pub activations: u32,
}

impl TraitInstance {
    #[must_use]
    pub fn new(trait_id: TraitId, stamina_cost: f64) -> Self {
        Self {
            trait_id,
            stamina_cost,
            cooldown_remaining: 0,
            phase: TraitPhase::Idle,
            last_activated: None,
            activations: 0,
        }
    }

    #[must_use]
    pub fn from_definition(def: &TraitDefinition) -> Self {
        Self::new(def.id, def.stamina_cost)
    }

    #[must_use]
    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_remaining > 0
    }

    #[must_use]
    pub fn activated_in(&self, round: u32) -> bool {
        self.last_activated == Some(round)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InjurySeverity {
    Minor,
    Moderate,
    Severe,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Injury {
    pub severity: InjurySeverity,
    pub round: u32,
    /// Matches the unit sits out.
    pub recovery_matches: u32,
}

/// A single participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub team_id: TeamId,
    pub role: Role,
    pub division: Division,
    pub attributes: Attributes,
    pub hp: f64,
    pub stamina: f64,
    pub morale: f64,
    /// Remaining lives; 0 means dead.
    pub life: u8,
    pub knocked_out: bool,
    pub knockout_round: Option<u32>,
    /// Resigned its board due to fatigue; inactive but not knocked out.
    pub resigned: bool,
    pub traits: Vec<TraitInstance>,
    pub status: StatusEffects,
    pub xp: u32,
    pub level: u8,
    pub xp_earned: u32,
    pub convergences: u32,
    pub injuries: Vec<Injury>,
}

impl Unit {
    /// Create a fresh unit at full HP and stamina.
    pub fn new(id: UnitId, name: impl Into<String>, team_id: TeamId, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            team_id,
            role,
            division: role.division(),
            attributes: Attributes::default(),
            hp: MAX_STAT,
            stamina: MAX_STAT,
            morale: DEFAULT_MORALE,
            life: 1,
            knocked_out: false,
            knockout_round: None,
            resigned: false,
            traits: Vec::new(),
            status: StatusEffects::new(),
            xp: 0,
            level: 1,
            xp_earned: 0,
            convergences: 0,
            injuries: Vec::new(),
        }
    }

    /// Set attributes (builder pattern).
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Add a trait instance using the definition's base cost (builder pattern).
    #[must_use]
    pub fn with_trait(mut self, def: &TraitDefinition) -> Self {
        self.traits.push(TraitInstance::from_definition(def));
        self
    }

    /// Set starting stamina (builder pattern).
    #[must_use]
    pub fn with_stamina(mut self, stamina: f64) -> Self {
        self.stamina = stamina;
        self
    }

    /// Set starting HP (builder pattern).
    #[must_use]
    pub fn with_hp(mut self, hp: f64) -> Self {
        self.hp = hp;
        self
    }

    /// Set starting morale (builder pattern).
    #[must_use]
    pub fn with_morale(mut self, morale: f64) -> Self {
        self.morale = morale;
        self
    }

    /// Override the division (builder pattern). Lineup validation rejects
    /// divisions that do not match the role.
    #[must_use]
    pub fn with_division(mut self, division: Division) -> Self {
        self.division = division;
        self
    }

    /// Set accumulated XP (builder pattern).
    #[must_use]
    pub fn with_xp(mut self, xp: u32) -> Self {
        self.xp = xp;
        self
    }

    /// Dead predicate. Pure.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.hp <= KNOCKOUT_HP || self.stamina <= 0.0 || self.life == 0
    }

    /// Still playing its board.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.knocked_out && !self.resigned
    }

    #[must_use]
    pub fn fatigue_tier(&self, table: &FatigueTable) -> FatigueTier {
        FatigueTier::from_stamina(self.stamina, table)
    }

    /// Attribute after status modifiers, kept on the 1–10 scale.
    #[must_use]
    pub fn effective_attribute(&self, kind: AttributeKind) -> f64 {
        self.status
            .modify(EffectTarget::Attribute(kind), self.attributes.get(kind))
            .clamp(ATTRIBUTE_MIN, ATTRIBUTE_MAX)
    }

    /// Mark the unit knocked out. Returns `false` if it already was.
    pub fn mark_knockout(&mut self, round: u32) -> bool {
        if self.knocked_out {
            return false;
        }
        self.knocked_out = true;
        self.knockout_round = Some(round);
        true
    }

    fn check_knockout(&mut self, round: u32) -> bool {
        self.is_dead() && self.mark_knockout(round)
    }

    /// Remove HP, never below 0.
    pub fn apply_damage(&mut self, amount: f64, round: u32) -> DamageReport {
        let hp_before = self.hp;
        if amount.is_finite() && amount > 0.0 {
            self.hp = (self.hp - amount).max(0.0);
        }
        DamageReport {
            hp_before,
            hp_after: self.hp,
            knocked_out: self.check_knockout(round),
        }
    }

    /// Restore HP up to the cap. Knocked-out units are not revived.
    pub fn heal(&mut self, amount: f64) -> f64 {
        if self.knocked_out || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.hp;
        self.hp = (self.hp + amount).min(MAX_STAT);
        self.hp - before
    }

    /// Change stamina, clamped to `[0, 100]`.
    ///
    /// Reports every fatigue boundary crossed exactly once, in travel order.
    /// Movement that stays within a band reports nothing. Knocked-out units
    /// are left untouched.
    pub fn adjust_stamina(
        &mut self,
        delta: f64,
        reason: StaminaReason,
        round: u32,
        boundaries: &[f64; 3],
    ) -> StaminaChange {
        if self.knocked_out || !delta.is_finite() {
            return StaminaChange::unchanged(self.stamina);
        }

        let before = self.stamina;
        let after = (before + delta).clamp(0.0, MAX_STAT);
        self.stamina = after;

        let mut crossings = SmallVec::new();
        if after < before {
            for &boundary in boundaries {
                if before > boundary && after <= boundary {
                    crossings.push(self.crossing(boundary, CrossingDirection::Falling, reason));
                }
            }
        } else if after > before {
            for &boundary in boundaries.iter().rev() {
                if before <= boundary && after > boundary {
                    crossings.push(self.crossing(boundary, CrossingDirection::Rising, reason));
                }
            }
        }

        StaminaChange {
            before,
            after,
            crossings,
            knocked_out: self.check_knockout(round),
        }
    }

    fn crossing(&self, boundary: f64, direction: CrossingDirection, reason: StaminaReason) -> ThresholdCrossing {
        ThresholdCrossing {
            unit: self.id,
            boundary,
            direction,
            stamina: self.stamina,
            reason,
        }
    }

    /// Change morale, clamped to `[0, 100]`. Returns the applied delta.
    pub fn adjust_morale(&mut self, delta: f64) -> f64 {
        if !delta.is_finite() {
            return 0.0;
        }
        let before = self.morale;
        self.morale = (self.morale + delta).clamp(0.0, MAX_STAT);
        self.morale - before
    }

    /// Index of the trait instance with `trait_id`.
    #[must_use]
    pub fn trait_index(&self, trait_id: TraitId) -> Option<usize> {
        self.traits.iter().position(|t| t.trait_id == trait_id)
    }

    /// Number of traits currently cooling down.
    #[must_use]
    pub fn cooling_traits(&self) -> usize {
        self.traits.iter().filter(|t| t.is_cooling_down()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: [f64; 3] = [60.0, 40.0, 20.0];

    fn unit() -> Unit {
        Unit::new(UnitId::new(1), "Vega", TeamId::new(1), Role::Vanguard)
    }

    #[test]
    fn test_new_unit_defaults() {
        let u = unit();
        assert_eq!(u.hp, 100.0);
        assert_eq!(u.stamina, 100.0);
        assert_eq!(u.division, Division::Operations);
        assert!(u.is_active());
        assert!(!u.is_dead());
    }

    #[test]
    fn test_dead_predicate() {
        assert!(unit().with_hp(5.0).is_dead());
        assert!(!unit().with_hp(5.1).is_dead());
        assert!(unit().with_stamina(0.0).is_dead());

        let mut u = unit();
        u.life = 0;
        assert!(u.is_dead());
    }

    #[test]
    fn test_damage_clamps_and_knocks_out() {
        let mut u = unit();
        let report = u.apply_damage(96.0, 4);
        assert_eq!(report.hp_after, 4.0);
        assert!(report.knocked_out);
        assert!(u.knocked_out);
        assert_eq!(u.knockout_round, Some(4));

        let again = u.apply_damage(50.0, 5);
        assert_eq!(again.hp_after, 0.0);
        assert!(!again.knocked_out);
        assert_eq!(u.knockout_round, Some(4));
    }

    #[test]
    fn test_negative_damage_is_ignored() {
        let mut u = unit().with_hp(50.0);
        u.apply_damage(-10.0, 1);
        assert_eq!(u.hp, 50.0);
    }

    #[test]
    fn test_heal_caps() {
        let mut u = unit().with_hp(95.0);
        assert_eq!(u.heal(20.0), 5.0);
        assert_eq!(u.hp, 100.0);
    }

    #[test]
    fn test_stamina_single_crossing() {
        let mut u = unit().with_stamina(62.0);
        let change = u.adjust_stamina(-4.0, StaminaReason::Decay, 1, &BOUNDS);
        assert_eq!(change.after, 58.0);
        assert_eq!(change.crossings.len(), 1);
        assert_eq!(change.crossings[0].boundary, 60.0);
        assert_eq!(change.crossings[0].direction, CrossingDirection::Falling);
    }

    #[test]
    fn test_stamina_within_band_is_silent() {
        let mut u = unit().with_stamina(55.0);
        let change = u.adjust_stamina(-10.0, StaminaReason::Decay, 1, &BOUNDS);
        assert_eq!(change.after, 45.0);
        assert!(change.crossings.is_empty());
    }

    #[test]
    fn test_stamina_landing_on_boundary_counts() {
        let mut u = unit().with_stamina(41.0);
        let change = u.adjust_stamina(-1.0, StaminaReason::Decay, 1, &BOUNDS);
        assert_eq!(change.crossings.len(), 1);
        assert_eq!(change.crossings[0].boundary, 40.0);

        // Rising off the boundary crosses it back.
        let change = u.adjust_stamina(0.5, StaminaReason::Recovery, 1, &BOUNDS);
        assert_eq!(change.crossings.len(), 1);
        assert_eq!(change.crossings[0].direction, CrossingDirection::Rising);
    }

    #[test]
    fn test_stamina_multi_crossing_order() {
        let mut u = unit().with_stamina(70.0);
        let change = u.adjust_stamina(-55.0, StaminaReason::TraitCost, 2, &BOUNDS);
        let bounds: Vec<_> = change.crossings.iter().map(|c| c.boundary).collect();
        assert_eq!(bounds, vec![60.0, 40.0, 20.0]);

        let change = u.adjust_stamina(80.0, StaminaReason::Recovery, 2, &BOUNDS);
        let bounds: Vec<_> = change.crossings.iter().map(|c| c.boundary).collect();
        assert_eq!(bounds, vec![20.0, 40.0, 60.0]);
        assert_eq!(change.after, 100.0);
    }

    #[test]
    fn test_stamina_zero_knocks_out() {
        let mut u = unit().with_stamina(3.0);
        let change = u.adjust_stamina(-10.0, StaminaReason::Decay, 7, &BOUNDS);
        assert_eq!(change.after, 0.0);
        assert!(change.knocked_out);
        assert_eq!(u.knockout_round, Some(7));

        let after_ko = u.adjust_stamina(50.0, StaminaReason::Recovery, 8, &BOUNDS);
        assert_eq!(after_ko.after, 0.0);
    }

    #[test]
    fn test_morale_clamps() {
        let mut u = unit().with_morale(95.0);
        assert_eq!(u.adjust_morale(10.0), 5.0);
        assert_eq!(u.adjust_morale(-150.0), -100.0);
        assert_eq!(u.morale, 0.0);
        assert_eq!(u.adjust_morale(f64::NAN), 0.0);
    }

    #[test]
    fn test_fatigue_tiers() {
        let table = FatigueTable::default();
        assert_eq!(FatigueTier::from_stamina(61.0, &table), FatigueTier::Fresh);
        assert_eq!(FatigueTier::from_stamina(60.0, &table), FatigueTier::Minor);
        assert_eq!(FatigueTier::from_stamina(40.0, &table), FatigueTier::Moderate);
        assert_eq!(FatigueTier::from_stamina(12.0, &table), FatigueTier::Severe);
    }
}
