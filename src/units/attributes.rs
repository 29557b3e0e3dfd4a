//! Unit attributes.
//!
//! Seven attributes on a 1–10 scale, 5 being league average:
//!
//! | Attribute   | Drives                                       |
//! |-------------|----------------------------------------------|
//! | Strength    | combat score                                 |
//! | Speed       | combat score                                 |
//! | Focus       | combat score, most trait activation chances  |
//! | Leadership  | team synergy (field leader)                  |
//! | Durability  | combat score, damage reduction               |
//! | Resilience  | injury resistance                            |
//! | Willpower   | trait cost reduction, morale stability       |

use serde::{Deserialize, Serialize};

pub const ATTRIBUTE_MIN: f64 = 1.0;
pub const ATTRIBUTE_MAX: f64 = 10.0;
pub const ATTRIBUTE_BASELINE: f64 = 5.0;

/// Attribute selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Strength,
    Speed,
    Focus,
    Leadership,
    Durability,
    Resilience,
    Willpower,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 7] = [
        AttributeKind::Strength,
        AttributeKind::Speed,
        AttributeKind::Focus,
        AttributeKind::Leadership,
        AttributeKind::Durability,
        AttributeKind::Resilience,
        AttributeKind::Willpower,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            AttributeKind::Strength => "strength",
            AttributeKind::Speed => "speed",
            AttributeKind::Focus => "focus",
            AttributeKind::Leadership => "leadership",
            AttributeKind::Durability => "durability",
            AttributeKind::Resilience => "resilience",
            AttributeKind::Willpower => "willpower",
        }
    }
}

/// A unit's base attributes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: f64,
    pub speed: f64,
    pub focus: f64,
    pub leadership: f64,
    pub durability: f64,
    pub resilience: f64,
    pub willpower: f64,
}

impl Default for Attributes {
    fn default() -> Self {
        Self::uniform(ATTRIBUTE_BASELINE)
    }
}

impl Attributes {
    /// All attributes set to `value`.
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            strength: value,
            speed: value,
            focus: value,
            leadership: value,
            durability: value,
            resilience: value,
            willpower: value,
        }
    }

    #[must_use]
    pub fn get(&self, kind: AttributeKind) -> f64 {
        match kind {
            AttributeKind::Strength => self.strength,
            AttributeKind::Speed => self.speed,
            AttributeKind::Focus => self.focus,
            AttributeKind::Leadership => self.leadership,
            AttributeKind::Durability => self.durability,
            AttributeKind::Resilience => self.resilience,
            AttributeKind::Willpower => self.willpower,
        }
    }

    pub fn get_mut(&mut self, kind: AttributeKind) -> &mut f64 {
        match kind {
            AttributeKind::Strength => &mut self.strength,
            AttributeKind::Speed => &mut self.speed,
            AttributeKind::Focus => &mut self.focus,
            AttributeKind::Leadership => &mut self.leadership,
            AttributeKind::Durability => &mut self.durability,
            AttributeKind::Resilience => &mut self.resilience,
            AttributeKind::Willpower => &mut self.willpower,
        }
    }

    /// Set one attribute (builder pattern).
    #[must_use]
    pub fn with(mut self, kind: AttributeKind, value: f64) -> Self {
        *self.get_mut(kind) = value;
        self
    }

    /// Points above (positive) or below (negative) league average.
    #[must_use]
    pub fn deviation(&self, kind: AttributeKind) -> f64 {
        self.get(kind) - ATTRIBUTE_BASELINE
    }

    /// Weighted combat rating on a 0–100 scale.
    #[must_use]
    pub fn combat_base(&self) -> f64 {
        (0.35 * self.strength + 0.25 * self.speed + 0.25 * self.focus + 0.15 * self.durability) * 10.0
    }

    /// First attribute outside `[ATTRIBUTE_MIN, ATTRIBUTE_MAX]`, if any.
    #[must_use]
    pub fn out_of_range(&self) -> Option<(AttributeKind, f64)> {
        AttributeKind::ALL
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
            .find(|(_, value)| !(ATTRIBUTE_MIN..=ATTRIBUTE_MAX).contains(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_baseline() {
        let attrs = Attributes::default();
        for kind in AttributeKind::ALL {
            assert_eq!(attrs.get(kind), ATTRIBUTE_BASELINE);
            assert_eq!(attrs.deviation(kind), 0.0);
        }
    }

    #[test]
    fn test_with_builder() {
        let attrs = Attributes::default()
            .with(AttributeKind::Strength, 8.0)
            .with(AttributeKind::Willpower, 2.0);
        assert_eq!(attrs.strength, 8.0);
        assert_eq!(attrs.deviation(AttributeKind::Willpower), -3.0);
    }

    #[test]
    fn test_combat_base() {
        assert!((Attributes::default().combat_base() - 50.0).abs() < 1e-9);
        assert!((Attributes::uniform(10.0).combat_base() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(Attributes::default().out_of_range(), None);
        let bad = Attributes::default().with(AttributeKind::Focus, 11.0);
        assert_eq!(bad.out_of_range(), Some((AttributeKind::Focus, 11.0)));
    }
}
