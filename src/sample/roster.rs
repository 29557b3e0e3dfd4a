//! Sample rosters.

use crate::core::{TeamId, UnitId};
use crate::traits::{TraitCatalog, TraitId};
use crate::units::{AttributeKind, Attributes, Role, Team, Unit, ACTIVE_ROSTER_SIZE};

/// Roster slots of a sample team. Slot 0 is always the field leader.
pub const SAMPLE_ROLES: [Role; ACTIVE_ROSTER_SIZE] = [
    Role::FieldLeader,
    Role::Vanguard,
    Role::Enforcer,
    Role::Ranger,
    Role::GhostOperative,
    Role::PsiOperative,
    Role::Sovereign,
    Role::Vanguard,
];

/// Standard trait ids handed to each slot.
const SLOT_TRAITS: [&[u32]; ACTIVE_ROSTER_SIZE] = [&[6, 3], &[4], &[2], &[9], &[5], &[8], &[1], &[10]];

/// Builder for a sample team.
pub struct TeamBuilder {
    team_id: u32,
    name: String,
    traits: bool,
    attributes: Option<Attributes>,
}

impl TeamBuilder {
    pub fn new(team_id: u32, name: impl Into<String>) -> Self {
        Self {
            team_id,
            name: name.into(),
            traits: true,
            attributes: None,
        }
    }

    /// Give no unit any trait.
    #[must_use]
    pub fn without_traits(mut self) -> Self {
        self.traits = false;
        self
    }

    /// Use the same attributes for every unit instead of role profiles.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Build the team. Unit ids are `team_id * 100 + slot`.
    ///
    /// Trait ids missing from `catalog` are skipped.
    pub fn build(self, catalog: &TraitCatalog) -> Team {
        let team = TeamId::new(self.team_id);
        let units = SAMPLE_ROLES
            .iter()
            .zip(SLOT_TRAITS)
            .enumerate()
            .map(|(slot, (&role, trait_ids))| {
                let id = UnitId::new(self.team_id * 100 + slot as u32);
                let name = format!("{} {} {}", self.name, role.code(), slot);
                let attributes = self.attributes.unwrap_or_else(|| profile(role));
                let mut unit = Unit::new(id, name, team, role).with_attributes(attributes);
                if self.traits {
                    for def in trait_ids.iter().filter_map(|&t| catalog.get(TraitId::new(t))) {
                        unit = unit.with_trait(def);
                    }
                }
                unit
            })
            .collect();
        Team::new(team, self.name, units)
    }
}

/// Role attribute profile: league average with the role's strengths raised.
fn profile(role: Role) -> Attributes {
    use AttributeKind::*;

    let base = Attributes::default();
    match role {
        Role::FieldLeader => base.with(Leadership, 8.0).with(Willpower, 6.0),
        Role::Vanguard => base.with(Durability, 7.0).with(Strength, 6.0),
        Role::Enforcer => base.with(Strength, 7.5).with(Resilience, 6.0),
        Role::Ranger => base.with(Speed, 7.5).with(Focus, 6.0),
        Role::GhostOperative => base.with(Speed, 6.5).with(Focus, 6.5),
        Role::PsiOperative => base.with(Focus, 7.5).with(Willpower, 6.5),
        Role::Sovereign => base.with(Leadership, 6.5).with(Willpower, 7.0).with(Resilience, 6.0),
    }
}

/// A valid lineup with role profiles and standard traits.
pub fn sample_team(team_id: u32, name: &str, catalog: &TraitCatalog) -> Team {
    TeamBuilder::new(team_id, name).build(catalog)
}
