//! Roles and divisions.
//!
//! Operations division: Field Leader (FL), Ranger (RG), Vanguard (VG),
//! Enforcer (EN). Intelligence division: Ghost Operative (GO),
//! Psi Operative (PO), Sovereign (SV).

use serde::{Deserialize, Serialize};

use crate::core::ValidationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Division {
    Operations,
    Intelligence,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    FieldLeader,
    Ranger,
    Vanguard,
    Enforcer,
    GhostOperative,
    PsiOperative,
    Sovereign,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::FieldLeader,
        Role::Ranger,
        Role::Vanguard,
        Role::Enforcer,
        Role::GhostOperative,
        Role::PsiOperative,
        Role::Sovereign,
    ];

    /// Two-letter roster code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Role::FieldLeader => "FL",
            Role::Ranger => "RG",
            Role::Vanguard => "VG",
            Role::Enforcer => "EN",
            Role::GhostOperative => "GO",
            Role::PsiOperative => "PO",
            Role::Sovereign => "SV",
        }
    }

    /// Parse a roster code (case-insensitive).
    pub fn from_code(code: &str) -> Result<Self, ValidationError> {
        let upper = code.trim().to_ascii_uppercase();
        Role::ALL
            .into_iter()
            .find(|role| role.code() == upper)
            .ok_or_else(|| ValidationError::UnknownRole(code.to_string()))
    }

    #[must_use]
    pub const fn division(self) -> Division {
        match self {
            Role::FieldLeader | Role::Ranger | Role::Vanguard | Role::Enforcer => {
                Division::Operations
            }
            Role::GhostOperative | Role::PsiOperative | Role::Sovereign => Division::Intelligence,
        }
    }

    /// Resolution priority, lower resolves first.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Role::FieldLeader => 0,
            Role::Sovereign => 1,
            Role::PsiOperative => 2,
            Role::GhostOperative => 3,
            Role::Vanguard => 4,
            Role::Enforcer => 5,
            Role::Ranger => 6,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::from_code(role.code()).unwrap(), role);
        }
        assert_eq!(Role::from_code(" fl ").unwrap(), Role::FieldLeader);
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(
            Role::from_code("QB"),
            Err(ValidationError::UnknownRole("QB".into()))
        );
    }

    #[test]
    fn test_divisions() {
        assert_eq!(Role::Enforcer.division(), Division::Operations);
        assert_eq!(Role::Sovereign.division(), Division::Intelligence);
    }

    #[test]
    fn test_field_leader_resolves_first() {
        let mut roles = Role::ALL.to_vec();
        roles.sort_by_key(|r| r.priority());
        assert_eq!(roles[0], Role::FieldLeader);

        let mut priorities: Vec<_> = Role::ALL.iter().map(|r| r.priority()).collect();
        priorities.sort_unstable();
        priorities.dedup();
        assert_eq!(priorities.len(), Role::ALL.len());
    }
}
