//! Unit, team and side identification.
//!
//! ## UnitId / TeamId
//!
//! Opaque numeric identifiers assigned by the lineup loader. Unit ids are
//! unique across both sides of a match.
//!
//! ## Side / SideMap
//!
//! A match always has exactly two sides. `SideMap<T>` stores one value per
//! side with O(1) access by `Side`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Unit identifier, unique within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Create a new unit ID.
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

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unit({})", self.0)
    }
}

/// Team identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl TeamId {
    /// Create a new team ID.
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

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// One of the two sides of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Both sides, A first.
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// 0-based index (A = 0, B = 1).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "Side A"),
            Side::B => write!(f, "Side B"),
        }
    }
}

/// Per-side data storage.
///
/// ## Example
///
/// ```
/// use meta_league::core::{Side, SideMap};
///
/// let mut knockouts: SideMap<u32> = SideMap::new(|_| 0);
/// knockouts[Side::B] += 1;
/// assert_eq!(knockouts[Side::A], 0);
/// assert_eq!(knockouts[Side::B], 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideMap<T> {
    a: T,
    b: T,
}

impl<T> SideMap<T> {
    /// Create a map using a factory function for each side.
    pub fn new(mut factory: impl FnMut(Side) -> T) -> Self {
        Self {
            a: factory(Side::A),
            b: factory(Side::B),
        }
    }

    /// Create a map from explicit values.
    pub fn from_pair(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Iterate over `(Side, &T)` pairs, A first.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        [(Side::A, &self.a), (Side::B, &self.b)].into_iter()
    }

    /// Iterate over `(Side, &mut T)` pairs, A first.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Side, &mut T)> {
        [(Side::A, &mut self.a), (Side::B, &mut self.b)].into_iter()
    }

    /// Map each value into a new `SideMap`.
    pub fn map<U>(&self, mut f: impl FnMut(Side, &T) -> U) -> SideMap<U> {
        SideMap {
            a: f(Side::A, &self.a),
            b: f(Side::B, &self.b),
        }
    }

    /// Swap the two sides.
    #[must_use]
    pub fn swapped(self) -> Self {
        Self { a: self.b, b: self.a }
    }
}

impl<T: Default> Default for SideMap<T> {
    fn default() -> Self {
        Self::new(|_| T::default())
    }
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &Self::Output {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut Self::Output {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }
}
