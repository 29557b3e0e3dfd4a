//! Fixtures and pairing.

use crate::units::Team;

/// One match of a matchday.
#[derive(Clone, Debug)]
pub struct Fixture {
    pub match_id: String,
    pub team_a: Team,
    pub team_b: Team,
}

impl Fixture {
    pub fn new(match_id: impl Into<String>, team_a: Team, team_b: Team) -> Self {
        Self {
            match_id: match_id.into(),
            team_a,
            team_b,
        }
    }

    /// The return fixture: sides swapped, id suffixed with `-r`.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        Self {
            match_id: format!("{}-r", self.match_id),
            team_a: self.team_b.clone(),
            team_b: self.team_a.clone(),
        }
    }
}

/// Pairings for `day` (1-based) of a single round robin over `teams` teams.
///
/// Circle method: team 0 stays put while the others rotate one place per
/// day. With an odd count one team sits out each day. Every pair meets once
/// every `teams - 1` days (`teams` days when odd).
#[must_use]
pub fn round_robin_pairings(teams: usize, day: u32) -> Vec<(usize, usize)> {
    if teams < 2 {
        return Vec::new();
    }
    let slots = teams + teams % 2;
    let rotation = slots - 1;
    let r = (day.max(1) as usize - 1) % rotation;
    let at = |pos: usize| if pos == 0 { 0 } else { (pos - 1 + r) % rotation + 1 };

    (0..slots / 2)
        .map(|i| {
            let (home, away) = (at(i), at(slots - 1 - i));
            if i == 0 && r % 2 == 1 {
                (away, home)
            } else {
                (home, away)
            }
        })
        // The extra slot of an odd count is the bye.
        .filter(|&(home, away)| home < teams && away < teams)
        .collect()
}
