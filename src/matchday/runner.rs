//! Parallel matchday runner.

use std::sync::Arc;

use rayon::prelude::*;

use crate::board::MoveOracle;
use crate::core::{MatchConfig, MatchError, MatchRng};
use crate::orchestrator::{MatchOrchestrator, MatchResult, MatchSetup};
use crate::traits::TraitCatalog;
use crate::units::Team;

use super::schedule::{round_robin_pairings, Fixture};

/// Seed for one match, derived from the matchday seed and the match id.
#[must_use]
pub fn match_seed(day_seed: u64, match_id: &str) -> u64 {
    MatchRng::new(day_seed).for_context(match_id).seed()
}

/// A set of fixtures sharing a day number and seed.
#[derive(Clone, Debug)]
pub struct Matchday {
    pub day: u32,
    pub seed: u64,
    pub fixtures: Vec<Fixture>,
}

impl Matchday {
    #[must_use]
    pub fn new(day: u32, seed: u64) -> Self {
        Self {
            day,
            seed,
            fixtures: Vec::new(),
        }
    }

    /// Add a fixture (builder pattern).
    #[must_use]
    pub fn with_fixture(mut self, fixture: Fixture) -> Self {
        self.fixtures.push(fixture);
        self
    }

    /// Fixtures for `day` of a round robin over `teams`.
    #[must_use]
    pub fn round_robin(day: u32, seed: u64, teams: &[Team]) -> Self {
        let fixtures = round_robin_pairings(teams.len(), day)
            .into_iter()
            .map(|(a, b)| {
                let (home, away) = (&teams[a], &teams[b]);
                Fixture::new(
                    format!("d{day}-{}-{}", home.id.raw(), away.id.raw()),
                    home.clone(),
                    away.clone(),
                )
            })
            .collect();
        Self { day, seed, fixtures }
    }

    /// Play every fixture, in parallel. Results keep fixture order.
    ///
    /// A fixture whose setup is invalid yields its `MatchError`; the others
    /// still run.
    pub fn run(
        &self,
        config: &Arc<MatchConfig>,
        catalog: &Arc<TraitCatalog>,
        oracle: Option<&Arc<dyn MoveOracle>>,
    ) -> Vec<Result<MatchResult, MatchError>> {
        tracing::info!(day = self.day, fixtures = self.fixtures.len(), "matchday started");
        self.fixtures
            .par_iter()
            .map(|fixture| {
                let setup = MatchSetup::new(
                    fixture.match_id.clone(),
                    fixture.team_a.clone(),
                    fixture.team_b.clone(),
                )
                .with_day(self.day)
                .with_seed(match_seed(self.seed, &fixture.match_id))
                .with_config(Arc::clone(config))
                .with_catalog(Arc::clone(catalog));

                let mut orchestrator = MatchOrchestrator::new(setup)?;
                if let Some(oracle) = oracle {
                    orchestrator = orchestrator.with_oracle(Arc::clone(oracle));
                }
                Ok(orchestrator.run())
            })
            .collect()
    }
}
