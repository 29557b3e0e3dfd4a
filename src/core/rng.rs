//! Seeded random streams.
//!
//! A matchday owns one root seed; every match derives its own stream from
//! that seed and the match id, so fixtures can run in any order or in
//! parallel and still draw the same numbers. Inside a match the stream is
//! only ever reached through the
//! [`ProbabilityEngine`](super::ProbabilityEngine).
//!
//! ```
//! use meta_league::core::MatchRng;
//!
//! let day = MatchRng::new(42);
//! let mut first = day.for_context("fixture-1");
//! let mut replay = MatchRng::new(42).for_context("fixture-1");
//! assert_eq!(first.gen_range(0..100), replay.gen_range(0..100));
//! ```

use std::hash::{Hash, Hasher};
use std::ops::Range;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

/// ChaCha8 stream that remembers the seed it was built from.
#[derive(Clone, Debug)]
pub struct MatchRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl MatchRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Derive the stream for `context` (usually a match id).
    ///
    /// Depends only on the seed and the context, never on how many numbers
    /// this stream has already produced.
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        let mut hasher = FxHasher::default();
        self.seed.hash(&mut hasher);
        context.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    pub fn gen_range(&mut self, range: Range<i32>) -> i32 {
        self.inner.gen_range(range)
    }

    pub fn gen_index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.inner.gen_range(0..len))
    }

    /// Uniform draw in `[0, 1)`.
    pub fn gen_unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    /// Index drawn in proportion to `weights`. Negative weights count as
    /// zero; `None` when nothing has weight.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        let mut remaining = self.gen_unit() * total;
        let mut last = None;
        for (i, &weight) in weights.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            last = Some(i);
            remaining -= weight;
            if remaining < 0.0 {
                return Some(i);
            }
        }
        // Rounding left a sliver; the last weighted entry takes it.
        last
    }

    #[must_use]
    pub fn state(&self) -> MatchRngState {
        MatchRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    #[must_use]
    pub fn from_state(state: &MatchRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Position of a stream: its seed plus the ChaCha word counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRngState {
    pub seed: u64,
    pub word_pos: u128,
}
