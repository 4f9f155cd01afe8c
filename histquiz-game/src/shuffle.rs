//! Choice ordering sources.
//!
//! Every [`crate::engine::ScenarioEngine::present_node`] call asks the
//! shuffler for a fresh permutation so players cannot memorize positions.
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use smallvec::SmallVec;

use crate::constants::INLINE_CHOICES;

/// A permutation of `0..len`, most choice lists fit inline.
pub type ChoiceOrder = SmallVec<[usize; INLINE_CHOICES]>;

/// Produces display orderings for a node's choices.
pub trait ChoiceShuffler {
    /// Return a permutation of `0..len`.
    fn permutation(&mut self, len: usize) -> ChoiceOrder;
}

fn shuffled<R: RngCore>(rng: &mut R, len: usize) -> ChoiceOrder {
    let mut order: ChoiceOrder = (0..len).collect();
    order.shuffle(rng);
    order
}

/// Production shuffler seeded from OS entropy.
#[derive(Debug, Clone)]
pub struct EntropyShuffler {
    rng: SmallRng,
}

impl EntropyShuffler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }
}

impl Default for EntropyShuffler {
    fn default() -> Self {
        Self::new()
    }
}

impl ChoiceShuffler for EntropyShuffler {
    fn permutation(&mut self, len: usize) -> ChoiceOrder {
        shuffled(&mut self.rng, len)
    }
}

/// Deterministic shuffler for tests, replays and autoplay.
#[derive(Debug, Clone)]
pub struct SeededShuffler {
    seed: u64,
    rng: ChaCha8Rng,
    draws: u64,
}

impl SeededShuffler {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of permutations handed out so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl ChoiceShuffler for SeededShuffler {
    fn permutation(&mut self, len: usize) -> ChoiceOrder {
        self.draws = self.draws.saturating_add(1);
        shuffled(&mut self.rng, len)
    }
}

/// Keeps declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityShuffler;

impl ChoiceShuffler for IdentityShuffler {
    fn permutation(&mut self, len: usize) -> ChoiceOrder {
        (0..len).collect()
    }
}

impl<S: ChoiceShuffler + ?Sized> ChoiceShuffler for Box<S> {
    fn permutation(&mut self, len: usize) -> ChoiceOrder {
        (**self).permutation(len)
    }
}
