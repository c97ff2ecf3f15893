//! Injectable randomness for index jitter.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Chance that a freshly computed index gets one extra random character.
pub const JITTER_PROBABILITY: f64 = 0.3;

/// Indices at or beyond this length are never extended by jitter.
pub const MAX_JITTERED_LEN: usize = 10;

/// Randomness capability consumed by the algebra.
///
/// Injected rather than ambient so that concurrent-insert diversification can
/// be reproduced in tests: two sources built from the same seed produce the
/// same index sequence.
pub trait JitterSource {
    /// Uniform value in `[0, 1)`.
    fn random(&mut self) -> f64;

    /// Uniform integer in `[0, max)`. `max` must be non-zero.
    fn random_int(&mut self, max: usize) -> usize;
}

/// Jitter source backed by any [`rand::Rng`].
pub struct RngJitter<R> {
    rng: R,
}

impl<R: Rng> RngJitter<R> {
    /// Wrap an existing RNG.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngJitter<SmallRng> {
    /// Deterministic source from a seed. The workhorse for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }

    /// Entropy-seeded source for production writers.
    pub fn from_entropy() -> Self {
        Self::new(SmallRng::from_entropy())
    }
}

impl<R: Rng> JitterSource for RngJitter<R> {
    fn random(&mut self) -> f64 {
        self.rng.gen()
    }

    fn random_int(&mut self, max: usize) -> usize {
        self.rng.gen_range(0..max)
    }
}

/// The zero-jitter source: never extends an index.
///
/// `random()` returns 1.0, which no probability threshold in `[0, 1)` admits.
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn random(&mut self) -> f64 {
        1.0
    }

    fn random_int(&mut self, _max: usize) -> usize {
        0
    }
}

// ============================================================================
// Tests
// ============================================================================
