//! Injectable random source

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the widget's random draws.
///
/// Symbol draws go through [`pick`](RandomSource::pick), stop slots through
/// [`pick_range`](RandomSource::pick_range). Tests substitute a scripted source
/// to land specific symbols on the center line.
pub trait RandomSource {
    /// Uniform index in `0..upper`. Returns 0 when `upper` is 0.
    fn pick(&mut self, upper: usize) -> usize;

    /// Uniform index in `lo..=hi`. Returns `lo` when the range is empty.
    fn pick_range(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        lo + self.pick(hi - lo + 1)
    }
}

impl RandomSource for StdRng {
    fn pick(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        self.random_range(0..upper)
    }
}

/// Seed RNG for reproducible spins
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
