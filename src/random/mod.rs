mod mersenne;

pub use mersenne::MersenneTwister;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Deterministic pseudo-random source shared by creators, mutators,
/// selectors and the data loader.
///
/// Methods take `&self` so one source can be shared across threads; the
/// implementations serialize internal state mutation so concurrent draws
/// never observe a torn state.
pub trait RandomSource: Send + Sync {
    /// Next raw 32-bit draw.
    fn next_u32(&self) -> u32;

    /// Uniform integer in `[0, max_exclusive)`.
    ///
    /// # Panics
    ///
    /// Panics when `max_exclusive <= 0` — a non-positive bound is a
    /// programmer error and fails fast.
    fn next_below(&self, max_exclusive: i64) -> i64;

    /// Uniform integer in `[min, max_exclusive)`.
    fn next_range(&self, min: i64, max_exclusive: i64) -> i64 {
        assert!(
            min < max_exclusive,
            "invalid random range: {min} >= {max_exclusive}"
        );
        min + self.next_below(max_exclusive - min)
    }

    /// Uniform double in `[0, 1)`.
    fn next_f64(&self) -> f64;

    /// Gaussian sample via the Box-Muller transform on two uniform draws.
    fn next_gaussian(&self, mu: f64, sigma: f64) -> f64;
}

/// Box-Muller transform over two uniform draws in `[0, 1)`.
///
/// The first draw is resampled until positive so `ln` stays finite.
pub(crate) fn box_muller<F: FnMut() -> f64>(mut uniform: F, mu: f64, sigma: f64) -> f64 {
    let mut u1 = uniform();
    while u1 <= 0.0 {
        u1 = uniform();
    }
    let u2 = uniform();
    mu + sigma * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Entropy-seeded source backed by `rand::StdRng`, for runs where
/// reproducibility is not required.
pub struct EntropyRandom {
    rng: Mutex<StdRng>,
}

impl EntropyRandom {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for EntropyRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropyRandom {
    fn next_u32(&self) -> u32 {
        self.rng.lock().unwrap().gen()
    }

    fn next_below(&self, max_exclusive: i64) -> i64 {
        assert!(
            max_exclusive > 0,
            "max_exclusive must be positive, got {max_exclusive}"
        );
        self.rng.lock().unwrap().gen_range(0..max_exclusive)
    }

    fn next_f64(&self) -> f64 {
        self.rng.lock().unwrap().gen::<f64>()
    }

    fn next_gaussian(&self, mu: f64, sigma: f64) -> f64 {
        let mut rng = self.rng.lock().unwrap();
        box_muller(|| rng.gen::<f64>(), mu, sigma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_entropy_random_repeats() {
        let a = EntropyRandom::seeded(7);
        let b = EntropyRandom::seeded(7);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    #[should_panic(expected = "max_exclusive must be positive")]
    fn test_next_below_rejects_zero() {
        EntropyRandom::seeded(1).next_below(0);
    }

    #[test]
    fn test_next_range_bounds() {
        let rng = EntropyRandom::seeded(3);
        for _ in 0..1000 {
            let v = rng.next_range(-5, 5);
            assert!((-5..5).contains(&v));
        }
    }

    #[test]
    fn test_gaussian_is_finite() {
        let rng = EntropyRandom::seeded(11);
        for _ in 0..1000 {
            assert!(rng.next_gaussian(0.0, 1.0).is_finite());
        }
    }
}
