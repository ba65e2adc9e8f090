use super::{box_muller, RandomSource};
use std::sync::Mutex;

const STATE_WORDS: usize = 624;
const SHIFT_POINT: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// MT19937 generator state. Pure: all mutation goes through `next_u32`.
struct TwisterState {
    words: [u32; STATE_WORDS],
    index: usize,
}

impl TwisterState {
    fn new(seed: u32) -> Self {
        let mut words = [0u32; STATE_WORDS];
        words[0] = seed;
        for i in 1..STATE_WORDS {
            let prev = words[i - 1];
            words[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        Self {
            words,
            index: STATE_WORDS,
        }
    }

    /// Regenerate the full state array. Runs once every 624 draws.
    fn twist(&mut self) {
        for i in 0..STATE_WORDS {
            let y = (self.words[i] & UPPER_MASK) | (self.words[(i + 1) % STATE_WORDS] & LOWER_MASK);
            let mut next = y >> 1;
            if y & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.words[i] = self.words[(i + SHIFT_POINT) % STATE_WORDS] ^ next;
        }
        self.index = 0;
    }

    fn next_u32(&mut self) -> u32 {
        if self.index >= STATE_WORDS {
            self.twist();
        }
        let mut y = self.words[self.index];
        self.index += 1;
        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^= y >> 18;
        y
    }

    fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

/// Reference MT19937 implementation of [`RandomSource`].
///
/// Bit-reproducible: the same seed yields the identical draw sequence across
/// runs and across languages implementing the same constants. The state
/// array is refilled in place every 624 draws, so it lives behind a mutex
/// and every public method holds the lock for the full draw.
pub struct MersenneTwister {
    state: Mutex<TwisterState>,
}

impl MersenneTwister {
    pub fn new(seed: u32) -> Self {
        Self {
            state: Mutex::new(TwisterState::new(seed)),
        }
    }
}

impl RandomSource for MersenneTwister {
    fn next_u32(&self) -> u32 {
        self.state.lock().unwrap().next_u32()
    }

    fn next_below(&self, max_exclusive: i64) -> i64 {
        assert!(
            max_exclusive > 0,
            "max_exclusive must be positive, got {max_exclusive}"
        );
        i64::from(self.state.lock().unwrap().next_u32()) % max_exclusive
    }

    fn next_f64(&self) -> f64 {
        self.state.lock().unwrap().next_f64()
    }

    fn next_gaussian(&self, mu: f64, sigma: f64) -> f64 {
        // Both uniform draws happen under one lock acquisition so concurrent
        // callers cannot interleave inside the transform.
        let mut state = self.state.lock().unwrap();
        box_muller(|| state.next_f64(), mu, sigma)
    }
}
