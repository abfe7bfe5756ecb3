//! Roulette random number generation.
//!
//! RULE: Nothing in the simulation may call a platform or thread-local RNG.
//! Every spin comes from a `RoulettePrng` owned by exactly one generator.
//! There is no global generator state; two runs never share a stream.
//!
//! `RoulettePrng` is MT19937 with a deferred first twist: the 624-word
//! state vector is seeded, the first 624 draws temper those seeded words
//! directly, and the vector is regenerated ("twisted") on draw 625 and every
//! 624 draws after that. Draw 625 onwards is the reference MT19937 stream
//! for the same seed.
//!
//! `SeedBank` derives the per-run seeds of a batch from one master seed,
//! so a batch of runs is reproducible while each run stays independent.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;
const TWO_POW_32: f64 = 4_294_967_296.0;
const SEED_MULTIPLIER: u32 = 1_812_433_253;

/// MT19937 generator. Not thread-safe; give each run its own instance.
#[derive(Clone)]
pub struct RoulettePrng {
    seed:  u32,
    mt:    [u32; N],
    index: usize,
}

impl RoulettePrng {
    pub fn with_seed(seed: u32) -> Self {
        let mut mt = [0u32; N];
        mt[0] = seed;
        for i in 1..N {
            let prev = mt[i - 1];
            mt[i] = SEED_MULTIPLIER
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        // The seeded words are drawn as-is before the first twist.
        Self { seed, mt, index: 0 }
    }

    /// Seed from wall-clock milliseconds (low 32 bits).
    pub fn from_clock() -> Self {
        let seed = chrono::Utc::now().timestamp_millis() as u32;
        log::debug!("prng seeded from clock: {seed}");
        Self::with_seed(seed)
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    fn twist(&mut self) {
        for i in 0..N {
            let y = (self.mt[i] & UPPER_MASK) | (self.mt[(i + 1) % N] & LOWER_MASK);
            let mut next = self.mt[(i + M) % N] ^ (y >> 1);
            if y & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.mt[i] = next;
        }
        self.index = 0;
    }

    /// Draw one tempered 32-bit word.
    pub fn next_word(&mut self) -> u32 {
        if self.index >= N {
            self.twist();
        }
        let mut y = self.mt[self.index];
        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^= y >> 18;
        self.index += 1;
        y
    }

    /// Roll a float in [0.0, 1.0).
    pub fn random(&mut self) -> f64 {
        f64::from(self.next_word()) / TWO_POW_32
    }

    /// Roll an integer in [min, max], both inclusive.
    pub fn random_int(&mut self, min: i64, max: i64) -> i64 {
        debug_assert!(min <= max, "empty range {min}..={max}");
        let span = (max - min + 1) as f64;
        (self.random() * span).floor() as i64 + min
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.random() < p
    }
}

impl std::fmt::Debug for RoulettePrng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoulettePrng")
            .field("seed", &self.seed)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl RngCore for RoulettePrng {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_word());
        let lo = u64::from(self.next_word());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Seeds for the runs of a batch, indexed by stable run slot.
pub struct SeedBank {
    master_seed: u64,
}

impl SeedBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Seed for the run at `slot`. Same master seed and slot, same seed.
    pub fn seed_for_run(&self, slot: u64) -> u32 {
        let derived = self.master_seed ^ slot.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Pcg64Mcg::seed_from_u64(derived).next_u32()
    }

    pub fn prng_for_run(&self, slot: u64) -> RoulettePrng {
        RoulettePrng::with_seed(self.seed_for_run(slot))
    }
}
