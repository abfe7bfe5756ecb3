//! Pull-based spin generator.
//!
//! A `SpinGenerator` owns its PRNG and its recent-spin window. Nothing is
//! shared between generators, so independent simulation runs can be driven
//! from separate threads, each with its own instance.

use crate::{
    config::StreakConfig,
    error::SimResult,
    rng::RoulettePrng,
    streak::{apply_streak_amplification, HISTORY_WINDOW},
    types::WheelNumber,
};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct SpinGenerator {
    prng:   RoulettePrng,
    config: StreakConfig,
    recent: VecDeque<WheelNumber>,
    drawn:  u64,
}

impl SpinGenerator {
    pub fn new(prng: RoulettePrng, config: StreakConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            prng,
            config,
            recent: VecDeque::with_capacity(HISTORY_WINDOW),
            drawn: 0,
        })
    }

    pub fn with_seed(seed: u32, config: StreakConfig) -> SimResult<Self> {
        Self::new(RoulettePrng::with_seed(seed), config)
    }

    pub fn seed(&self) -> u32 {
        self.prng.seed()
    }

    /// Number of spins drawn so far.
    pub fn drawn(&self) -> u64 {
        self.drawn
    }

    /// Draw the next spin and append it to the recent window.
    pub fn next_spin(&mut self) -> WheelNumber {
        let history = self.recent.make_contiguous();
        let spin = apply_streak_amplification(history, &mut self.prng, &self.config);
        if self.recent.len() == HISTORY_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(spin);
        self.drawn += 1;
        spin
    }

    /// Draw `count` spins.
    pub fn take_spins(&mut self, count: usize) -> Vec<WheelNumber> {
        (0..count).map(|_| self.next_spin()).collect()
    }
}

impl Iterator for SpinGenerator {
    type Item = WheelNumber;

    fn next(&mut self) -> Option<WheelNumber> {
        Some(self.next_spin())
    }
}

/// A finite, reproducible spin sequence for the default streak settings.
pub fn generate_fixed_spins(count: usize, seed: u32) -> SimResult<Vec<WheelNumber>> {
    let mut generator = SpinGenerator::with_seed(seed, StreakConfig::default())?;
    Ok(generator.take_spins(count))
}
