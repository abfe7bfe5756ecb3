//! Simulation configuration loaded from JSON.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides.

use crate::{
    bet::BetType,
    error::{SimError, SimResult},
    wheel::Color,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreakConfig {
    pub realistic_streaks_enabled:  bool,
    /// Runs at or beyond this length are no longer amplified.
    pub max_expected_streak_length: u32,
    pub variance_amplifier:         f64,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            realistic_streaks_enabled:  true,
            max_expected_streak_length: 15,
            variance_amplifier:         1.2,
        }
    }
}

impl StreakConfig {
    pub fn disabled() -> Self {
        Self {
            realistic_streaks_enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        if !self.variance_amplifier.is_finite() || self.variance_amplifier < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "variance_amplifier must be a non-negative number, got {}",
                self.variance_amplifier
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MartingaleConfig {
    pub base_bet: f64,
    /// Table maximum; a doubled bet above it resets to `base_bet`.
    pub max_bet:  f64,
    pub bet:      BetType,
}

impl Default for MartingaleConfig {
    fn default() -> Self {
        Self {
            base_bet: 10.0,
            max_bet:  5_000.0,
            bet:      BetType::Color(Color::Black),
        }
    }
}

impl MartingaleConfig {
    pub fn validate(&self) -> SimResult<()> {
        if !self.base_bet.is_finite() || self.base_bet <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "base_bet must be positive, got {}",
                self.base_bet
            )));
        }
        if !self.max_bet.is_finite() || self.max_bet < self.base_bet {
            return Err(SimError::InvalidConfig(format!(
                "max_bet {} is below base_bet {}",
                self.max_bet, self.base_bet
            )));
        }
        self.bet.validate()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub streaks:    StreakConfig,
    pub martingale: MartingaleConfig,
}

impl SimulationConfig {
    pub fn load(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        let config: Self = serde_json::from_str(&text)?;
        config.streaks.validate()?;
        config.martingale.validate()?;
        Ok(config)
    }
}
