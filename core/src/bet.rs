//! Bet types and their win conditions.
//!
//! Zero loses every outside bet (dozen, colour other than green, even/odd,
//! high/low, column).

use crate::{
    error::{SimError, SimResult},
    types::{WheelNumber, MAX_WHEEL_NUMBER},
    wheel::{self, Color, Parity},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HighLow {
    /// 1–18
    Low,
    /// 19–36
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "bet_type", content = "target", rename_all = "snake_case")]
pub enum BetType {
    Single(WheelNumber),
    Dozen(u8),
    Color(Color),
    EvenOdd(Parity),
    HighLow(HighLow),
    Column(u8),
}

impl BetType {
    /// Reject targets that can never win.
    pub fn validate(&self) -> SimResult<()> {
        let ok = match self {
            Self::Single(n) => *n <= MAX_WHEEL_NUMBER,
            Self::Dozen(d) | Self::Column(d) => (1..=3).contains(d),
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err(SimError::InvalidConfig(format!("bet target out of range: {self:?}")))
        }
    }

    pub fn wins(&self, number: WheelNumber) -> bool {
        match *self {
            Self::Single(target) => number == target,
            Self::Dozen(d) => number != 0 && (number - 1) / 12 + 1 == d,
            Self::Color(c) => Color::of(number).map(|col| col == c).unwrap_or(false),
            Self::EvenOdd(p) => Parity::of(number) == Some(p),
            Self::HighLow(HighLow::Low) => (1..=18).contains(&number),
            Self::HighLow(HighLow::High) => (19..=MAX_WHEEL_NUMBER).contains(&number),
            Self::Column(c) => wheel::column(number) == Some(c),
        }
    }

    /// Total return per unit staked on a win, stake included.
    pub fn win_multiplier(&self) -> f64 {
        match self {
            Self::Single(_) => 36.0,
            Self::Dozen(_) | Self::Column(_) => 3.0,
            Self::Color(Color::Green) => 36.0,
            Self::Color(_) | Self::EvenOdd(_) | Self::HighLow(_) => 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_loses_outside_bets() {
        let outside = [
            BetType::Dozen(1),
            BetType::Color(Color::Red),
            BetType::Color(Color::Black),
            BetType::EvenOdd(Parity::Even),
            BetType::EvenOdd(Parity::Odd),
            BetType::HighLow(HighLow::Low),
            BetType::HighLow(HighLow::High),
            BetType::Column(1),
        ];
        for bet in outside {
            assert!(!bet.wins(0), "{bet:?} should lose on zero");
        }
        assert!(BetType::Single(0).wins(0));
        assert!(BetType::Color(Color::Green).wins(0));
    }

    #[test]
    fn dozen_boundaries() {
        assert!(BetType::Dozen(1).wins(12));
        assert!(!BetType::Dozen(1).wins(13));
        assert!(BetType::Dozen(2).wins(13));
        assert!(BetType::Dozen(3).wins(36));
    }

    #[test]
    fn column_and_high_low() {
        assert!(BetType::Column(1).wins(1));
        assert!(BetType::Column(2).wins(35));
        assert!(BetType::Column(3).wins(36));
        assert!(BetType::HighLow(HighLow::Low).wins(18));
        assert!(BetType::HighLow(HighLow::High).wins(19));
    }

    #[test]
    fn colour_follows_wheel_table() {
        assert!(BetType::Color(Color::Red).wins(36));
        assert!(BetType::Color(Color::Black).wins(17));
        assert!(!BetType::Color(Color::Black).wins(19));
    }

    #[test]
    fn invalid_targets_rejected() {
        assert!(BetType::Dozen(4).validate().is_err());
        assert!(BetType::Single(37).validate().is_err());
        assert!(BetType::Column(3).validate().is_ok());
    }
}
