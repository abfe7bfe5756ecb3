//! European roulette wheel: 37 pockets, one green zero.
//!
//! The table order is part of the generator's output contract: the streak
//! amplifier draws an index into filtered views of this table, so reordering
//! entries changes every amplified spin for a given seed.

use crate::{
    error::{SimError, SimResult},
    types::{WheelNumber, MAX_WHEEL_NUMBER},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Black,
    Green,
}

impl Color {
    pub fn of(number: WheelNumber) -> SimResult<Self> {
        roulette_number(number).map(|r| r.color)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Red   => "red",
            Self::Black => "black",
            Self::Green => "green",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    /// Zero has no parity for betting purposes.
    pub fn of(number: WheelNumber) -> Option<Self> {
        match number {
            0 => None,
            n if n % 2 == 0 => Some(Self::Even),
            _ => Some(Self::Odd),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouletteNumber {
    pub number:  WheelNumber,
    pub color:   Color,
    /// False for zero.
    pub is_even: bool,
    pub dozen:   Option<u8>,
}

const fn pocket(number: WheelNumber, color: Color, dozen: u8) -> RouletteNumber {
    RouletteNumber {
        number,
        color,
        is_even: number % 2 == 0,
        dozen: Some(dozen),
    }
}

use Color::{Black, Red};

pub const ROULETTE_NUMBERS: [RouletteNumber; 37] = [
    RouletteNumber { number: 0, color: Color::Green, is_even: false, dozen: None },
    // Red
    pocket(1, Red, 1),
    pocket(3, Red, 1),
    pocket(5, Red, 1),
    pocket(7, Red, 1),
    pocket(9, Red, 1),
    pocket(12, Red, 1),
    pocket(14, Red, 2),
    pocket(16, Red, 2),
    pocket(18, Red, 2),
    pocket(19, Red, 2),
    pocket(21, Red, 2),
    pocket(23, Red, 2),
    pocket(25, Red, 3),
    pocket(27, Red, 3),
    pocket(30, Red, 3),
    pocket(32, Red, 3),
    pocket(34, Red, 3),
    pocket(36, Red, 3),
    // Black
    pocket(2, Black, 1),
    pocket(4, Black, 1),
    pocket(6, Black, 1),
    pocket(8, Black, 1),
    pocket(10, Black, 1),
    pocket(11, Black, 1),
    pocket(13, Black, 2),
    pocket(15, Black, 2),
    pocket(17, Black, 2),
    pocket(20, Black, 2),
    pocket(22, Black, 2),
    pocket(24, Black, 2),
    pocket(26, Black, 3),
    pocket(28, Black, 3),
    pocket(29, Black, 3),
    pocket(31, Black, 3),
    pocket(33, Black, 3),
    pocket(35, Black, 3),
];

/// Look up a pocket by its number.
pub fn roulette_number(number: WheelNumber) -> SimResult<&'static RouletteNumber> {
    if number > MAX_WHEEL_NUMBER {
        return Err(SimError::InvalidNumber(i64::from(number)));
    }
    ROULETTE_NUMBERS
        .iter()
        .find(|r| r.number == number)
        .ok_or(SimError::InvalidNumber(i64::from(number)))
}

/// Column 1..=3 of the betting layout, `None` for zero.
pub fn column(number: WheelNumber) -> Option<u8> {
    if number == 0 || number > MAX_WHEEL_NUMBER {
        return None;
    }
    Some((number - 1) % 3 + 1)
}
