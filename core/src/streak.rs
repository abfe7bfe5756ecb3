//! Streak amplification and streak analysis.
//!
//! Amplification looks at the last `HISTORY_WINDOW` spins, measures how long
//! the current colour run and parity run are, and with a length-dependent
//! probability draws the next spin from the pockets that continue the longer
//! run. Zero never extends a run: green breaks a colour run, and a zero on
//! either side of a pair breaks a parity run.

use crate::{
    config::StreakConfig,
    rng::RoulettePrng,
    types::{WheelNumber, MAX_WHEEL_NUMBER},
    wheel::{roulette_number, Color, RouletteNumber, ROULETTE_NUMBERS},
};
use serde::Serialize;

pub const HISTORY_WINDOW: usize = 10;

const BASE_CONTINUATION: f64 = 0.48;
const DECAY_PER_STEP: f64 = 0.04;
pub const MIN_CONTINUATION: f64 = 0.15;
pub const MAX_CONTINUATION: f64 = 0.65;

/// Consecutive equal pairs counted backwards from the latest spin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternRuns {
    pub color:  u32,
    pub parity: u32,
}

impl PatternRuns {
    pub fn max_length(&self) -> u32 {
        self.color.max(self.parity)
    }
}

fn pocket(number: WheelNumber) -> Option<&'static RouletteNumber> {
    roulette_number(number).ok()
}

/// Measure the colour and parity runs ending at the last spin of `history`.
pub fn pattern_runs(history: &[WheelNumber]) -> PatternRuns {
    let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
    let mut runs = PatternRuns::default();

    for pair in recent.windows(2).rev() {
        match (pocket(pair[0]), pocket(pair[1])) {
            (Some(prev), Some(cur)) if cur.color == prev.color && cur.color != Color::Green => {
                runs.color += 1
            }
            _ => break,
        }
    }

    for pair in recent.windows(2).rev() {
        let (prev, cur) = (pair[0], pair[1]);
        if prev != 0 && cur != 0 && prev <= MAX_WHEEL_NUMBER && cur <= MAX_WHEEL_NUMBER
            && prev % 2 == cur % 2
        {
            runs.parity += 1;
        } else {
            break;
        }
    }

    runs
}

/// Probability of continuing a run of `max_length` pairs.
///
/// Starts at 0.48 and loses 0.04 per pair, never below 0.15, then is scaled
/// by `variance_amplifier` and capped at 0.65. A zero-length run is not
/// amplified and reports the base probability.
pub fn continuation_probability(max_length: u32, variance_amplifier: f64) -> f64 {
    if max_length == 0 {
        return BASE_CONTINUATION;
    }
    let decayed = (BASE_CONTINUATION - f64::from(max_length) * DECAY_PER_STEP).max(MIN_CONTINUATION);
    (decayed * variance_amplifier).min(MAX_CONTINUATION)
}

fn uniform_spin(prng: &mut RoulettePrng) -> WheelNumber {
    prng.random_int(0, i64::from(MAX_WHEEL_NUMBER)) as WheelNumber
}

fn draw_from(prng: &mut RoulettePrng, candidates: &[WheelNumber]) -> WheelNumber {
    let idx = prng.random_int(0, candidates.len() as i64 - 1) as usize;
    candidates[idx]
}

/// Draw the next spin given the spins drawn so far.
pub fn apply_streak_amplification(
    history: &[WheelNumber],
    prng: &mut RoulettePrng,
    config: &StreakConfig,
) -> WheelNumber {
    if !config.realistic_streaks_enabled || history.len() < 2 {
        return uniform_spin(prng);
    }

    let runs = pattern_runs(history);
    let max_length = runs.max_length();
    if max_length == 0 || max_length >= config.max_expected_streak_length {
        return uniform_spin(prng);
    }

    let p = continuation_probability(max_length, config.variance_amplifier);
    if !prng.chance(p) {
        return uniform_spin(prng);
    }

    // A non-zero run length implies the last spin is a valid non-zero pocket.
    let Some(last) = history.last().copied().and_then(pocket) else {
        return uniform_spin(prng);
    };

    let candidates: Vec<WheelNumber> = if runs.color >= runs.parity {
        ROULETTE_NUMBERS
            .iter()
            .filter(|r| r.color == last.color)
            .map(|r| r.number)
            .collect()
    } else {
        ROULETTE_NUMBERS
            .iter()
            .filter(|r| r.number != 0 && r.is_even == last.is_even)
            .map(|r| r.number)
            .collect()
    };

    if candidates.is_empty() {
        return uniform_spin(prng);
    }
    log::trace!(
        "amplifying run: color={} parity={} p={p:.3} last={}",
        runs.color,
        runs.parity,
        last.number
    );
    draw_from(prng, &candidates)
}

// ── Analysis ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorStreak {
    pub color:       Color,
    pub length:      usize,
    pub start_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakAnalysis {
    pub longest_color_streak: Option<ColorStreak>,
    pub total_streaks_over_5: usize,
    pub total_streaks_over_10: usize,
}

/// Longest red/black streak and the number of long streaks in `spins`.
/// Green pockets are runs of length one and never count as the longest.
/// Only runs closed by a different pocket colour are counted as long
/// streaks; the run still open at the end of `spins` only competes for the
/// longest.
pub fn analyze_streak_patterns(spins: &[WheelNumber]) -> StreakAnalysis {
    let mut analysis = StreakAnalysis::default();
    let colors: Vec<Option<Color>> = spins.iter().map(|n| pocket(*n).map(|r| r.color)).collect();

    let mut start = 0;
    while start < colors.len() {
        let color = colors[start];
        let mut end = start + 1;
        if color.is_some_and(|c| c != Color::Green) {
            while end < colors.len() && colors[end] == color {
                end += 1;
            }
        }
        let length = end - start;

        if let Some(c) = color.filter(|c| *c != Color::Green) {
            let longer = analysis
                .longest_color_streak
                .as_ref()
                .map_or(true, |best| length > best.length);
            if longer {
                analysis.longest_color_streak = Some(ColorStreak { color: c, length, start_index: start });
            }
        }
        let closed = end < colors.len();
        if closed && length > 5 {
            analysis.total_streaks_over_5 += 1;
        }
        if closed && length > 10 {
            analysis.total_streaks_over_10 += 1;
        }
        start = end;
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_count_pairs_and_stop_at_first_break() {
        // 17 black, 2 black, 4 black, 6 black: three equal colour pairs.
        assert_eq!(pattern_runs(&[1, 17, 2, 4, 6]).color, 3);
        // Even run: 2,4,6 gives two pairs; 17 breaks it.
        assert_eq!(pattern_runs(&[1, 17, 2, 4, 6]).parity, 2);
    }

    #[test]
    fn zero_breaks_both_runs() {
        let runs = pattern_runs(&[2, 4, 0]);
        assert_eq!(runs, PatternRuns { color: 0, parity: 0 });
        let runs = pattern_runs(&[0, 0, 0]);
        assert_eq!(runs.max_length(), 0);
    }

    #[test]
    fn only_last_ten_spins_are_examined() {
        let history = vec![2u8; 25];
        assert_eq!(pattern_runs(&history).color, 9);
    }

    #[test]
    fn probability_envelope() {
        assert_eq!(continuation_probability(0, 1.2), 0.48);
        assert!((continuation_probability(1, 1.0) - 0.44).abs() < 1e-12);
        assert!((continuation_probability(9, 1.2) - 0.18).abs() < 1e-12);
        assert_eq!(continuation_probability(1, 5.0), MAX_CONTINUATION);
        for len in 1..20 {
            let p = continuation_probability(len, 1.0);
            assert!((MIN_CONTINUATION..=MAX_CONTINUATION).contains(&p));
        }
    }

    #[test]
    fn disabled_amplification_matches_plain_draws() {
        let mut a = RoulettePrng::with_seed(99);
        let mut b = RoulettePrng::with_seed(99);
        let history = [2, 4, 6, 8, 10];
        for _ in 0..100 {
            let amplified = apply_streak_amplification(&history, &mut a, &StreakConfig::disabled());
            assert_eq!(amplified, b.random_int(0, 36) as u8);
        }
    }

    #[test]
    fn analysis_finds_longest_colour_streak() {
        // red x3, black x2, green, red x1
        let analysis = analyze_streak_patterns(&[1, 3, 5, 2, 4, 0, 9]);
        assert_eq!(
            analysis.longest_color_streak,
            Some(ColorStreak { color: Color::Red, length: 3, start_index: 0 })
        );
        assert_eq!(analysis.total_streaks_over_5, 0);
    }

    #[test]
    fn analysis_counts_long_streaks() {
        let mut spins = vec![2u8; 7];
        spins.push(0);
        spins.extend(vec![1u8; 12]);
        let analysis = analyze_streak_patterns(&spins);
        // The trailing run of 12 is still open, so only the 7 counts.
        assert_eq!(analysis.total_streaks_over_5, 1);
        assert_eq!(analysis.total_streaks_over_10, 0);
        assert_eq!(
            analysis.longest_color_streak,
            Some(ColorStreak { color: Color::Red, length: 12, start_index: 8 })
        );

        // Closing it with a black pocket makes it count.
        spins.push(2);
        let analysis = analyze_streak_patterns(&spins);
        assert_eq!(analysis.total_streaks_over_5, 2);
        assert_eq!(analysis.total_streaks_over_10, 1);
    }

    #[test]
    fn analysis_of_empty_input_is_empty() {
        assert_eq!(analyze_streak_patterns(&[]), StreakAnalysis::default());
    }
}
