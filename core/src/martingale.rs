//! Standard martingale: double after every loss, reset after every win.
//!
//! A doubled bet that would exceed the table maximum or the money left in
//! the portfolio is abandoned and the progression resets to the base bet.
//! The run stops early once the portfolio is exhausted.

use crate::{
    config::MartingaleConfig,
    error::SimResult,
    store::{NewSimulation, NewSpin},
    types::{JsonMap, SimulationId, WheelNumber},
};
use serde::Serialize;

pub const STRATEGY_NAME: &str = "standard_martingale";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardMartingaleState {
    pub current_bet:         f64,
    pub base_bet:            f64,
    pub total_wagered:       f64,
    pub total_won:           f64,
    pub net_result:          f64,
    pub current_round:       u64,
    pub loss_streak:         u32,
    pub max_bet_reached:     f64,
    pub total_resets:        u32,
    pub max_streak_survived: u32,
}

impl StandardMartingaleState {
    fn new(base_bet: f64) -> Self {
        Self {
            current_bet: base_bet,
            base_bet,
            total_wagered: 0.0,
            total_won: 0.0,
            net_result: 0.0,
            current_round: 0,
            loss_streak: 0,
            max_bet_reached: 0.0,
            total_resets: 0,
            max_streak_survived: 0,
        }
    }
}

/// One played spin, in the shape the API stores as a spin's `raw` blob.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinResult {
    pub spin:                      u32,
    pub drawn_number:              WheelNumber,
    pub spin_net_result:           f64,
    pub cumulative_earnings:       f64,
    pub strategy_type:             &'static str,
    pub standard_martingale_state: StandardMartingaleState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub starting_investment: f64,
    pub final_earnings:      f64,
    pub final_portfolio:     f64,
    pub results:             Vec<SpinResult>,
}

impl SimulationOutcome {
    pub fn new_simulation(&self, user_id: Option<String>, settings: JsonMap) -> NewSimulation {
        NewSimulation {
            user_id,
            strategy: STRATEGY_NAME.to_string(),
            starting_investment: self.starting_investment,
            final_earnings: self.final_earnings,
            final_portfolio: self.final_portfolio,
            total_spins: self.results.len() as i64,
            settings,
        }
    }

    pub fn new_spins(&self, simulation_id: SimulationId) -> SimResult<Vec<NewSpin>> {
        self.results
            .iter()
            .map(|r| {
                let raw = match serde_json::to_value(r)? {
                    serde_json::Value::Object(map) => map,
                    _ => JsonMap::new(),
                };
                Ok(NewSpin {
                    simulation_id,
                    spin_number: i64::from(r.spin),
                    drawn_number: i64::from(r.drawn_number),
                    spin_net_result: r.spin_net_result,
                    cumulative_earnings: r.cumulative_earnings,
                    raw,
                })
            })
            .collect()
    }
}

pub struct StandardMartingale {
    config: MartingaleConfig,
    state:  StandardMartingaleState,
}

impl StandardMartingale {
    pub fn new(config: MartingaleConfig) -> SimResult<Self> {
        config.validate()?;
        let state = StandardMartingaleState::new(config.base_bet);
        Ok(Self { config, state })
    }

    pub fn state(&self) -> &StandardMartingaleState {
        &self.state
    }

    /// Play one spin with `portfolio` available. Returns the spin's net result.
    pub fn play(&mut self, number: WheelNumber, portfolio: f64) -> f64 {
        let wager = self.state.current_bet.min(portfolio);
        if wager <= 0.0 {
            return 0.0;
        }

        let s = &mut self.state;
        s.current_round += 1;
        s.total_wagered += wager;
        s.max_bet_reached = s.max_bet_reached.max(wager);

        let net = if self.config.bet.wins(number) {
            let won = wager * self.config.bet.win_multiplier();
            s.total_won += won;
            s.max_streak_survived = s.max_streak_survived.max(s.loss_streak);
            s.loss_streak = 0;
            s.current_bet = s.base_bet;
            won - wager
        } else {
            s.loss_streak += 1;
            let doubled = s.current_bet * 2.0;
            let remaining = portfolio - wager;
            if doubled > self.config.max_bet || doubled > remaining {
                log::debug!(
                    "martingale reset after {} losses (next bet {doubled:.2}, remaining {remaining:.2})",
                    s.loss_streak
                );
                s.current_bet = s.base_bet;
                s.total_resets += 1;
            } else {
                s.current_bet = doubled;
            }
            -wager
        };

        s.net_result += net;
        net
    }

    /// Play every spin in order, stopping once the portfolio is empty.
    pub fn run(&mut self, spins: &[WheelNumber], starting_investment: f64) -> SimulationOutcome {
        let mut portfolio = starting_investment;
        let mut cumulative = 0.0;
        let mut results = Vec::with_capacity(spins.len());

        for (idx, &number) in spins.iter().enumerate() {
            if portfolio <= 0.0 {
                log::info!("portfolio exhausted after {idx} spins");
                break;
            }
            let net = self.play(number, portfolio);
            portfolio += net;
            cumulative += net;
            results.push(SpinResult {
                spin: idx as u32 + 1,
                drawn_number: number,
                spin_net_result: net,
                cumulative_earnings: cumulative,
                strategy_type: STRATEGY_NAME,
                standard_martingale_state: self.state.clone(),
            });
        }

        SimulationOutcome {
            starting_investment,
            final_earnings: cumulative,
            final_portfolio: portfolio,
            results,
        }
    }
}
