//! Core of the Rosistat roulette strategy simulator.
//!
//! Two independent halves:
//!   - spin generation: `rng` (MT19937), `streak` (run amplification),
//!     `spins` (the pull-based generator), with `wheel`, `bet` and
//!     `martingale` to play a strategy against the drawn numbers;
//!   - persistence: `migrate` (ordered, once-only schema migrations) and
//!     `store` (the SQLite DAO behind the HTTP API).

pub mod bet;
pub mod config;
pub mod error;
pub mod martingale;
pub mod migrate;
pub mod rng;
pub mod spins;
pub mod store;
pub mod streak;
pub mod types;
pub mod wheel;
