//! sim-runner: headless roulette strategy runner.
//!
//! Usage:
//!   sim-runner --seed 12345 --spins 1000
//!   sim-runner --seed 12345 --runs 8 --db database/rosistat.db --user demo-user
//!   sim-runner --config sim.json --spins 500

use anyhow::{Context, Result};
use rosistat_core::{
    config::SimulationConfig,
    martingale::{SimulationOutcome, StandardMartingale},
    rng::SeedBank,
    spins::SpinGenerator,
    store::SimStore,
    streak::analyze_streak_patterns,
    types::{JsonMap, WheelNumber},
};
use serde_json::json;
use std::{env, path::Path};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let spins = parse_arg(&args, "--spins", 1_000usize);
    let runs = parse_arg(&args, "--runs", 1u64);
    let start = parse_arg(&args, "--start", 10_000.0f64);
    let db = flag_value(&args, "--db");
    let migrations = flag_value(&args, "--migrations").unwrap_or("database/migrations");
    let user = flag_value(&args, "--user");

    let config = match flag_value(&args, "--config") {
        Some(path) => SimulationConfig::load(Path::new(path))
            .with_context(|| format!("loading config {path}"))?,
        None => SimulationConfig::default(),
    };

    println!("Rosistat sim-runner");
    println!("  started:   {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  seed:      {seed}");
    println!("  runs:      {runs}");
    println!("  spins:     {spins}");
    println!("  start:     {start:.2}");
    println!("  streaks:   {}", if config.streaks.realistic_streaks_enabled { "realistic" } else { "uniform" });
    println!("  db:        {}", db.unwrap_or("(none)"));
    println!();

    let store = match db {
        Some(path) => {
            let store = SimStore::open(path)?;
            store
                .migrate(Path::new(migrations))
                .with_context(|| format!("migrating {path}"))?;
            Some(store)
        }
        None => None,
    };

    let bank = SeedBank::new(seed);
    for slot in 0..runs {
        let run_seed = bank.seed_for_run(slot);
        let mut generator = SpinGenerator::with_seed(run_seed, config.streaks.clone())?;
        let drawn = generator.take_spins(spins);

        let mut strategy = StandardMartingale::new(config.martingale.clone())?;
        let outcome = strategy.run(&drawn, start);
        print_summary(slot, run_seed, &drawn, &outcome);

        if let Some(store) = &store {
            let settings = run_settings(&config, run_seed)?;
            let simulation = outcome.new_simulation(user.map(str::to_string), settings);
            let id = store.create_simulation_with_spins(&simulation, |id| outcome.new_spins(id))?;
            log::info!("run {slot} saved as simulation {id}");
            println!("  saved as simulation {id}");
        }
        println!();
    }

    Ok(())
}

fn run_settings(config: &SimulationConfig, run_seed: u32) -> Result<JsonMap> {
    let mut settings = match serde_json::to_value(config)? {
        serde_json::Value::Object(map) => map,
        _ => JsonMap::new(),
    };
    settings.insert("seed".into(), json!(run_seed));
    Ok(settings)
}

fn print_summary(slot: u64, run_seed: u32, drawn: &[WheelNumber], outcome: &SimulationOutcome) {
    let streaks = analyze_streak_patterns(drawn);

    println!("=== RUN {slot} (seed {run_seed}) ===");
    println!("  spins played:    {} of {}", outcome.results.len(), drawn.len());
    println!("  final earnings:  {:.2}", outcome.final_earnings);
    println!("  final portfolio: {:.2}", outcome.final_portfolio);
    if let Some(last) = outcome.results.last() {
        let state = &last.standard_martingale_state;
        println!("  total wagered:   {:.2}", state.total_wagered);
        println!("  largest bet:     {:.2}", state.max_bet_reached);
        println!("  resets:          {}", state.total_resets);
        println!("  worst streak:    {} losses survived", state.max_streak_survived);
    }
    if outcome.final_portfolio <= 0.0 {
        println!("  BUST");
    }
    match &streaks.longest_color_streak {
        Some(s) => println!(
            "  longest streak:  {} x{} from spin {}",
            s.color.name(),
            s.length,
            s.start_index + 1
        ),
        None => println!("  longest streak:  (none)"),
    }
    println!("  streaks > 5:     {}", streaks.total_streaks_over_5);
    println!("  streaks > 10:    {}", streaks.total_streaks_over_10);
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
