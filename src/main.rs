//! Fleet Odds - Entry Point
//!
//! Loads the static unit table, reads a battle scenario and prints the
//! estimated odds as JSON or text.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fleet_odds::battle::{
    BattleConfig, BattleResult, BattleSimulator, FleetConfig, Scenario, SeededStreams,
    DEFAULT_UNITS_PATH,
};
use fleet_odds::core::error::{FleetOddsError, Result};
use fleet_odds::core::types::UnitCategory;
use fleet_odds::units::{UnitSource, UnitStatsRepository};

/// Fleet Odds - estimate space battle outcomes by simulation
#[derive(Parser, Debug)]
#[command(name = "fleet-odds")]
#[command(about = "Estimate win/draw odds and expected losses for a two-fleet space battle")]
struct Args {
    /// Static unit table (.toml or .json)
    #[arg(long, default_value = DEFAULT_UNITS_PATH)]
    units: PathBuf,

    /// Scenario file describing both fleets
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Simulation effort: low, medium or high
    #[arg(long)]
    usage: Option<String>,

    /// Exact number of trials (overrides usage)
    #[arg(long)]
    simulations: Option<u32>,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,

    /// List known factions and exit
    #[arg(long)]
    list_factions: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fleet_odds=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        tracing::error!(error = %e, "Simulation aborted");
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let repo = UnitStatsRepository::from_source(&UnitSource::Path(args.units.clone()))?;

    if args.list_factions {
        for (id, name) in repo.factions()? {
            println!("{:<28} {}", id, name);
        }
        return Ok(());
    }

    let mut scenario = match &args.scenario {
        Some(path) => Scenario::from_file(path)?,
        None => Scenario::default(),
    };
    if args.usage.is_some() {
        scenario.usage = args.usage.clone();
        scenario.simulations = None;
    }

    let battle = if args.scenario.is_some() {
        scenario.battle_config(&repo, args.simulations)?
    } else {
        demo_battle(scenario.simulation_count(args.simulations))
    };

    let seed = args.seed.or(scenario.seed).unwrap_or_else(rand::random);
    let simulator = BattleSimulator::with_config(&repo, scenario.simulation.clone());
    let result = simulator.simulate(&battle, &SeededStreams::new(seed))?;

    match args.format.as_str() {
        "json" => println!("{}", render_json(&result)?),
        _ => print_text(&battle, &result, seed),
    }
    Ok(())
}

fn render_json(result: &BattleResult) -> Result<String> {
    serde_json::to_string_pretty(result).map_err(FleetOddsError::Output)
}

/// Fleets used when no scenario file is given
fn demo_battle(simulations: u32) -> BattleConfig {
    let p1 = FleetConfig::new("Player 1")
        .with_ships(UnitCategory::Dreadnought, 2)
        .with_ships(UnitCategory::Cruiser, 3)
        .with_ships(UnitCategory::Fighter, 6);
    let p2 = FleetConfig::new("Player 2")
        .with_ships(UnitCategory::WarSun, 1)
        .with_ships(UnitCategory::Destroyer, 2)
        .with_ships(UnitCategory::Fighter, 8);
    BattleConfig::new(p1, p2, simulations)
}

fn print_text(battle: &BattleConfig, result: &BattleResult, seed: u64) {
    let p1 = &battle.player1;
    let p2 = &battle.player2;

    println!("Simulations: {} (seed {})", result.simulations, seed);
    println!("{} win: {:.1}%", p1.name, result.p1_win_rate * 100.0);
    println!("{} win: {:.1}%", p2.name, result.p2_win_rate * 100.0);
    println!("Draw: {:.1}%", result.draw_rate * 100.0);
    if result.stalemate_rate > 0.0 {
        println!("  of which stalemates: {:.1}%", result.stalemate_rate * 100.0);
    }
    println!("Average rounds: {:.2}", result.avg_rounds);

    for (fleet, losses, resources) in [
        (p1, &result.avg_losses_p1, result.avg_resource_loss_p1),
        (p2, &result.avg_losses_p2, result.avg_resource_loss_p2),
    ] {
        println!();
        let faction = fleet.faction().unwrap_or("no faction");
        println!("{} ({}) average losses:", fleet.name, faction);
        for (category, avg) in losses {
            println!(" - {}: {:.1}", category.display_name(), avg);
        }
        println!(" Resources lost: {:.1}", resources);
    }
}
