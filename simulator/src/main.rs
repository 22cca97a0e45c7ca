//! ChipVault Simulator
//!
//! Test environment exercising the credit ledger against a simulated token.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod metrics;
mod scenario;
mod token;

use controller::SimulationController;
use scenario::Scenario;

/// ChipVault Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "ChipVault test and simulation environment")]
struct Args {
    /// Number of simulated players to create
    #[arg(short, long, default_value = "3")]
    players: usize,

    /// Initial token balance minted to each player
    #[arg(short, long, default_value = "100")]
    tokens: u64,

    /// Scenario to run
    #[arg(short, long)]
    scenario: Option<String>,

    /// Randomized rounds to run when no scenario is given
    #[arg(short, long, default_value = "100")]
    rounds: u64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Dump the ledger event journal as JSON at the end of the run
    #[arg(long)]
    dump_events: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting ChipVault Simulator");
    info!("Players: {}", args.players);

    let mut controller = SimulationController::new(args.players, args.tokens, args.seed)?;

    if let Some(scenario_name) = &args.scenario {
        info!("Running scenario: {}", scenario_name);

        let scenario = Scenario::load(scenario_name)?;
        controller.run_scenario(&scenario)?;
    } else {
        controller.run_random(args.rounds)?;
    }

    // Print metrics
    let metrics = controller.metrics();
    info!("Simulation complete");
    info!("Total operations: {}", metrics.total_operations);
    info!("Successful: {}", metrics.successful_operations);
    info!("Rejected: {}", metrics.failed_operations);
    info!("Success rate: {:.2}", metrics.success_rate());
    info!("Credits issued: {}", metrics.credits_issued);
    info!("Credits awarded: {}", metrics.credits_awarded);
    info!("Credits spent: {}", metrics.credits_spent);
    info!("Credits redeemed: {}", metrics.credits_redeemed);
    info!("Credits outstanding: {}", metrics.credits_outstanding());
    info!("Tokens paid out: {}", metrics.tokens_paid);
    info!("Vault reserve: {}", controller.ledger().reserve());

    if args.dump_events {
        let events = controller.ledger().events();
        println!("{}", serde_json::to_string_pretty(&events)?);
    }

    Ok(())
}
