use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use radio_resource_scheduler::domain::scheduler::utils::statistics::StatisticsWriter;
use radio_resource_scheduler::domain::simulator::context::SimulationContext;
use radio_resource_scheduler::{load_scenario, logger};

/// Radio resource scheduler simulation
#[derive(Parser, Debug)]
#[command(name = "rrs-sim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario JSON file
    #[arg(short, long, default_value = "data/voip_scenario.json")]
    config: PathBuf,

    /// Number of rounds, overrides the scenario
    #[arg(short, long)]
    rounds: Option<u64>,

    /// Random seed, overrides the scenario
    #[arg(long)]
    seed: Option<u64>,

    /// Write one CSV row of statistics per round to this file
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace), overrides RUST_LOG
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.log_level {
        Some(level) => logger::init_with_level(level),
        None => logger::init(),
    }

    let config = cli.config.to_string_lossy().to_string();
    let (scenario, mut simulator, mut ctx) = load_scenario(&config).with_context(|| format!("loading scenario '{}'", config))?;

    if let Some(seed) = cli.seed {
        ctx = SimulationContext::new(seed, scenario.simulation.frame_duration);
    }

    let rounds = cli.rounds.unwrap_or(scenario.simulation.rounds);

    let mut writer = match &cli.stats {
        Some(path) => Some(StatisticsWriter::create(path).with_context(|| format!("creating statistics file '{}'", path.display()))?),
        None => None,
    };

    log::info!("Running {} rounds with seed {}.", rounds, ctx.get_seed());

    let summary = simulator.run(&mut ctx, rounds, writer.as_mut())?;

    println!("Strategy:              {}", simulator.get_strategy().get_name());
    println!("Rounds:                {}", summary.rounds);
    println!("Scheduled bits:        {} ({:.1} per round)", summary.scheduled_bits, summary.avg_bits_per_round());
    println!("Bursts:                {}", summary.bursts);
    println!("Persistent grants:     {} ({} new)", summary.persistent_grants, summary.new_persistent_grants);
    println!("Dynamic grants:        {}", summary.dynamic_grants);
    println!("HARQ grants:           {}", summary.harq_grants);
    println!("Relocations:           {}", summary.relocations);
    println!("Deferred connections:  {}", summary.deferred_connections);

    Ok(())
}
