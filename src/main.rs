use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use circuitsim::{
    circuit_sim::NodeKind, config::EngineConfig, project::ProjectFile, simulator::SimState,
    PinId, Simulator,
};

/// Run a saved circuit headlessly and print its LEDs every tick.
#[derive(Parser, Debug)]
#[command(name = "circuitsim", version)]
struct Args {
    /// Project file to load (`*.circuit.json`).
    project: PathBuf,

    /// Number of ticks to simulate.
    #[arg(short, long, default_value_t = 10)]
    ticks: u64,

    /// Engine config as JSON, e.g. `{ "maxPasses": 200 }`.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let project = ProjectFile::load(&args.project)?;
    info!(name = %project.project_name, nodes = project.nodes.len(), "loaded project");

    let mut sim = Simulator::new(project.into_circuit()?, config);
    let displays: Vec<(String, PinId)> = sim
        .circuit()
        .nodes()
        .filter(|node| node.kind == NodeKind::SignalDisplay)
        .filter_map(|node| {
            let label = node
                .title
                .clone()
                .unwrap_or_else(|| format!("{}#{}", node.kind.default_title(), node.id.0));
            Some((label, *node.output_pins.first()?))
        })
        .collect();

    sim.set_state(SimState::Running);
    for _ in 0..args.ticks {
        let report = sim.step();
        let leds: Vec<String> = displays
            .iter()
            .map(|(label, pin)| format!("{label}={}", sim.circuit().pin_value(*pin)))
            .collect();
        println!(
            "tick {:>5}: {}{}",
            report.tick,
            leds.join(" "),
            if report.oscillating { "  (oscillating)" } else { "" }
        );
    }
    Ok(())
}
