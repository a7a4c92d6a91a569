use anyhow::{Context, Result};
use colored::Colorize;
use pulsenet::prelude::*;
use pulsenet::{ENGINE_NAME, VERSION};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Resolve the input file and optional config file from the command line.
    let mut args = env::args().skip(1);
    let input_path = args.next().unwrap_or_else(|| "input.txt".to_string());
    let config_path = args.next();

    // 2. Load the configuration, then initialize structured logging from it.
    let config = PulsenetConfig::load(config_path.as_deref())?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_target(false)
        .init();
    info!("{} v{} starting with {:?}", ENGINE_NAME, VERSION, config);

    // 3. Parse the network description.
    let text = tokio::fs::read_to_string(&input_path)
        .await
        .with_context(|| format!("cannot read `{}`", input_path))?;
    let decls = parse_network(&text)?;
    let network = Network::build(decls).with_drain_ceiling(config.drain_step_ceiling);
    info!("Loaded {} nodes from `{}`.", network.len(), input_path);

    // 4. Run both queries off the async runtime, abandoning them on Ctrl+C.
    let queries = tokio::task::spawn_blocking(move || run_queries(network, &config));
    tokio::select! {
        outcome = queries => outcome??,
        _ = tokio::signal::ctrl_c() => warn!("Interrupted; abandoning the search."),
    }

    Ok(())
}

/// Tallies the configured number of presses, then searches for the target's
/// first LOW on a fresh copy of the network.
fn run_queries(network: Network, config: &PulsenetConfig) -> Result<()> {
    let mut tally_net = network.clone();
    let extrapolation = Extrapolator::new(config).tally(&mut tally_net, config.presses)?;
    let tally = extrapolation.tally;
    println!(
        "{} {} presses: {} high, {} low, product {}",
        "[TALLY]".cyan().bold(),
        config.presses,
        tally.high,
        tally.low,
        tally.product().to_string().yellow()
    );
    if let Some(cycle) = extrapolation.cycle {
        info!(
            "Simulated {} presses; cycle of {} entered after {}.",
            extrapolation.simulated, cycle.length, cycle.start
        );
    }

    let mut search_net = network;
    match first_low(&mut search_net, &config.target, config) {
        Ok(press) => println!(
            "{} `{}` first receives LOW at press {}",
            "[TARGET]".cyan().bold(),
            config.target,
            press.to_string().yellow()
        ),
        Err(SimulationError::UnknownTarget(target)) => {
            warn!("`{}` is not fed by any node; skipping the search.", target)
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
