use anyhow::Result;
use colored::Colorize;
use pulsenet::prelude::*;
use pulsenet::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct MyHighlighter;

impl Highlighter for MyHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    // Embedded at compile time from the crate root.
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!("{}", "-----------------------------------------------------------------".dimmed());
    println!("{}", version_string);
    println!("{}", "-----------------------------------------------------------------".dimmed());
}

fn print_help() {
    println!("Available commands:");
    println!("  load <FILE>           - Loads a network description.");
    println!("  show                  - Prints every node and its destinations.");
    println!("  node <NAME>           - Prints one node's current state.");
    println!("  press [N]             - Presses the button N times (default 1).");
    println!("  trace                 - Presses once, printing every event.");
    println!("  tally <N>             - Counts pulses over N presses from the current state.");
    println!("  first [TARGET]        - Finds the first press delivering LOW to TARGET.");
    println!("  brute [TARGET] [MAX]  - Same, by pressing until it happens.");
    println!("  fingerprint           - Prints the global state fingerprint.");
    println!("  reset                 - Returns every node to its initial state.");
    println!("  exit                  - Quits the shell.");
}

/// Everything the shell keeps between commands.
struct Session {
    config: PulsenetConfig,
    network: Option<Network>,
    presses: u64,
}

impl Session {
    fn network(&mut self) -> Option<&mut Network> {
        if self.network.is_none() {
            println!("Error: no network loaded. Try 'load <FILE>'.");
        }
        self.network.as_mut()
    }

    async fn load(&mut self, path: &str) {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                println!("Error: cannot read '{}': {}", path, e);
                return;
            }
        };
        match parse_network(&text) {
            Ok(decls) => {
                let network = Network::build(decls).with_drain_ceiling(self.config.drain_step_ceiling);
                println!("--> Loaded {} nodes from '{}'.", network.len(), path);
                self.network = Some(network);
                self.presses = 0;
            }
            Err(e) => println!("Error: {}", e),
        }
    }

    fn press(&mut self, times: u64) {
        let Some(network) = self.network.as_mut() else {
            println!("Error: no network loaded. Try 'load <FILE>'.");
            return;
        };
        let mut total = Tally::default();
        for _ in 0..times {
            match network.press(&WatchSet::new()) {
                Ok(report) => total += report.tally,
                Err(e) => {
                    println!("Error: {}", e);
                    return;
                }
            }
            self.presses += 1;
        }
        println!(
            "--> {} presses: {} high, {} low (press #{} total)",
            times, total.high, total.low, self.presses
        );
    }

    fn trace(&mut self) {
        let Some(network) = self.network.as_mut() else {
            println!("Error: no network loaded. Try 'load <FILE>'.");
            return;
        };
        network.press_button();
        let result = network.drain_with(&WatchSet::new(), |event| {
            println!("<-- {}", event.to_string().dimmed());
        });
        match result {
            Ok(report) => {
                self.presses += 1;
                println!("--> {} events: {} high, {} low", report.steps, report.high(), report.low());
            }
            Err(e) => println!("Error: {}", e),
        }
    }

    /// Runs a query on a copy of the current network, off the async runtime.
    async fn query<T, F>(&mut self, query: F) -> Option<SimulationResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Network, &PulsenetConfig) -> SimulationResult<T> + Send + 'static,
    {
        let mut network = self.network()?.clone();
        let config = self.config.clone();
        match tokio::task::spawn_blocking(move || query(&mut network, &config)).await {
            Ok(result) => Some(result),
            Err(e) => {
                println!("Error: query task failed: {}", e);
                None
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    let config = PulsenetConfig::load(env::args().nth(1).as_deref())?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_target(false)
        .init();

    let mut session = Session {
        config,
        network: None,
        presses: 0,
    };

    let mut rl = Editor::new()?;
    let helper = MyHighlighter {};
    rl.set_helper(Some(helper));

    info!("{} shell ready.", ENGINE_NAME);
    println!("{} is ready. Type 'help' for commands or 'exit' to quit.", ENGINE_NAME.cyan());

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let readline = rl.readline(&prompt);
        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let args = line.split_whitespace().collect::<Vec<_>>();

                if let Some(command) = args.first() {
                    match *command {
                        "load" => {
                            if let Some(path) = args.get(1) {
                                session.load(path).await;
                            } else {
                                println!("Usage: load <FILE>");
                            }
                        }
                        "show" => {
                            if let Some(network) = session.network() {
                                print!("{}", network);
                            }
                        }
                        "node" => match (args.get(1), session.network()) {
                            (Some(name), Some(network)) => match network.node(name) {
                                Some(node) => println!("{}", node),
                                None => println!("'{}' is a sink (no declared node).", name),
                            },
                            (None, _) => println!("Usage: node <NAME>"),
                            _ => {}
                        },
                        "press" => {
                            match args.get(1).map(|n| n.parse::<u64>()).unwrap_or(Ok(1)) {
                                Ok(times) => session.press(times),
                                Err(_) => println!("Error: press count must be a number."),
                            }
                        }
                        "trace" => session.trace(),
                        "tally" => {
                            let Some(Ok(presses)) = args.get(1).map(|n| n.parse::<u64>()) else {
                                println!("Usage: tally <N>");
                                continue;
                            };
                            let result = session
                                .query(move |network, config| {
                                    Extrapolator::new(config).tally(network, presses)
                                })
                                .await;
                            match result {
                                Some(Ok(report)) => {
                                    println!(
                                        "--> {} high, {} low, product {}",
                                        report.tally.high,
                                        report.tally.low,
                                        report.tally.product().to_string().yellow()
                                    );
                                    if let Some(cycle) = report.cycle {
                                        println!(
                                            "--> Simulated {} presses; cycle of {} after {}.",
                                            report.simulated, cycle.length, cycle.start
                                        );
                                    }
                                }
                                Some(Err(e)) => println!("Error: {}", e),
                                None => {}
                            }
                        }
                        "first" => {
                            let target = args
                                .get(1)
                                .map(|t| t.to_string())
                                .unwrap_or_else(|| session.config.target.clone());
                            let label = target.clone();
                            let result = session
                                .query(move |network, config| first_low(network, &target, config))
                                .await;
                            match result {
                                Some(Ok(press)) => println!(
                                    "--> '{}' first receives LOW at press {}",
                                    label,
                                    press.to_string().yellow()
                                ),
                                Some(Err(e)) => println!("Error: {}", e),
                                None => {}
                            }
                        }
                        "brute" => {
                            let target = args
                                .get(1)
                                .map(|t| t.to_string())
                                .unwrap_or_else(|| session.config.target.clone());
                            let limit = match args.get(2).map(|n| n.parse::<u64>()) {
                                Some(Ok(limit)) => limit,
                                Some(Err(_)) => {
                                    println!("Error: limit must be a number.");
                                    continue;
                                }
                                None => session.config.watch_search_limit,
                            };
                            let label = target.clone();
                            let result = session
                                .query(move |network, _| {
                                    first_low_brute_force(network, &target, limit)
                                })
                                .await;
                            match result {
                                Some(Ok(press)) => println!(
                                    "--> '{}' first receives LOW at press {}",
                                    label,
                                    press.to_string().yellow()
                                ),
                                Some(Err(e)) => println!("Error: {}", e),
                                None => {}
                            }
                        }
                        "fingerprint" => {
                            if let Some(network) = session.network() {
                                println!("--> {:#018x}", network.fingerprint());
                            }
                        }
                        "reset" => {
                            if let Some(network) = session.network() {
                                network.reset();
                                session.presses = 0;
                                println!("--> Network reset.");
                            }
                        }
                        "help" => print_help(),
                        "exit" => break,
                        _ => println!("Unknown command: '{}'. Type 'help'.", line),
                    }
                }
            }
            Err(_) => {
                println!("Exiting pulseshell...");
                break;
            }
        }
    }

    Ok(())
}
