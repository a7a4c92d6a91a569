//! # Pulsenet
//!
//! A deterministic simulation engine for networks of pulse-exchanging nodes.
//!
//! Pulsenet models a set of small state machines wired together by a static
//! adjacency table. Pressing the "button" injects a single LOW pulse at the
//! broadcaster; the engine then drains the resulting cascade in strict FIFO
//! order until the network settles.
//!
//! ## Core Concepts
//!
//! - **Nodes**: three closed variants (`Broadcaster`, `Toggle`, `Coincidence`)
//!   sharing one receive/emit contract and one fingerprint contract.
//! - **Network**: owns the node arena, the adjacency table and the event
//!   queue. One `press_button` + `drain` is one simulation step.
//! - **Fingerprints**: a combined hash of every node's state identifies a
//!   global configuration, which is what makes cycles detectable.
//! - **Extrapolation**: `Extrapolator` tallies pulses over an arbitrary number
//!   of presses by skipping whole cycles once the state sequence repeats.
//! - **Terminator**: `first_low` finds the first press at which a target
//!   receives LOW by aligning the periods of the branches that feed it.
//!
//! ## Example Usage
//!
//! ```rust
//! use pulsenet::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let decls = parse_network("broadcaster -> a, b\n%a -> c\n%b -> c\n&c -> output")?;
//!     let mut network = Network::build(decls);
//!     let config = PulsenetConfig::default();
//!
//!     let report = Extrapolator::new(&config).tally(&mut network, 1)?;
//!     assert_eq!(report.tally, Tally { high: 3, low: 4 });
//!
//!     network.reset();
//!     let press = first_low(&mut network, "output", &config)?;
//!     assert_eq!(press, 1);
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Pulse Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod extrapolate;
pub mod parse;
pub mod terminator;

/// A prelude module for easy importing of the most common Pulsenet types.
pub mod prelude {
    pub use crate::common::{NodeId, NodeKind, Pulse};
    pub use crate::components::node::Node;
    pub use crate::components::watcher::{Watch, WatchSet};
    pub use crate::config::PulsenetConfig;
    pub use crate::engine::Network;
    pub use crate::error::{SimulationError, SimulationResult};
    pub use crate::events::{DrainReport, Event, Tally};
    pub use crate::extrapolate::{Cycle, Extrapolation, Extrapolator};
    pub use crate::parse::{parse_network, NodeDecl, ParseError};
    pub use crate::terminator::{first_low, first_low_brute_force};
}
