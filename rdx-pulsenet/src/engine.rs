//! The core engine: a network of nodes, its adjacency, and its event queue.

use crate::common::{NodeId, BROADCASTER};
use crate::components::node::Node;
use crate::components::watcher::WatchSet;
use crate::error::{SimulationError, SimulationResult};
use crate::events::{DrainReport, Event};
use crate::parse::NodeDecl;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use tracing::{debug, trace, warn};

/// Starting value for the combined network fingerprint.
const FINGERPRINT_SEED: u64 = 1234;

/// Default ceiling on the number of events a single drain may process.
pub const DEFAULT_DRAIN_STEP_CEILING: u64 = 1_000_000;

/// A pulse network.
///
/// Nodes live in an arena keyed by `NodeId`; a name-sorted index maps names
/// to keys and fixes the iteration order every fingerprint uses. The topology
/// is frozen at build time: only node state and the queue change afterwards.
#[derive(Debug, Clone)]
pub struct Network {
    nodes: SlotMap<NodeId, Node>,
    index: BTreeMap<String, NodeId>,
    adjacency: SecondaryMap<NodeId, Vec<String>>,
    queue: VecDeque<Event>,
    drain_step_ceiling: u64,
}

// Core implementation block for construction and propagation.
impl Network {
    /// Builds a network from parsed declarations.
    ///
    /// Every coincidence node tracks exactly the nodes that list it as a
    /// destination. A repeated name keeps its first declaration.
    pub fn build(decls: impl IntoIterator<Item = NodeDecl>) -> Self {
        let mut nodes = SlotMap::with_key();
        let mut index = BTreeMap::new();
        let mut adjacency = SecondaryMap::new();

        for decl in decls {
            if index.contains_key(&decl.name) {
                warn!("Ignoring duplicate declaration of `{}`.", decl.name);
                continue;
            }
            let id = nodes.insert(Node::new(decl.kind, decl.name.clone()));
            index.insert(decl.name, id);
            adjacency.insert(id, decl.destinations);
        }

        let mut wiring = Vec::new();
        for (source, &id) in &index {
            for dest in &adjacency[id] {
                if let Some(&dest_id) = index.get(dest) {
                    wiring.push((dest_id, source.clone()));
                }
            }
        }
        for (dest_id, source) in wiring {
            nodes[dest_id].register_input(&source);
        }

        if !index.contains_key(BROADCASTER) {
            warn!("Network has no `{}`; button presses will be sunk.", BROADCASTER);
        }
        debug!("Built network with {} nodes.", nodes.len());

        Self {
            nodes,
            index,
            adjacency,
            queue: VecDeque::new(),
            drain_step_ceiling: DEFAULT_DRAIN_STEP_CEILING,
        }
    }

    /// Sets the maximum number of events a single drain may process.
    pub fn with_drain_ceiling(mut self, ceiling: u64) -> Self {
        self.drain_step_ceiling = ceiling;
        self
    }

    /// Enqueues the button's LOW pulse to the broadcaster. Nothing is
    /// processed until the next drain.
    pub fn press_button(&mut self) {
        self.queue.push_back(Event::button_press());
    }

    /// Processes the queue to empty in strict FIFO order.
    pub fn drain(&mut self, watch: &WatchSet) -> SimulationResult<DrainReport> {
        self.drain_with(watch, |_| {})
    }

    /// Like `drain`, calling `on_event` with each event as it is dequeued.
    ///
    /// Events destined to undeclared names are counted and then dropped.
    /// Exceeding the drain ceiling clears the queue and fails.
    pub fn drain_with<F>(&mut self, watch: &WatchSet, mut on_event: F) -> SimulationResult<DrainReport>
    where
        F: FnMut(&Event),
    {
        let mut report = DrainReport {
            hits: watch.iter().map(|w| (w.clone(), false)).collect(),
            ..Default::default()
        };

        while let Some(event) = self.queue.pop_front() {
            if report.steps >= self.drain_step_ceiling {
                self.queue.clear();
                return Err(SimulationError::DrainCeilingExceeded {
                    ceiling: self.drain_step_ceiling,
                });
            }
            report.steps += 1;
            trace!("{}", event);
            on_event(&event);
            report.tally.count(event.pulse);
            for (w, fired) in report.hits.iter_mut() {
                if w.matches(&event) {
                    *fired = true;
                }
            }

            let Some(&id) = self.index.get(&event.destination) else {
                continue;
            };
            let Some(pulse) = self.nodes[id].receive(&event) else {
                continue;
            };
            let source = self.nodes[id].name();
            for dest in &self.adjacency[id] {
                self.queue.push_back(Event::new(source, pulse, dest.as_str()));
            }
        }

        debug!(
            "Drained {} events ({} high, {} low).",
            report.steps, report.tally.high, report.tally.low
        );
        Ok(report)
    }

    /// One full simulation step: press the button and drain.
    pub fn press(&mut self, watch: &WatchSet) -> SimulationResult<DrainReport> {
        self.press_button();
        self.drain(watch)
    }

    /// Combines every node's fingerprint, in name order, into one value.
    ///
    /// Each node is hashed with the running total as its seed, so two networks
    /// with identical node states agree regardless of how they were built.
    pub fn fingerprint(&self) -> u64 {
        self.index.values().fold(FINGERPRINT_SEED, |acc, &id| {
            acc.wrapping_add(self.nodes[id].fingerprint(acc))
        })
    }

    /// Restores every node to its initial state and empties the queue.
    pub fn reset(&mut self) {
        for node in self.nodes.values_mut() {
            node.reset();
        }
        self.queue.clear();
    }
}

// Read-only inspection of the topology and state.
impl Network {
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&id| &self.nodes[id])
    }

    /// Declared destinations of `name`, in declaration order.
    pub fn destinations(&self, name: &str) -> Option<&[String]> {
        self.index
            .get(name)
            .map(|&id| self.adjacency[id].as_slice())
    }

    /// Names of the nodes whose destinations include `name`, sorted.
    pub fn feeders(&self, name: &str) -> Vec<&str> {
        self.index
            .iter()
            .filter(|(_, &id)| self.adjacency[id].iter().any(|d| d == name))
            .map(|(source, _)| source.as_str())
            .collect()
    }

    /// Declared node names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn drain_step_ceiling(&self) -> u64 {
        self.drain_step_ceiling
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &id in self.index.values() {
            writeln!(f, "{} -> {}", self.nodes[id], self.adjacency[id].join(", "))?;
        }
        Ok(())
    }
}
