//! Defines the node state machines and their fingerprint contract.

use crate::common::{NodeKind, Pulse};
use crate::events::Event;
use ahash::RandomState;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

// Fixed secondary seeds so a fingerprint depends only on the caller's seed.
const SEED_1: u64 = 0x243f_6a88_85a3_08d3;
const SEED_2: u64 = 0x1319_8a2e_0370_7344;
const SEED_3: u64 = 0xa409_3822_299f_31d0;

/// A single node of a pulse network.
///
/// The variant set is closed; every node answers `receive` and
/// `fingerprint`, and only touches its own state while doing so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Stateless passthrough.
    Broadcaster { name: String },
    /// Holds one bit. HIGH pulses are ignored.
    Toggle { name: String, active: bool },
    /// Remembers the last pulse from each input, keyed by input name.
    Coincidence {
        name: String,
        memory: BTreeMap<String, Pulse>,
    },
}

impl Node {
    /// Creates a node of the given kind in its initial state.
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        let name = name.into();
        match kind {
            NodeKind::Broadcaster => Node::Broadcaster { name },
            NodeKind::Toggle => Node::Toggle {
                name,
                active: false,
            },
            NodeKind::Coincidence => Node::Coincidence {
                name,
                memory: BTreeMap::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Broadcaster { name } | Node::Toggle { name, .. } | Node::Coincidence { name, .. } => {
                name
            }
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Broadcaster { .. } => NodeKind::Broadcaster,
            Node::Toggle { .. } => NodeKind::Toggle,
            Node::Coincidence { .. } => NodeKind::Coincidence,
        }
    }

    /// Tracks `input` as a sender, starting from LOW.
    ///
    /// Only called while a network is being built; has no effect on other
    /// variants.
    pub(crate) fn register_input(&mut self, input: &str) {
        if let Node::Coincidence { memory, .. } = self {
            memory.insert(input.to_string(), Pulse::Low);
        }
    }

    /// Handles an incoming event and returns the pulse to send to every
    /// destination of this node, or `None` if the node stays silent.
    pub fn receive(&mut self, incoming: &Event) -> Option<Pulse> {
        match self {
            Node::Broadcaster { .. } => Some(incoming.pulse),
            Node::Toggle { active, .. } => {
                if incoming.pulse.is_high() {
                    return None;
                }
                *active = !*active;
                Some(Pulse::from(*active))
            }
            Node::Coincidence { memory, .. } => {
                // Senders outside the build-time input set are not tracked.
                if let Some(last) = memory.get_mut(&incoming.source) {
                    *last = incoming.pulse;
                }
                if memory.values().all(|pulse| pulse.is_high()) {
                    Some(Pulse::Low)
                } else {
                    Some(Pulse::High)
                }
            }
        }
    }

    /// Hashes this node's name and current state under `seed`.
    pub fn fingerprint(&self, seed: u64) -> u64 {
        let mut hasher = RandomState::with_seeds(seed, SEED_1, SEED_2, SEED_3).build_hasher();
        self.kind().hash(&mut hasher);
        self.name().hash(&mut hasher);
        match self {
            Node::Broadcaster { .. } => {}
            Node::Toggle { active, .. } => active.hash(&mut hasher),
            Node::Coincidence { memory, .. } => {
                for (input, pulse) in memory {
                    input.hash(&mut hasher);
                    pulse.hash(&mut hasher);
                }
            }
        }
        hasher.finish()
    }

    /// Returns the node to the state it was built in.
    pub fn reset(&mut self) {
        match self {
            Node::Broadcaster { .. } => {}
            Node::Toggle { active, .. } => *active = false,
            Node::Coincidence { memory, .. } => {
                memory.values_mut().for_each(|pulse| *pulse = Pulse::Low);
            }
        }
    }

    /// The inputs a coincidence node tracks, in name order. Empty otherwise.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        let memory = match self {
            Node::Coincidence { memory, .. } => Some(memory),
            _ => None,
        };
        memory.into_iter().flat_map(|m| m.keys().map(String::as_str))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Broadcaster { name } => write!(f, "{}(broadcaster)", name),
            Node::Toggle { name, active } => {
                write!(f, "{}(toggle:{})", name, if *active { "on" } else { "off" })
            }
            Node::Coincidence { name, memory } => {
                let remembered = memory
                    .iter()
                    .map(|(input, pulse)| format!("{}={}", input, pulse))
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{}(coincidence:{})", name, remembered)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn low_from(source: &str) -> Event {
        Event::new(source, Pulse::Low, "node")
    }

    fn high_from(source: &str) -> Event {
        Event::new(source, Pulse::High, "node")
    }

    fn coincidence(inputs: &[&str]) -> Node {
        let mut node = Node::new(NodeKind::Coincidence, "c");
        for input in inputs {
            node.register_input(input);
        }
        node
    }

    #[test]
    fn broadcaster_repeats_pulse() {
        let mut node = Node::new(NodeKind::Broadcaster, "broadcaster");
        assert_eq!(node.receive(&low_from("button")), Some(Pulse::Low));
        assert_eq!(node.receive(&high_from("button")), Some(Pulse::High));
    }

    #[test]
    fn toggle_ignores_high() {
        let mut node = Node::new(NodeKind::Toggle, "t");
        let before = node.fingerprint(7);
        assert_eq!(node.receive(&high_from("x")), None);
        assert_eq!(node.fingerprint(7), before);
        assert_eq!(node, Node::new(NodeKind::Toggle, "t"));
    }

    #[test]
    fn toggle_is_self_inverse_over_two_lows() {
        let mut node = Node::new(NodeKind::Toggle, "t");
        let original = node.fingerprint(42);

        assert_eq!(node.receive(&low_from("x")), Some(Pulse::High));
        let flipped = node.fingerprint(42);
        assert_ne!(flipped, original);

        assert_eq!(node.receive(&low_from("x")), Some(Pulse::Low));
        assert_eq!(node.fingerprint(42), original);
    }

    #[test]
    fn coincidence_emits_low_only_when_all_high() {
        let mut node = coincidence(&["a", "b"]);
        assert_eq!(node.receive(&high_from("a")), Some(Pulse::High));
        assert_eq!(node.receive(&high_from("b")), Some(Pulse::Low));
        // One input falls back to LOW: the very next receive must emit HIGH.
        assert_eq!(node.receive(&low_from("a")), Some(Pulse::High));
    }

    #[test]
    fn coincidence_single_input_inverts() {
        let mut node = coincidence(&["a"]);
        assert_eq!(node.receive(&high_from("a")), Some(Pulse::Low));
        assert_eq!(node.receive(&low_from("a")), Some(Pulse::High));
    }

    #[test]
    fn coincidence_ignores_untracked_sender() {
        let mut node = coincidence(&["a"]);
        assert_eq!(node.receive(&high_from("stranger")), Some(Pulse::High));
        assert_eq!(node.inputs().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn coincidence_fingerprint_tracks_memory() {
        let mut node = coincidence(&["b", "a"]);
        let initial = node.fingerprint(1);
        node.receive(&high_from("a"));
        assert_ne!(node.fingerprint(1), initial);
        node.receive(&low_from("a"));
        assert_eq!(node.fingerprint(1), initial);
    }

    #[test]
    fn fingerprint_depends_on_name_and_seed() {
        let a = Node::new(NodeKind::Toggle, "a");
        let b = Node::new(NodeKind::Toggle, "b");
        assert_ne!(a.fingerprint(0), b.fingerprint(0));
        assert_ne!(a.fingerprint(0), a.fingerprint(1));
        assert_eq!(a.fingerprint(9), a.clone().fingerprint(9));
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut node = coincidence(&["a"]);
        node.receive(&high_from("a"));
        node.reset();
        assert_eq!(node, coincidence(&["a"]));
    }
}
