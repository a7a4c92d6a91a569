//! Contains common, primitive types shared by every part of the engine.
//!
//! This module defines the pulse value carried by events, the node kinds a
//! network declaration can name, and the arena key used to address nodes.

use slotmap::new_key_type;
use std::fmt;

/// Name of the synthetic source that every button press originates from.
pub const BUTTON: &str = "button";

/// Name of the node that receives the button's pulse.
pub const BROADCASTER: &str = "broadcaster";

new_key_type! {
    /// Uniquely identifies a node within a `Network`'s arena.
    ///
    /// Keys are handed out once at build time. The topology never changes
    /// afterwards, so a key stays valid for the lifetime of its network.
    pub struct NodeId;
}

/// The only payload an event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pulse {
    Low,
    High,
}

impl Pulse {
    pub fn is_high(self) -> bool {
        self == Pulse::High
    }

    pub fn is_low(self) -> bool {
        self == Pulse::Low
    }
}

impl From<bool> for Pulse {
    fn from(high: bool) -> Self {
        if high {
            Pulse::High
        } else {
            Pulse::Low
        }
    }
}

impl fmt::Display for Pulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pulse::High => f.write_str("high"),
            Pulse::Low => f.write_str("low"),
        }
    }
}

/// The behavioural variant a node is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Retransmits every pulse unchanged.
    Broadcaster,
    /// Bistable; flips on LOW, ignores HIGH.
    Toggle,
    /// Emits LOW only when every tracked input last sent HIGH.
    Coincidence,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Broadcaster => f.write_str("broadcaster"),
            NodeKind::Toggle => f.write_str("toggle"),
            NodeKind::Coincidence => f.write_str("coincidence"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_from_bool() {
        assert_eq!(Pulse::from(true), Pulse::High);
        assert_eq!(Pulse::from(false), Pulse::Low);
        assert!(Pulse::High.is_high());
        assert!(Pulse::Low.is_low());
    }

    #[test]
    fn pulse_display() {
        assert_eq!(Pulse::High.to_string(), "high");
        assert_eq!(Pulse::Low.to_string(), "low");
    }
}
