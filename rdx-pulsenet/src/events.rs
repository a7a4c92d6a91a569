//! Defines the event type that flows through a network and the reports a
//! drain produces.
//!
//! An `Event` is a single pending delivery. Reports aggregate what a drain (or
//! a run of drains) observed so that higher-level algorithms never have to
//! look at individual events.

use crate::common::{Pulse, BROADCASTER, BUTTON};
use crate::components::watcher::Watch;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

/// A pending, directed, single delivery of a pulse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub source: String,
    pub pulse: Pulse,
    pub destination: String,
}

impl Event {
    pub fn new(source: impl Into<String>, pulse: Pulse, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            pulse,
            destination: destination.into(),
        }
    }

    /// The synthetic LOW pulse injected by one button press.
    pub fn button_press() -> Self {
        Self::new(BUTTON, Pulse::Low, BROADCASTER)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -{}-> {}", self.source, self.pulse, self.destination)
    }
}

/// Cumulative HIGH/LOW pulse counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tally {
    pub high: u64,
    pub low: u64,
}

impl Tally {
    pub fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    /// Counts a single dequeued pulse.
    pub fn count(&mut self, pulse: Pulse) {
        match pulse {
            Pulse::High => self.high += 1,
            Pulse::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.high + self.low
    }

    /// Component-wise sum, or `None` if either count overflows.
    pub fn checked_add(self, rhs: Tally) -> Option<Tally> {
        Some(Tally {
            high: self.high.checked_add(rhs.high)?,
            low: self.low.checked_add(rhs.low)?,
        })
    }

    /// Both counts scaled by `times`, or `None` if either overflows.
    pub fn checked_mul(self, times: u64) -> Option<Tally> {
        Some(Tally {
            high: self.high.checked_mul(times)?,
            low: self.low.checked_mul(times)?,
        })
    }

    /// The product of both counts, saturating instead of overflowing.
    pub fn product(&self) -> u64 {
        self.high.saturating_mul(self.low)
    }
}

impl Add for Tally {
    type Output = Tally;

    fn add(self, rhs: Tally) -> Tally {
        Tally {
            high: self.high + rhs.high,
            low: self.low + rhs.low,
        }
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, rhs: Tally) {
        self.high += rhs.high;
        self.low += rhs.low;
    }
}

impl Sub for Tally {
    type Output = Tally;

    fn sub(self, rhs: Tally) -> Tally {
        Tally {
            high: self.high - rhs.high,
            low: self.low - rhs.low,
        }
    }
}

impl Mul<u64> for Tally {
    type Output = Tally;

    fn mul(self, times: u64) -> Tally {
        Tally {
            high: self.high * times,
            low: self.low * times,
        }
    }
}

/// What a single `Network::drain` observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Every dequeued event, counted by pulse.
    pub tally: Tally,
    /// Number of events processed, including those delivered to sinks.
    pub steps: u64,
    /// For each watch in the drain's `WatchSet`, whether it fired.
    pub hits: BTreeMap<Watch, bool>,
}

impl DrainReport {
    pub fn high(&self) -> u64 {
        self.tally.high
    }

    pub fn low(&self) -> u64 {
        self.tally.low
    }

    /// Whether `watch` fired during this drain. Unwatched predicates never do.
    pub fn hit(&self, watch: &Watch) -> bool {
        self.hits.get(watch).copied().unwrap_or(false)
    }
}
