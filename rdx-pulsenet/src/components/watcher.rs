//! Defines watchers that observe the event stream without altering it.
//!
//! A `Watch` is a predicate over dequeued events. A `WatchSet` is handed to
//! `Network::drain`, which reports which predicates fired. A `WatchLedger`
//! accumulates those reports across presses so that periodic behaviour can be
//! measured.

use crate::common::Pulse;
use crate::events::{DrainReport, Event};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A predicate over dequeued events.
///
/// A watch without a `source` matches a pulse delivered to `destination` from
/// any sender.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Watch {
    pub source: Option<String>,
    pub destination: String,
    pub pulse: Pulse,
}

impl Watch {
    /// Matches any LOW pulse destined to `destination`.
    pub fn low_to(destination: impl Into<String>) -> Self {
        Self {
            source: None,
            destination: destination.into(),
            pulse: Pulse::Low,
        }
    }

    /// Matches `pulse` travelling along the edge `source -> destination`.
    pub fn edge(source: impl Into<String>, destination: impl Into<String>, pulse: Pulse) -> Self {
        Self {
            source: Some(source.into()),
            destination: destination.into(),
            pulse,
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        event.pulse == self.pulse
            && event.destination == self.destination
            && self
                .source
                .as_deref()
                .map_or(true, |source| source == event.source)
    }

    /// The node this watch is about: the sender of an edge watch, otherwise
    /// the destination.
    pub fn subject(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.destination)
    }
}

impl fmt::Display for Watch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{} -{}-> {}", source, self.pulse, self.destination),
            None => write!(f, "* -{}-> {}", self.pulse, self.destination),
        }
    }
}

/// The set of predicates a drain should report on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSet {
    watches: BTreeSet<Watch>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watches for a LOW pulse delivered to each of `names`.
    pub fn low_to<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(Watch::low_to).collect()
    }

    pub fn insert(&mut self, watch: Watch) -> bool {
        self.watches.insert(watch)
    }

    pub fn with(mut self, watch: Watch) -> Self {
        self.watches.insert(watch);
        self
    }

    pub fn contains(&self, watch: &Watch) -> bool {
        self.watches.contains(watch)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Watch> {
        self.watches.iter()
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}

impl FromIterator<Watch> for WatchSet {
    fn from_iter<T: IntoIterator<Item = Watch>>(iter: T) -> Self {
        Self {
            watches: iter.into_iter().collect(),
        }
    }
}

/// Press indices at which each watch fired, kept up to a fixed depth.
///
/// The ledger is an explicit value: callers thread it through their scan and
/// get the updated ledger back from `observe`.
#[derive(Debug, Clone)]
pub struct WatchLedger {
    depth: usize,
    presses: BTreeMap<Watch, Vec<u64>>,
}

impl WatchLedger {
    /// Creates a ledger that remembers the first `depth` hits of every watch.
    pub fn new(watches: &WatchSet, depth: usize) -> Self {
        Self {
            depth,
            presses: watches.iter().map(|w| (w.clone(), Vec::new())).collect(),
        }
    }

    /// Folds one drain's hits, recorded as press number `press`, into the
    /// ledger.
    pub fn observe(mut self, press: u64, report: &DrainReport) -> Self {
        for (watch, seen) in self.presses.iter_mut() {
            if seen.len() < self.depth && report.hit(watch) {
                seen.push(press);
            }
        }
        self
    }

    /// Recorded press indices for `watch`, oldest first.
    pub fn hits(&self, watch: &Watch) -> &[u64] {
        self.presses.get(watch).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True once every watch has reached the ledger's depth.
    pub fn is_complete(&self) -> bool {
        self.presses.values().all(|seen| seen.len() >= self.depth)
    }

    /// The first watch (in watch order) that is still short of hits.
    pub fn first_incomplete(&self) -> Option<&Watch> {
        self.presses
            .iter()
            .find(|(_, seen)| seen.len() < self.depth)
            .map(|(watch, _)| watch)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Watch, &[u64])> {
        self.presses.iter().map(|(w, seen)| (w, seen.as_slice()))
    }
}
