//! Tallies pulse traffic over many presses by detecting repeated states.
//!
//! The global state space of a network is finite and every press is
//! deterministic, so the sequence of fingerprints taken after each press is
//! eventually periodic. The extrapolator caches what each press did from each
//! state it has seen; once a state comes around again it skips whole cycles
//! arithmetically and walks the remainder through the cache.

use crate::components::watcher::WatchSet;
use crate::config::PulsenetConfig;
use crate::engine::Network;
use crate::error::{SimulationError, SimulationResult};
use crate::events::Tally;
use ahash::AHashMap as Map;
use tracing::{debug, info};

/// What one press did when taken from a given state.
#[derive(Debug, Clone, Copy)]
struct PressRecord {
    /// Pulses counted during the press.
    tally: Tally,
    /// Fingerprint after the press.
    next: u64,
    /// Zero-based index of the press.
    press: u64,
    /// Totals accumulated before the press.
    before: Tally,
}

/// A repeating stretch of the fingerprint sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    /// Number of presses before the cycle is first entered.
    pub start: u64,
    /// Number of presses per repetition.
    pub length: u64,
}

/// The result of `Extrapolator::tally`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extrapolation {
    /// Cumulative counts over the requested presses.
    pub tally: Tally,
    /// Presses actually simulated.
    pub simulated: u64,
    /// The cycle that allowed skipping, if one was reached.
    pub cycle: Option<Cycle>,
    /// Press count after which the network first returned to its starting
    /// state, if it did while simulating.
    pub start_reentry: Option<u64>,
    /// Fingerprint of the state after the requested presses.
    pub fingerprint: u64,
}

/// Cycle-skipping pulse counter.
#[derive(Debug, Clone)]
pub struct Extrapolator {
    limit: u64,
}

impl Extrapolator {
    pub fn new(config: &PulsenetConfig) -> Self {
        Self::with_limit(config.cycle_search_limit)
    }

    /// An extrapolator that simulates at most `limit` presses.
    pub fn with_limit(limit: u64) -> Self {
        Self { limit }
    }

    /// Counts HIGH and LOW pulses over `presses` button presses.
    ///
    /// Presses are simulated until a fingerprint repeats; after that no
    /// further simulation happens and `network` is left in the state of the
    /// last simulated press. Fails with `NoCycleFound` if presses remain once
    /// the simulation limit is spent, and with `TallyOverflow` if either count
    /// would exceed `u64::MAX`.
    pub fn tally(&self, network: &mut Network, presses: u64) -> SimulationResult<Extrapolation> {
        let quiet = WatchSet::new();
        let start = network.fingerprint();
        let mut cache: Map<u64, PressRecord> = Map::new();
        let mut current = start;
        let mut total = Tally::default();
        let mut done = 0;
        let mut simulated = 0;
        let mut cycle = None;
        let mut start_reentry = None;
        let overflow = || SimulationError::TallyOverflow { presses };

        while done < presses {
            if let Some(record) = cache.get(&current).copied() {
                if cycle.is_none() {
                    let length = done - record.press;
                    let found = Cycle {
                        start: record.press,
                        length,
                    };
                    info!(
                        "Cycle of {} presses found after {} presses.",
                        found.length, done
                    );
                    let skipped = (presses - done) / length;
                    total = (total - record.before)
                        .checked_mul(skipped)
                        .and_then(|skip| total.checked_add(skip))
                        .ok_or_else(overflow)?;
                    done += skipped * length;
                    cycle = Some(found);
                    continue;
                }
                total = total.checked_add(record.tally).ok_or_else(overflow)?;
                current = record.next;
                done += 1;
                continue;
            }

            if simulated >= self.limit {
                return Err(SimulationError::NoCycleFound { simulated });
            }
            let report = network.press(&quiet)?;
            simulated += 1;
            let next = network.fingerprint();
            cache.insert(
                current,
                PressRecord {
                    tally: report.tally,
                    next,
                    press: done,
                    before: total,
                },
            );
            total = total.checked_add(report.tally).ok_or_else(overflow)?;
            current = next;
            done += 1;

            if current == start && start_reentry.is_none() {
                debug!("Returned to the starting state after {} presses.", done);
                start_reentry = Some(done);
            }
        }

        Ok(Extrapolation {
            tally: total,
            simulated,
            cycle,
            start_reentry,
            fingerprint: current,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_network;

    // Three-bit ripple counter: eight distinct states, then back to the start.
    const COUNTER: &str = "broadcaster -> t0\n%t0 -> t1, g\n%t1 -> t2, g\n%t2 -> g\n&g -> out";

    fn counter() -> Network {
        Network::build(parse_network(COUNTER).unwrap())
    }

    fn brute_force(mut network: Network, presses: u64) -> Tally {
        let mut total = Tally::default();
        for _ in 0..presses {
            total += network.press(&WatchSet::new()).unwrap().tally;
        }
        total
    }

    #[test]
    fn matches_brute_force_inside_first_cycle() {
        let result = Extrapolator::with_limit(100)
            .tally(&mut counter(), 5)
            .unwrap();
        assert_eq!(result.tally, brute_force(counter(), 5));
        assert_eq!(result.simulated, 5);
        assert_eq!(result.cycle, None);
    }

    #[test]
    fn matches_brute_force_far_outside_cycle() {
        let result = Extrapolator::with_limit(100)
            .tally(&mut counter(), 1000)
            .unwrap();
        assert_eq!(result.tally, brute_force(counter(), 1000));
        assert_eq!(result.simulated, 8);
        assert_eq!(result.cycle, Some(Cycle { start: 0, length: 8 }));
        assert_eq!(result.start_reentry, Some(8));
    }

    #[test]
    fn remainder_walk_matches_brute_force() {
        for presses in [9, 13, 15, 17, 1003] {
            let result = Extrapolator::with_limit(100)
                .tally(&mut counter(), presses)
                .unwrap();
            assert_eq!(result.tally, brute_force(counter(), presses), "presses = {}", presses);
        }
    }

    #[test]
    fn astronomically_many_presses() {
        let per_cycle = brute_force(counter(), 8);
        let result = Extrapolator::with_limit(100)
            .tally(&mut counter(), 8 * 1_000_000_000_000)
            .unwrap();
        assert_eq!(result.tally, per_cycle * 1_000_000_000_000);
        assert_eq!(result.simulated, 8);
    }

    #[test]
    fn final_fingerprint_is_logical_state() {
        let mut reference = counter();
        for _ in 0..3 {
            reference.press(&WatchSet::new()).unwrap();
        }
        let result = Extrapolator::with_limit(100)
            .tally(&mut counter(), 8 * 50 + 3)
            .unwrap();
        assert_eq!(result.fingerprint, reference.fingerprint());
    }

    #[test]
    fn zero_presses_is_empty() {
        let result = Extrapolator::with_limit(0).tally(&mut counter(), 0).unwrap();
        assert_eq!(result.tally, Tally::default());
        assert_eq!(result.simulated, 0);
    }

    #[test]
    fn exhausted_limit_reports_no_cycle() {
        let result = Extrapolator::with_limit(4).tally(&mut counter(), 100);
        assert_eq!(result, Err(SimulationError::NoCycleFound { simulated: 4 }));
    }

    #[test]
    fn counts_beyond_u64_fail_instead_of_wrapping() {
        let scenario = "broadcaster -> a, b\n%a -> c\n%b -> c\n&c -> output";
        let mut network = Network::build(parse_network(scenario).unwrap());
        let result = Extrapolator::with_limit(10).tally(&mut network, u64::MAX);
        assert_eq!(
            result,
            Err(SimulationError::TallyOverflow { presses: u64::MAX })
        );

        // The counter carries 30 LOW per eight presses.
        let result = Extrapolator::with_limit(100).tally(&mut counter(), 10_000_000_000_000_000_000);
        assert!(matches!(result, Err(SimulationError::TallyOverflow { .. })));
    }

    #[test]
    fn limit_only_matters_when_presses_remain() {
        let result = Extrapolator::with_limit(4).tally(&mut counter(), 4).unwrap();
        assert_eq!(result.tally, brute_force(counter(), 4));
    }
}
