//! Finds the first press at which a target node receives a LOW pulse.
//!
//! Brute force is hopeless when the answer is astronomically large, so
//! `first_low` watches the branches that feed the target, measures the press
//! at which each first fires and its period, and solves for the first press at
//! which all of them fire together. This assumes every branch is strictly
//! periodic from its first firing onwards; inputs that break the assumption
//! surface as `WatchNeverFires` or `BranchesNeverAlign`.

use crate::common::{NodeKind, Pulse};
use crate::components::watcher::{Watch, WatchLedger, WatchSet};
use crate::config::PulsenetConfig;
use crate::engine::Network;
use crate::error::{SimulationError, SimulationResult};
use tracing::{debug, info};

/// Chooses the watches whose joint firing delivers LOW to `target`.
///
/// When the target is fed by a single coincidence gate, each of the gate's
/// inputs is a branch and fires when it sends HIGH to the gate. Otherwise
/// each feeder is a branch and fires when it sends LOW to the target.
pub fn branch_watches(network: &Network, target: &str) -> SimulationResult<WatchSet> {
    let feeders = network.feeders(target);
    if feeders.is_empty() {
        return Err(SimulationError::UnknownTarget(target.to_string()));
    }

    if let [gate] = feeders.as_slice() {
        if let Some(node) = network.node(gate) {
            if node.kind() == NodeKind::Coincidence && node.inputs().next().is_some() {
                return Ok(node
                    .inputs()
                    .map(|input| Watch::edge(input, *gate, Pulse::High))
                    .collect());
            }
        }
    }

    Ok(feeders
        .into_iter()
        .map(|feeder| Watch::edge(feeder, target, Pulse::Low))
        .collect())
}

/// Returns the press index, counted from the network's current state, at
/// which `target` first receives LOW.
///
/// A LOW seen directly during the scan is returned as is. Otherwise every
/// branch must fire twice within `config.watch_search_limit` presses, and the
/// answer is the first press at which all branches line up.
pub fn first_low(network: &mut Network, target: &str, config: &PulsenetConfig) -> SimulationResult<u64> {
    let branches = branch_watches(network, target)?;
    let direct = Watch::low_to(target);
    let watched = branches.iter().cloned().collect::<WatchSet>().with(direct.clone());
    info!("Watching {} branches of `{}`.", branches.len(), target);

    let mut ledger = WatchLedger::new(&branches, 2);
    let limit = config.watch_search_limit;
    for press in 1..=limit {
        let report = network.press(&watched)?;
        if report.hit(&direct) {
            info!("`{}` received LOW directly at press {}.", target, press);
            return Ok(press);
        }
        ledger = ledger.observe(press, &report);
        if ledger.is_complete() {
            break;
        }
    }

    if let Some(missing) = ledger.first_incomplete() {
        return Err(SimulationError::WatchNeverFires {
            name: missing.subject().to_string(),
            presses: limit,
        });
    }

    let schedule = ledger
        .iter()
        .map(|(watch, hits)| {
            let (first, second) = (hits[0], hits[1]);
            debug!("{} fires at {} every {} presses.", watch, first, second - first);
            (first, second - first)
        })
        .collect::<Vec<_>>();

    let press = align(&schedule).ok_or_else(|| SimulationError::BranchesNeverAlign {
        periods: schedule.clone(),
    })?;
    info!("Branches of `{}` align at press {}.", target, press);
    Ok(press)
}

/// Presses until `target` receives LOW, with no extrapolation.
///
/// Fails with `TargetUnreachable` if the network returns to the state it
/// started in first, since from then on the sequence only repeats.
pub fn first_low_brute_force(network: &mut Network, target: &str, limit: u64) -> SimulationResult<u64> {
    let direct = Watch::low_to(target);
    let watched = WatchSet::new().with(direct.clone());
    let start = network.fingerprint();

    for press in 1..=limit {
        if network.press(&watched)?.hit(&direct) {
            return Ok(press);
        }
        if network.fingerprint() == start {
            return Err(SimulationError::TargetUnreachable {
                target: target.to_string(),
                cycle: press,
            });
        }
        if press % 1_000_000 == 0 {
            debug!("{} presses without a LOW to `{}`.", press, target);
        }
    }

    Err(SimulationError::WatchNeverFires {
        name: target.to_string(),
        presses: limit,
    })
}

/// Smallest press `t` not before any first firing with
/// `t ≡ first (mod period)` for every `(first, period)`.
///
/// When every branch first fires at its own period this is the least common
/// multiple of the periods.
fn align(schedule: &[(u64, u64)]) -> Option<u64> {
    let mut residue: u128 = 0;
    let mut modulus: u128 = 1;

    for &(first, period) in schedule {
        let period = u128::from(period);
        let target = u128::from(first) % period;
        let g = gcd(modulus, period);
        if target % g != residue % g {
            return None;
        }
        // `target - residue` taken modulo `period`; divisible by `g`.
        let diff = (target + period - residue % period) % period;
        let step = period / g;
        let inverse = mod_inverse((modulus / g) % step, step)?;
        let k = ((diff / g) % step).checked_mul(inverse)? % step;
        residue = residue.checked_add(modulus.checked_mul(k)?)?;
        modulus = (modulus / g).checked_mul(period)?;
        residue %= modulus;
    }

    let floor = u128::from(schedule.iter().map(|&(first, _)| first).max().unwrap_or(0));
    let mut press = residue;
    if press < floor {
        press = press.checked_add((floor - press).div_ceil(modulus).checked_mul(modulus)?)?;
    }
    if press == 0 {
        press = modulus;
    }
    u64::try_from(press).ok()
}

fn gcd(a: u128, b: u128) -> u128 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Inverse of `a` modulo `m`, for coprime `a` and `m`.
fn mod_inverse(a: u128, m: u128) -> Option<u128> {
    if m == 1 {
        return Some(0);
    }
    let (mut old_r, mut r) = (a as i128, m as i128);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(m as i128) as u128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_network;

    const SCENARIO: &str = "broadcaster -> a, b\n%a -> c\n%b -> c\n&c -> output";

    // Two self-resetting counters with periods 5 and 7 behind inverters.
    const COUNTERS: &str = "\
broadcaster -> x0, y0
%x0 -> x1, kx
%x1 -> x2
%x2 -> kx
&kx -> x0, x1, ix
&ix -> gate
%y0 -> y1, ky
%y1 -> y2, ky
%y2 -> ky
&ky -> y0, iy
&iy -> gate
&gate -> rx";

    fn config(limit: u64) -> PulsenetConfig {
        PulsenetConfig {
            watch_search_limit: limit,
            ..Default::default()
        }
    }

    fn build(text: &str) -> Network {
        Network::build(parse_network(text).unwrap())
    }

    #[test]
    fn scenario_output_receives_low_on_first_press() {
        let mut network = build(SCENARIO);
        assert_eq!(first_low(&mut network, "output", &config(10)), Ok(1));
    }

    #[test]
    fn single_gate_branches_are_its_inputs() {
        let network = build(SCENARIO);
        let watches = branch_watches(&network, "output").unwrap();
        let expected: WatchSet = [
            Watch::edge("a", "c", Pulse::High),
            Watch::edge("b", "c", Pulse::High),
        ]
        .into_iter()
        .collect();
        assert_eq!(watches, expected);
    }

    #[test]
    fn several_feeders_are_branches_themselves() {
        let network = build("broadcaster -> a, b\n%a -> out\n%b -> out");
        let watches = branch_watches(&network, "out").unwrap();
        assert!(watches.contains(&Watch::edge("a", "out", Pulse::Low)));
        assert!(watches.contains(&Watch::edge("b", "out", Pulse::Low)));
    }

    #[test]
    fn counter_periods_combine_by_lcm() {
        // Branches fire at 5, 10 and 7, 14; the scan stops well before 35.
        let mut network = build(COUNTERS);
        assert_eq!(first_low(&mut network, "rx", &config(20)), Ok(35));
    }

    #[test]
    fn aligned_answer_matches_brute_force() {
        let mut brute = build(COUNTERS);
        assert_eq!(first_low_brute_force(&mut brute, "rx", 1000), Ok(35));
    }

    #[test]
    fn silent_branch_never_fires() {
        // The only input of the gate is the broadcaster, which only relays LOW.
        let mut network = build("broadcaster -> a\n&a -> rx");
        assert_eq!(
            first_low(&mut network, "rx", &config(50)),
            Err(SimulationError::WatchNeverFires {
                name: "broadcaster".into(),
                presses: 50,
            })
        );
    }

    #[test]
    fn unfed_target_is_rejected() {
        let mut network = build(SCENARIO);
        assert_eq!(
            first_low(&mut network, "nothing", &config(10)),
            Err(SimulationError::UnknownTarget("nothing".into()))
        );
    }

    #[test]
    fn brute_force_detects_return_to_start() {
        let mut network = build("broadcaster -> a\n&a -> rx");
        assert_eq!(
            first_low_brute_force(&mut network, "rx", 100),
            Err(SimulationError::TargetUnreachable {
                target: "rx".into(),
                cycle: 1,
            })
        );
    }

    #[test]
    fn brute_force_finds_scenario_hits() {
        let mut network = build(SCENARIO);
        assert_eq!(first_low_brute_force(&mut network, "c", 10), Ok(2));
    }

    #[test]
    fn align_is_lcm_when_offsets_equal_periods() {
        assert_eq!(align(&[(3, 3), (4, 4), (5, 5)]), Some(60));
        assert_eq!(align(&[(3853, 3853), (4073, 4073)]), Some(3853 * 4073));
    }

    #[test]
    fn align_honours_offsets() {
        assert_eq!(align(&[(1, 2), (1, 2)]), Some(1));
        assert_eq!(align(&[(5, 5), (6, 7)]), Some(20));
        assert_eq!(align(&[(7, 2)]), Some(7));
    }

    #[test]
    fn align_rejects_incompatible_branches() {
        assert_eq!(align(&[(1, 2), (2, 4)]), None);
    }

    #[test]
    fn align_handles_moduli_beyond_i128() {
        // Two coprime periods whose product lies between 2^127 and 2^128.
        let p = u64::MAX - 58;
        let q = 13_000_000_000_000_000_001;
        assert_eq!(align(&[(1, p), (1, q)]), Some(1));
        assert_eq!(align(&[(1, p), (1, q), (1, q)]), Some(1));
        assert_eq!(align(&[(1, p), (1, q), (2, q)]), None);
        assert_eq!(align(&[(p, p), (q, q)]), None);
    }
}
