//! Error types for the simulation algorithms.
//!
//! Node-level operations never fail. Only the drain ceiling and the
//! higher-level searches can, and they return a tagged `SimulationError` so
//! callers can widen a bound and retry.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("drain exceeded {ceiling} steps without settling")]
    DrainCeilingExceeded { ceiling: u64 },

    #[error("no repeating state within {simulated} simulated presses")]
    NoCycleFound { simulated: u64 },

    #[error("`{name}` did not fire often enough within {presses} presses")]
    WatchNeverFires { name: String, presses: u64 },

    #[error("branch periods {periods:?} never align")]
    BranchesNeverAlign { periods: Vec<(u64, u64)> },

    #[error("pulse counts over {presses} presses do not fit in 64 bits")]
    TallyOverflow { presses: u64 },

    #[error("`{0}` has no feeding nodes")]
    UnknownTarget(String),

    #[error("`{target}` is unreachable: state repeats every {cycle} presses")]
    TargetUnreachable { target: String, cycle: u64 },
}

/// Convenience alias for `Result<T, SimulationError>`.
pub type SimulationResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_bound() {
        let e = SimulationError::NoCycleFound { simulated: 10 };
        assert!(e.to_string().contains("10"));

        let e = SimulationError::WatchNeverFires {
            name: "ft".into(),
            presses: 500,
        };
        assert_eq!(e.to_string(), "`ft` did not fire often enough within 500 presses");
    }
}
