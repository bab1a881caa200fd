//! Errors for malformed planning input.
//!
//! Ordinary planning degeneracies (unreachable target, negative slack) are
//! not errors — the core is total for well-formed input and handles those
//! internally. `PlanError` is reserved for caller integration bugs: mismatched
//! vector lengths, an out-of-range `t_now`, or a zero horizon.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("existing_paths has {got} entries, expected {expected} (one per agent)")]
    PathCountMismatch { expected: usize, got: usize },

    #[error("max_timestep must be positive")]
    ZeroHorizon,

    #[error("t_now {t_now} is out of range for horizon {max_timestep}")]
    TimeOutOfRange { t_now: u32, max_timestep: u32 },

    #[error("agent index {index} is out of range for {agent_count} agents")]
    AgentIndexOutOfRange { index: usize, agent_count: usize },
}
