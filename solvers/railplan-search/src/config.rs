//! In-process planner configuration.
//!
//! The core owns no on-disk or environment configuration (the simulator owns
//! that boundary); a host process builds a `PlannerConfig` in code, the way
//! `mapf-core`'s callers construct values directly rather than through a
//! config file.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
    /// Step size the retry-horizon loop widens `t_max` by on each retry.
    pub retry_step: u32,
    /// Constant added to the tight initial `t_max` bound (Manhattan + slack).
    pub retry_initial_margin: u32,
    /// LNS iteration bound used by `plan_initial`.
    pub lns_iterations_initial: u32,
    /// LNS iteration bound used by `replan`.
    pub lns_iterations_replan: u32,
    /// Optional wall-clock budget for the LNS loop; `None` means unbounded.
    pub lns_wall_clock_budget: Option<Duration>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            retry_step: 20,
            retry_initial_margin: 20,
            lns_iterations_initial: 20,
            lns_iterations_replan: 10,
            lns_wall_clock_budget: None,
        }
    }
}

/// Tracks whether the LNS loop should stop early because the wall-clock
/// budget has been exhausted. A no-op (`deadline == None`) when unset.
pub(crate) struct Budget {
    deadline: Option<Instant>,
}

impl Budget {
    pub fn new(budget: Option<Duration>) -> Self {
        Self { deadline: budget.map(|d| Instant::now() + d) }
    }

    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
