//! Facade over the time-expanded search, prioritized planner, incremental
//! replanner, and LNS improver: the public surface a simulator integrates
//! against.

mod config;
mod lns;
mod prioritized;
mod replan;
mod search;

pub use config::PlannerConfig;
pub use search::{search_once, RetryHorizon, SearchRequest};

use railplan_core::{AgentDescriptor, AgentMetaCache, PlanError, RailView};
use rand::SeedableRng;

use railplan_core::Path;

/// Owns the per-episode [`AgentMetaCache`] across `plan_initial` and any
/// number of subsequent `replan` calls, the way a simulator holds one
/// planner instance for the lifetime of an episode.
pub struct Planner {
    config: PlannerConfig,
    meta: Option<AgentMetaCache>,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config, meta: None }
    }

    /// Build the initial conflict-free plan set for every agent and run the
    /// LNS improver over it. Rebuilds and retains the agent metadata cache
    /// for later `replan` calls.
    pub fn plan_initial(
        &mut self,
        agents: &[AgentDescriptor],
        rail: &dyn RailView,
        max_timestep: u32,
    ) -> Result<Vec<Path>, PlanError> {
        if max_timestep == 0 {
            return Err(PlanError::ZeroHorizon);
        }

        let meta = AgentMetaCache::build(agents, max_timestep);
        let paths = prioritized::plan_all(agents, rail, &meta, max_timestep, &self.config);

        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let paths = lns::improve(
            agents,
            rail,
            &meta,
            paths,
            max_timestep,
            &self.config,
            self.config.lns_iterations_initial,
            &mut rng,
        );

        self.meta = Some(meta);
        Ok(paths)
    }

    /// Incrementally repair `existing_paths` for the agents named in
    /// `new_malfunctions` or `failed`, preserving every other agent's plan
    /// and every affected agent's history before `t_now`, then run a bounded
    /// LNS pass over the repaired set.
    ///
    /// Requires a prior `plan_initial` call on this `Planner` (the metadata
    /// cache it built is reused here rather than rebuilt).
    pub fn replan(
        &self,
        agents: &[AgentDescriptor],
        rail: &dyn RailView,
        t_now: u32,
        existing_paths: &[Path],
        max_timestep: u32,
        new_malfunctions: &[usize],
        failed: &[usize],
    ) -> Result<Vec<Path>, PlanError> {
        let meta = self
            .meta
            .as_ref()
            .expect("replan called before plan_initial built the agent metadata cache");

        let paths = replan::replan(
            agents,
            rail,
            meta,
            t_now,
            existing_paths,
            max_timestep,
            new_malfunctions,
            failed,
            &self.config,
        )?;

        if new_malfunctions.is_empty() && failed.is_empty() {
            return Ok(paths);
        }

        let mut rng = rand::rngs::StdRng::seed_from_u64(u64::from(t_now));
        Ok(lns::improve(
            agents,
            rail,
            meta,
            paths,
            max_timestep,
            &self.config,
            self.config.lns_iterations_replan,
            &mut rng,
        ))
    }
}
