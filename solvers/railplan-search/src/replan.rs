//! Incremental replanner: preserves committed history and repairs plans for
//! a disturbed subset of agents.

use std::collections::HashSet;

use railplan_core::{AgentDescriptor, AgentMetaCache, Heading, Path, PlanError, RailView, ReservationTable};

use crate::config::PlannerConfig;
use crate::search::{RetryHorizon, SearchRequest};

/// Rebuild plans for the agents named in `new_malfunctions`/`failed` (union),
/// at timestep `t_now`, leaving every other agent's path untouched and every
/// affected agent's prefix (`< t_now`) untouched.
pub fn replan(
    agents: &[AgentDescriptor],
    rail: &dyn RailView,
    meta: &AgentMetaCache,
    t_now: u32,
    existing_paths: &[Path],
    max_timestep: u32,
    new_malfunctions: &[usize],
    failed: &[usize],
    config: &PlannerConfig,
) -> Result<Vec<Path>, PlanError> {
    if existing_paths.len() != agents.len() {
        return Err(PlanError::PathCountMismatch { expected: agents.len(), got: existing_paths.len() });
    }
    if max_timestep == 0 {
        return Err(PlanError::ZeroHorizon);
    }
    if t_now >= max_timestep {
        return Err(PlanError::TimeOutOfRange { t_now, max_timestep });
    }

    let affected: HashSet<usize> = new_malfunctions.iter().chain(failed.iter()).copied().collect();
    if affected.is_empty() {
        return Ok(existing_paths.to_vec());
    }
    for &i in &affected {
        if i >= agents.len() {
            return Err(PlanError::AgentIndexOutOfRange { index: i, agent_count: agents.len() });
        }
    }

    tracing::info!(t_now, affected = affected.len(), "replanning disturbed agents");

    let mut reservations = ReservationTable::new();
    for (i, path) in existing_paths.iter().enumerate() {
        if affected.contains(&i) {
            continue;
        }
        let suffix = suffix_from(path, t_now);
        reservations.reserve(&suffix, t_now);
    }

    let mut affected_order: Vec<usize> = affected.into_iter().collect();
    affected_order.sort_by_key(|&i| {
        let m = meta.get(i).expect("meta built for every agent");
        (m.slack, m.cmax, i)
    });

    let mut paths = existing_paths.to_vec();
    // A search restarted at t_now only has (max_timestep - t_now) relative
    // ticks left to play with.
    let retry = RetryHorizon { step: config.retry_step, horizon: max_timestep.saturating_sub(t_now) };

    for agent_id in affected_order {
        let agent = &agents[agent_id];
        let existing = &existing_paths[agent_id];

        let restart_cell = existing.get(t_now as usize).unwrap_or_else(|| {
            existing.cells.last().copied().unwrap_or(agent.initial_cell)
        });
        let restart_heading = restart_heading(existing, t_now, agent.initial_heading);

        let agent_meta = meta.get(agent_id).expect("meta built for every agent");
        let manhattan = restart_cell.manhattan(agent.target_cell);
        let initial_t_max = manhattan + agent_meta.slack.max(0) as u32 + config.retry_initial_margin;

        let mut suffix = retry.run(
            |t_max| SearchRequest {
                rail,
                reservations: &reservations,
                start: restart_cell,
                start_heading: restart_heading,
                target: agent.target_cell,
                // the restart state has already cleared any departure floor;
                // relative time here starts fresh at t_now.
                t_depart: 0,
                cmax: agent.speed_cmax,
                t_max,
                t_offset: t_now,
            },
            initial_t_max,
            restart_cell,
        );

        reservations.reserve(&suffix, t_now);

        // `prefix` covers absolute times [0, t_now); `suffix` starts at
        // t_now (its own index 0 is restart_cell), so the two concatenate
        // directly with no overlap to drop.
        let mut prefix: Vec<_> = existing.cells[..(t_now as usize).min(existing.len())].to_vec();
        if prefix.len() < t_now as usize {
            let last = prefix.last().copied().unwrap_or(agent.initial_cell);
            prefix.resize(t_now as usize, last);
        }
        prefix.append(&mut suffix.cells);
        let mut new_path = Path::new(prefix);
        new_path.pad_to(max_timestep as usize);

        paths[agent_id] = new_path;
    }

    Ok(paths)
}

/// The suffix of `path` starting at `t_now` (inclusive), as its own 0-indexed path.
fn suffix_from(path: &Path, t_now: u32) -> Path {
    let start = (t_now as usize).min(path.len().saturating_sub(1));
    if path.is_empty() {
        return Path::new(vec![]);
    }
    Path::new(path.cells[start.min(path.len() - 1)..].to_vec())
}

/// Infer the heading an agent was facing going into `t_now` from the move
/// between `t_now - 1` and `t_now`; falls back to the initial heading when
/// no move can be recovered (e.g. `t_now == 0` or the agent was idling).
fn restart_heading(path: &Path, t_now: u32, initial_heading: Heading) -> Heading {
    if t_now == 0 {
        return initial_heading;
    }
    let prev = path.get((t_now - 1) as usize);
    let cur = path.get(t_now as usize);
    match (prev, cur) {
        (Some(p), Some(c)) => Heading::between(p, c).unwrap_or(initial_heading),
        _ => initial_heading,
    }
}
