//! Large Neighborhood Search: destroy/repair passes that chase down
//! aggregate lateness without re-running the full prioritized planner.

use rand::seq::SliceRandom;
use rand::Rng;

use railplan_core::{AgentDescriptor, AgentMetaCache, Path, RailView, ReservationTable};

use crate::config::{Budget, PlannerConfig};
use crate::prioritized::{lateness, total_lateness};
use crate::search::{RetryHorizon, SearchRequest};

/// Run up to `iterations` destroy/repair rounds against `paths`, accepting a
/// round only if it strictly reduces total lateness. Returns the best plan
/// found, which may be the input unchanged.
pub fn improve(
    agents: &[AgentDescriptor],
    rail: &dyn RailView,
    meta: &AgentMetaCache,
    mut paths: Vec<Path>,
    max_timestep: u32,
    config: &PlannerConfig,
    iterations: u32,
    rng: &mut impl Rng,
) -> Vec<Path> {
    if agents.is_empty() {
        return paths;
    }

    let budget = Budget::new(config.lns_wall_clock_budget);
    let mut best_lateness = total_lateness(&paths, agents, meta);

    for _ in 0..iterations {
        if budget.expired() || best_lateness == 0 {
            break;
        }

        let late: Vec<usize> = (0..agents.len())
            .filter(|&i| lateness(&paths[i], agents[i].target_cell, meta.get(i).unwrap().deadline) > 0)
            .collect();
        if late.is_empty() {
            break;
        }

        let Some(&seed) = late.choose(rng) else { break };
        let neighborhood = build_neighborhood(agents, &paths, seed);

        let candidate = repair(agents, rail, meta, &paths, &neighborhood, max_timestep, config);
        let candidate_lateness = total_lateness(&candidate, agents, meta);

        if candidate_lateness < best_lateness {
            tracing::debug!(seed, candidate_lateness, best_lateness, "LNS accepted improving repair");
            best_lateness = candidate_lateness;
            paths = candidate;
        }
    }

    paths
}

/// Every agent whose path occupies the same cell as the seed agent's path at
/// the same timestep, including the seed itself.
fn build_neighborhood(agents: &[AgentDescriptor], paths: &[Path], seed: usize) -> Vec<usize> {
    let seed_path = &paths[seed];
    let mut members = vec![seed];

    for (i, path) in paths.iter().enumerate().take(agents.len()) {
        if i == seed {
            continue;
        }
        let in_contact = (0..seed_path.len().min(path.len())).any(|t| match (seed_path.get(t), path.get(t)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        });
        if in_contact {
            members.push(i);
        }
    }

    members
}

/// Replan every agent in `neighborhood` from t=0 against a reservation built
/// from the untouched agents' full existing paths, in ascending-slack order
/// within the neighborhood.
fn repair(
    agents: &[AgentDescriptor],
    rail: &dyn RailView,
    meta: &AgentMetaCache,
    paths: &[Path],
    neighborhood: &[usize],
    max_timestep: u32,
    config: &PlannerConfig,
) -> Vec<Path> {
    let mut reservations = ReservationTable::new();
    for (i, path) in paths.iter().enumerate() {
        if !neighborhood.contains(&i) {
            reservations.reserve(path, 0);
        }
    }

    let mut ordered = neighborhood.to_vec();
    ordered.sort_by_key(|&i| {
        let m = meta.get(i).expect("meta built for every agent");
        (m.slack, m.cmax, i)
    });

    let mut result = paths.to_vec();
    let retry = RetryHorizon { step: config.retry_step, horizon: max_timestep };

    for agent_id in ordered {
        let agent = &agents[agent_id];
        let agent_meta = meta.get(agent_id).expect("meta built for every agent");
        let manhattan = agent.initial_cell.manhattan(agent.target_cell);
        let initial_t_max =
            agent.earliest_departure + manhattan + agent_meta.slack.max(0) as u32 + config.retry_initial_margin;

        let mut path = retry.run(
            |t_max| SearchRequest {
                rail,
                reservations: &reservations,
                start: agent.initial_cell,
                start_heading: agent.initial_heading,
                target: agent.target_cell,
                t_depart: agent.earliest_departure,
                cmax: agent.speed_cmax,
                t_max,
                t_offset: 0,
            },
            initial_t_max,
            agent.initial_cell,
        );

        reservations.reserve(&path, 0);
        path.pad_to(max_timestep as usize);
        result[agent_id] = path;
    }

    result
}
