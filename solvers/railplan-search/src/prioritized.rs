//! Prioritized multi-agent planner: orders agents by slack and composes
//! single-agent plans into a shared reservation.

use railplan_core::{AgentDescriptor, AgentMetaCache, Cell, Path, RailView, ReservationTable};

use crate::config::PlannerConfig;
use crate::search::{RetryHorizon, SearchRequest};

/// Build the initial conflict-free plan set for every agent, in slack order.
///
/// Failure of an individual agent's search to reach its target is not fatal:
/// that agent contributes a wait-in-place plan and the reservation still
/// pins its starting cell.
pub fn plan_all(
    agents: &[AgentDescriptor],
    rail: &dyn RailView,
    meta: &AgentMetaCache,
    max_timestep: u32,
    config: &PlannerConfig,
) -> Vec<Path> {
    let mut reservations = ReservationTable::new();
    let mut paths: Vec<Path> = vec![Path::new(vec![]); agents.len()];

    let retry = RetryHorizon { step: config.retry_step, horizon: max_timestep };

    for agent_id in meta.priority_order() {
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

        if path.cells.len() == 1 && agent.initial_cell != agent.target_cell {
            tracing::warn!(agent_id, "no path to target found within horizon; agent will wait in place");
        }

        // Reserve the un-padded portion; the padded idle-at-target tail is
        // not reserved since the simulator removes agents at their target.
        reservations.reserve(&path, 0);
        path.pad_to(max_timestep as usize);
        paths[agent_id] = path;
    }

    paths
}

/// Total lateness across a plan set: `sum(max(0, arrival - deadline))`.
pub fn total_lateness(paths: &[Path], agents: &[AgentDescriptor], meta: &AgentMetaCache) -> u64 {
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| lateness(path, agents[i].target_cell, meta.get(i).unwrap().deadline))
        .sum()
}

pub fn lateness(path: &Path, target: Cell, deadline: u32) -> u64 {
    match path.first_arrival(target) {
        Some(arrival) if arrival as u32 > deadline => (arrival as u32 - deadline) as u64,
        Some(_) => 0,
        // never arrives within the padded horizon: maximally late
        None => path.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use railplan_core::{GridRail, Heading};

    fn agent(start: Cell, target: Cell, heading: Heading) -> AgentDescriptor {
        AgentDescriptor {
            initial_cell: start,
            initial_heading: heading,
            target_cell: target,
            earliest_departure: 0,
            latest_arrival: None,
            speed_cmax: 1,
        }
    }

    #[test]
    fn single_agent_reaches_target() {
        let rail = GridRail::open_grid(3, 3);
        let agents = vec![agent(Cell::new(0, 0), Cell::new(0, 2), Heading::East)];
        let meta = AgentMetaCache::build(&agents, 10);
        let paths = plan_all(&agents, &rail, &meta, 10, &PlannerConfig::default());
        assert_eq!(paths.len(), 1);
        assert_eq!(&paths[0].cells[..3], &[Cell::new(0, 0), Cell::new(0, 1), Cell::new(0, 2)]);
        assert_eq!(paths[0].len(), 10);
    }

    #[test]
    fn swap_conflict_is_serialized() {
        // A 2x2 grid gives the second agent room to detour around the
        // direct swap rather than facing an unsolvable head-on conflict.
        let rail = GridRail::open_grid(2, 2);
        let agents = vec![
            agent(Cell::new(0, 0), Cell::new(1, 0), Heading::South),
            agent(Cell::new(1, 0), Cell::new(0, 0), Heading::North),
        ];
        let meta = AgentMetaCache::build(&agents, 10);
        let paths = plan_all(&agents, &rail, &meta, 10, &PlannerConfig::default());

        // The padded idle-at-target tail isn't reserved (the simulator is
        // assumed to remove an agent once it reaches its target), so a
        // still-moving agent may legally re-enter a cell an already-arrived
        // agent occupies past its own first arrival.
        let idle_from = [paths[0].first_arrival(agents[0].target_cell), paths[1].first_arrival(agents[1].target_cell)];
        let idle_at = |i: usize, t: usize| idle_from[i].is_some_and(|arrival| t >= arrival);

        for t in 0..10usize {
            if idle_at(0, t) || idle_at(1, t) {
                continue;
            }
            assert_ne!(paths[0].cells[t], paths[1].cells[t], "vertex conflict at t={t}");
            if t > 0 && !idle_at(0, t - 1) && !idle_at(1, t - 1) {
                let swap = paths[0].cells[t - 1] == paths[1].cells[t] && paths[0].cells[t] == paths[1].cells[t - 1];
                assert!(!swap, "edge swap at t={t}");
            }
        }
    }

    #[test]
    fn deadline_tight_agent_gets_priority() {
        let rail = GridRail::open_grid(5, 1);
        let mut tight = agent(Cell::new(0, 0), Cell::new(0, 4), Heading::East);
        tight.latest_arrival = Some(10);
        let mut loose = agent(Cell::new(0, 0), Cell::new(0, 4), Heading::East);
        loose.latest_arrival = Some(100);
        let agents = vec![loose, tight];
        let meta = AgentMetaCache::build(&agents, 100);
        assert_eq!(meta.priority_order()[0], 1);

        // agent 1 (tight) is planned first, so it gets the direct path and
        // agent 0 (loose) bears whatever detour the shared corridor forces.
        let paths = plan_all(&agents, &rail, &meta, 100, &PlannerConfig::default());
        assert_eq!(paths[1].first_arrival(Cell::new(0, 4)), Some(4));
    }
}
