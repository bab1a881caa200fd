//! Agent descriptors and precomputed per-agent planning metadata.

use crate::cell::{Cell, Heading};

/// Immutable per-episode description of one train.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentDescriptor {
    pub initial_cell: Cell,
    pub initial_heading: Heading,
    pub target_cell: Cell,
    pub earliest_departure: u32,
    /// Latest-arrival timestep, if the episode assigns this agent a deadline.
    pub latest_arrival: Option<u32>,
    /// Discrete speed: must dwell `Cmax` consecutive timesteps on a cell
    /// before crossing to the next. Always >= 1.
    pub speed_cmax: u32,
}

impl AgentDescriptor {
    /// Build a descriptor from a fractional speed `s in (0, 1]`, per the
    /// `Cmax = round(1/s)` rule. `speed` of `None` means unit speed.
    pub fn with_fractional_speed(
        initial_cell: Cell,
        initial_heading: Heading,
        target_cell: Cell,
        earliest_departure: u32,
        latest_arrival: Option<u32>,
        speed: Option<f64>,
    ) -> Self {
        let speed_cmax = match speed {
            Some(s) if s > 0.0 => (1.0 / s).round().max(1.0) as u32,
            _ => 1,
        };
        Self {
            initial_cell,
            initial_heading,
            target_cell,
            earliest_departure,
            latest_arrival,
            speed_cmax,
        }
    }
}

/// Precomputed deadline/slack bookkeeping for one agent, derived once per
/// planning call and reused by the replanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentMeta {
    pub deadline: u32,
    pub earliest_departure: u32,
    pub cmax: u32,
    /// `deadline - earliest_departure - manhattan(start, target)`; may be
    /// negative when the deadline is infeasible from the start.
    pub slack: i64,
}

impl AgentMeta {
    pub fn compute(agent: &AgentDescriptor, max_timestep: u32) -> Self {
        let deadline = agent.latest_arrival.unwrap_or(max_timestep);
        let earliest_departure = agent.earliest_departure;
        let manhattan = agent.initial_cell.manhattan(agent.target_cell);
        let slack = deadline as i64 - earliest_departure as i64 - manhattan as i64;
        Self { deadline, earliest_departure, cmax: agent.speed_cmax, slack }
    }
}

/// Per-episode cache of `AgentMeta`, owned by the planner facade and rebuilt
/// at the start of every `plan_initial`, then reused read-only by `replan`.
#[derive(Debug, Clone, Default)]
pub struct AgentMetaCache {
    entries: Vec<AgentMeta>,
}

impl AgentMetaCache {
    /// Build the cache from the episode's agent list and horizon.
    pub fn build(agents: &[AgentDescriptor], max_timestep: u32) -> Self {
        let entries = agents.iter().map(|a| AgentMeta::compute(a, max_timestep)).collect();
        Self { entries }
    }

    pub fn get(&self, agent_id: usize) -> Option<AgentMeta> {
        self.entries.get(agent_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Agent indices ordered ascending by `(slack, Cmax)`, tie-broken by
    /// agent id, matching the prioritized planner's tightest-deadline,
    /// slowest-agent-first ordering.
    pub fn priority_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by_key(|&i| (self.entries[i].slack, self.entries[i].cmax, i));
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn agent(start: Cell, target: Cell, earliest: u32, deadline: Option<u32>, cmax: u32) -> AgentDescriptor {
        AgentDescriptor {
            initial_cell: start,
            initial_heading: Heading::East,
            target_cell: target,
            earliest_departure: earliest,
            latest_arrival: deadline,
            speed_cmax: cmax,
        }
    }

    #[test]
    fn slack_uses_deadline_fallback_to_horizon() {
        let a = agent(Cell::new(0, 0), Cell::new(0, 3), 0, None, 1);
        let meta = AgentMeta::compute(&a, 10);
        assert_eq!(meta.deadline, 10);
        assert_eq!(meta.slack, 10 - 0 - 3);
    }

    #[test]
    fn slack_can_be_negative() {
        let a = agent(Cell::new(0, 0), Cell::new(0, 10), 0, Some(3), 1);
        let meta = AgentMeta::compute(&a, 100);
        assert_eq!(meta.slack, 3 - 0 - 10);
        assert!(meta.slack < 0);
    }

    #[test]
    fn priority_orders_by_slack_then_cmax_then_id() {
        let agents = vec![
            agent(Cell::new(0, 0), Cell::new(0, 5), 0, Some(100), 1), // slack 95
            agent(Cell::new(0, 0), Cell::new(0, 5), 0, Some(10), 1),  // slack 5
            agent(Cell::new(0, 0), Cell::new(0, 5), 0, Some(10), 2),  // slack 5, slower
        ];
        let cache = AgentMetaCache::build(&agents, 100);
        assert_eq!(cache.priority_order(), vec![1, 2, 0]);
    }

    #[test]
    fn fractional_speed_rounds_to_cmax() {
        let a = AgentDescriptor::with_fractional_speed(
            Cell::new(0, 0),
            Heading::East,
            Cell::new(0, 1),
            0,
            None,
            Some(0.25),
        );
        assert_eq!(a.speed_cmax, 4);
    }

    #[test]
    fn absent_speed_is_unit() {
        let a = AgentDescriptor::with_fractional_speed(
            Cell::new(0, 0),
            Heading::East,
            Cell::new(0, 1),
            0,
            None,
            None,
        );
        assert_eq!(a.speed_cmax, 1);
    }
}
