//! Time-expanded single-agent search.
//!
//! Finds a path from `(start, start_heading, t_depart)` to `target` while
//! avoiding a reservation table, honoring a discrete dwell speed (`Cmax`)
//! and a departure floor.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use railplan_core::{Cell, Heading, Path, RailView, ReservationTable};

/// Search state: cell, current heading, time, and how many consecutive
/// timesteps the agent has already dwelt on `cell` since its last move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct State {
    cell: Cell,
    heading: Heading,
    t: u32,
    dwell: u32,
}

/// Min-heap entry ordered by `f = g + h`, ties broken by lower `g` then
/// lower heading index, for a deterministic search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frontier {
    state: State,
    g: u32,
    f: u32,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.g.cmp(&self.g))
            .then_with(|| other.state.heading.index().cmp(&self.state.heading.index()))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn heuristic(cell: Cell, target: Cell) -> u32 {
    cell.manhattan(target)
}

/// Parameters for one single-agent search call.
///
/// All of `t_depart`/`t_max`/the returned `Path`'s indices are relative to
/// this call (the start state is always `t = 0`). `t_offset` is the absolute
/// simulation time that relative `t = 0` corresponds to — callers restarting
/// a search mid-episode (the replanner, LNS repair) set it to `t_now` so
/// reservation lookups land on the right absolute slot in `reservations`,
/// which is always keyed by absolute time.
pub struct SearchRequest<'a> {
    pub rail: &'a dyn RailView,
    pub reservations: &'a ReservationTable,
    pub start: Cell,
    pub start_heading: Heading,
    pub target: Cell,
    pub t_depart: u32,
    pub cmax: u32,
    pub t_max: u32,
    pub t_offset: u32,
}

/// Run the time-expanded search once against a hard time limit `t_max`.
///
/// Returns the cell sequence (including `start`) ending at `target` if one
/// exists within `t_max`; otherwise `None` (caller falls back to `[start]`).
pub fn search_once(req: &SearchRequest) -> Option<Path> {
    let start_state = State { cell: req.start, heading: req.start_heading, t: 0, dwell: 0 };

    let mut open = BinaryHeap::new();
    let mut best_g: HashMap<State, u32> = HashMap::new();
    let mut parent: HashMap<State, State> = HashMap::new();

    best_g.insert(start_state, 0);
    open.push(Frontier { state: start_state, g: 0, f: heuristic(req.start, req.target) });

    if req.start == req.target {
        return Some(Path::new(vec![req.start]));
    }

    while let Some(Frontier { state, g, .. }) = open.pop() {
        if best_g.get(&state).is_some_and(|&best| g > best) {
            continue;
        }
        if state.cell == req.target {
            return Some(reconstruct(&parent, state, req.start));
        }
        if state.t >= req.t_max {
            continue;
        }

        for next in successors(req, state) {
            let next_g = state.t + 1;
            let better = best_g.get(&next).is_none_or(|&best| next_g < best);
            if better {
                best_g.insert(next, next_g);
                parent.insert(next, state);
                let f = next_g + heuristic(next.cell, req.target);
                open.push(Frontier { state: next, g: next_g, f });
            }
        }
    }

    None
}

fn successors(req: &SearchRequest, state: State) -> Vec<State> {
    let mut out = Vec::with_capacity(5);
    let next_t = state.t + 1;
    let next_t_abs = req.t_offset + next_t;

    // Wait: always emitted before t_depart as a way to delay entry; otherwise
    // emitted whenever the cell isn't reserved at next_t.
    if !req.reservations.occupied(state.cell, state.cell, next_t_abs) {
        out.push(State {
            cell: state.cell,
            heading: state.heading,
            t: next_t,
            dwell: (state.dwell + 1).min(req.cmax.saturating_sub(1)),
        });
    }

    // Move: only once the dwell requirement is satisfied and departure floor reached.
    if state.dwell + 1 >= req.cmax && state.t >= req.t_depart {
        for (next_cell, next_heading) in req.rail.successors(state.cell, state.heading) {
            if !req.reservations.occupied(state.cell, next_cell, next_t_abs) {
                out.push(State { cell: next_cell, heading: next_heading, t: next_t, dwell: 0 });
            }
        }
    }

    out
}

fn reconstruct(parent: &HashMap<State, State>, goal: State, start: Cell) -> Path {
    let mut cells = vec![goal.cell];
    let mut cur = goal;
    while let Some(&prev) = parent.get(&cur) {
        cells.push(prev.cell);
        cur = prev;
    }
    cells.reverse();
    debug_assert_eq!(cells.first().copied(), Some(start));
    Path::new(cells)
}

/// Retry-horizon wrapper: widen `t_max` in fixed steps until a path is found
/// or the episode horizon is exceeded, per the retry-horizon design.
pub struct RetryHorizon {
    pub step: u32,
    pub horizon: u32,
}

impl Default for RetryHorizon {
    fn default() -> Self {
        Self { step: 20, horizon: u32::MAX }
    }
}

impl RetryHorizon {
    /// Run `search_once` with a growing `t_max`, starting from a tight bound
    /// derived from Manhattan distance and slack, until the episode horizon.
    /// Falls back to the single-cell "wait forever" path if nothing is found.
    pub fn run<'a>(&self, req_builder: impl Fn(u32) -> SearchRequest<'a>, initial_t_max: u32, start: Cell) -> Path {
        let mut t_max = initial_t_max.min(self.horizon);
        loop {
            let req = req_builder(t_max);
            if let Some(path) = search_once(&req) {
                return path;
            }
            if t_max >= self.horizon {
                tracing::debug!(t_max, "search exhausted retry horizon without reaching target");
                return Path::new(vec![start]);
            }
            t_max = (t_max + self.step).min(self.horizon);
        }
    }
}
