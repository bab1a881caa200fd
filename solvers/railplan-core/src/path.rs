//! Per-agent path representation.

use crate::cell::Cell;

/// An ordered sequence of cells indexed by global timestep, starting at 0.
///
/// Callers receive paths padded to `max_timestep`; the core retains no
/// aliasing reference once a path is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub cells: Vec<Cell>,
}

impl Path {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, t: usize) -> Option<Cell> {
        self.cells.get(t).copied()
    }

    /// Cell at `t`, clamped to the last cell if `t` exceeds the path's length.
    /// Used to reason about an idle-at-target agent beyond its recorded tail.
    pub fn at_or_last(&self, t: usize) -> Option<Cell> {
        self.cells.get(t).or_else(|| self.cells.last()).copied()
    }

    /// Repeat the final cell until the path reaches `max_timestep`.
    pub fn pad_to(&mut self, max_timestep: usize) {
        let Some(&last) = self.cells.last() else { return };
        while self.cells.len() < max_timestep {
            self.cells.push(last);
        }
    }

    /// Index of the first occurrence of `target`, if present.
    pub fn first_arrival(&self, target: Cell) -> Option<usize> {
        self.cells.iter().position(|&c| c == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pad_to_repeats_last_cell() {
        let mut path = Path::new(vec![Cell::new(0, 0), Cell::new(0, 1)]);
        path.pad_to(5);
        assert_eq!(path.cells, vec![
            Cell::new(0, 0),
            Cell::new(0, 1),
            Cell::new(0, 1),
            Cell::new(0, 1),
            Cell::new(0, 1),
        ]);
    }

    #[test]
    fn pad_to_noop_on_empty() {
        let mut path = Path::new(vec![]);
        path.pad_to(5);
        assert!(path.is_empty());
    }

    #[test]
    fn at_or_last_clamps() {
        let path = Path::new(vec![Cell::new(0, 0), Cell::new(0, 1)]);
        assert_eq!(path.at_or_last(0), Some(Cell::new(0, 0)));
        assert_eq!(path.at_or_last(10), Some(Cell::new(0, 1)));
    }
}
