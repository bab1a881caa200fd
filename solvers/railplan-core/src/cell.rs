//! Grid coordinates and headings.

/// A cell on the rail grid, addressed by (row, col).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Manhattan distance to another cell.
    pub fn manhattan(&self, other: Cell) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// The cell reached by stepping one unit in `heading`.
    pub fn step(&self, heading: Heading) -> Cell {
        let (dr, dc) = heading.delta();
        Cell::new(self.row + dr, self.col + dc)
    }
}

/// Absolute facing direction. Headings are destinations, not relative turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    /// Row/col delta for this heading.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Heading::North => (-1, 0),
            Heading::East => (0, 1),
            Heading::South => (1, 0),
            Heading::West => (0, -1),
        }
    }

    /// Index into a `[bool; 4]` transition row, matching the enum's discriminant order.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Heading implied by moving from `from` to `to`, if they are adjacent.
    pub fn between(from: Cell, to: Cell) -> Option<Heading> {
        Heading::ALL.into_iter().find(|h| from.step(*h) == to)
    }
}
