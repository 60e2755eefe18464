use crate::location::{Heading, Location};

/// Wall knowledge for one side of a cell.
/// `None` = unknown, `Some(0)` = wall, `Some(n)` = n open cells in that direction.
pub type Opening = Option<u32>;

/// A discovered or inferred maze cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub location: Location,
    /// Cell this one was reached from; a key into the grid, never an owner
    pub parent: Option<Location>,
    pub g_cost: Option<u32>,
    pub f_cost: Option<u32>,
    /// Indexed by absolute heading (N, E, S, W)
    pub viable: [Opening; 4],
    pub visits: u32,
    /// 0 when not a dead end; higher means deeper into the dead end
    pub deadend_score: u32,
}

impl Cell {
    pub fn new(location: Location) -> Self {
        Cell {
            location,
            parent: None,
            g_cost: None,
            f_cost: None,
            viable: [None; 4],
            visits: 0,
            deadend_score: 0,
        }
    }

    pub fn with_parent(location: Location, parent: Location) -> Self {
        Cell {
            parent: Some(parent),
            ..Cell::new(location)
        }
    }

    pub fn with_viable(location: Location, viable: [Opening; 4]) -> Self {
        Cell {
            viable,
            ..Cell::new(location)
        }
    }

    /// True when every side is known
    pub fn is_fully_explored(&self) -> bool {
        self.viable.iter().all(Option::is_some)
    }

    pub fn opening(&self, heading: Heading) -> Opening {
        self.viable[heading.index()]
    }

    pub fn is_open(&self, heading: Heading) -> bool {
        matches!(self.opening(heading), Some(n) if n > 0)
    }

    pub fn closed_sides(&self) -> usize {
        self.viable.iter().filter(|v| **v == Some(0)).count()
    }

    pub fn is_deadend(&self) -> bool {
        self.deadend_score > 0
    }

    pub fn set_cost(&mut self, g_cost: u32, f_cost: u32) {
        self.g_cost = Some(g_cost);
        self.f_cost = Some(f_cost);
    }

    pub fn clear_cost(&mut self) {
        self.g_cost = None;
        self.f_cost = None;
    }
}
