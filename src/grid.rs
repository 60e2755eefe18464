use crate::cell::Cell;
use crate::error::NavigationError;
use crate::location::{Heading, Location};
use log::trace;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Left, front and right sensor distances, in that order
pub type SensorReadings = [u32; 3];

/// Partially discovered square maze.
/// Cells live in a dense arena indexed by `row * dim + col`; slots stay `None`
/// until the cell is first seen and are never cleared afterwards.
#[derive(Clone, Debug)]
pub struct Grid {
    pub dim: i32,
    cells: Vec<Option<Cell>>,
    goals: Vec<Location>,
    /// Known cells the robot has not stood on yet
    unvisited: BTreeSet<Location>,
    /// Number of cells created so far - only ever grows
    discovered: usize,
}

impl Grid {
    /// Create a grid whose goal is the 2x2 centre block, holding only the entrance cell
    pub fn new(dim: i32) -> Self {
        let mut grid = Grid {
            dim,
            cells: vec![None; (dim * dim).max(0) as usize],
            goals: Vec::new(),
            unvisited: BTreeSet::new(),
            discovered: 0,
        };
        grid.set_goals(None);
        let mut entrance = Cell::new(Grid::entrance(dim));
        grid.seal_perimeter(&mut entrance);
        grid.insert(entrance);
        grid
    }

    /// South-west corner, where every run starts
    pub fn entrance(dim: i32) -> Location {
        Location::new(dim - 1, 0)
    }

    /// The four centre cells of an even-sized maze
    pub fn centre_goals(dim: i32) -> Vec<Location> {
        let a = dim / 2 - 1;
        let b = dim / 2;
        vec![
            Location::new(a, a),
            Location::new(a, b),
            Location::new(b, b),
            Location::new(b, a),
        ]
    }

    pub fn in_bounds(&self, loc: Location) -> bool {
        loc.row >= 0 && loc.row < self.dim && loc.col >= 0 && loc.col < self.dim
    }

    /// The outer boundary is always walled
    fn seal_perimeter(&self, cell: &mut Cell) {
        for heading in Heading::ALL {
            if !self.in_bounds(cell.location.step(heading)) {
                cell.viable[heading.index()] = Some(0);
            }
        }
    }

    fn index(&self, loc: Location) -> Option<usize> {
        if self.in_bounds(loc) {
            Some((loc.row * self.dim + loc.col) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, loc: Location) -> Option<&Cell> {
        self.index(loc).and_then(|id| self.cells[id].as_ref())
    }

    pub fn get_mut(&mut self, loc: Location) -> Option<&mut Cell> {
        match self.index(loc) {
            Some(id) => self.cells[id].as_mut(),
            None => None,
        }
    }

    /// Store a cell, replacing any previous record at its location.
    /// Returns the location, or `None` when it lies outside the maze.
    pub fn insert(&mut self, cell: Cell) -> Option<Location> {
        let loc = cell.location;
        let id = self.index(loc)?;
        if self.cells[id].is_none() {
            self.discovered += 1;
        }
        self.cells[id] = Some(cell);
        Some(loc)
    }

    /// All discovered cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten()
    }

    pub fn discovered(&self) -> usize {
        self.discovered
    }

    pub fn goals(&self) -> &[Location] {
        &self.goals
    }

    /// Set the goal locations; `None` restores the centre block
    pub fn set_goals(&mut self, goals: Option<Vec<Location>>) {
        self.goals = goals.unwrap_or_else(|| Grid::centre_goals(self.dim));
    }

    /// Forget per-phase bookkeeping (visits, parents, costs, frontier).
    /// Wall knowledge and dead-end scores are kept.
    pub fn reset(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            cell.visits = 0;
            cell.parent = None;
            cell.clear_cost();
        }
        self.unvisited.clear();
    }

    /// Manhattan distance to the nearest goal
    pub fn distance_to_goal(&self, loc: Location) -> u32 {
        self.goals
            .iter()
            .map(|goal| loc.distance(goal))
            .min()
            .unwrap_or(0)
    }

    pub fn is_goal(&self, loc: Location) -> bool {
        self.goals.contains(&loc)
    }

    pub fn unvisited(&self) -> &BTreeSet<Location> {
        &self.unvisited
    }

    pub fn mark_unvisited(&mut self, loc: Location) {
        self.unvisited.insert(loc);
    }

    pub fn remove_unvisited(&mut self, loc: Location) -> bool {
        self.unvisited.remove(&loc)
    }

    /// Frontier ordered by distance from `source` plus the cell's f-cost.
    /// The sort is stable, so ties keep location order.
    pub fn unvisited_sorted(&self, source: Location) -> Vec<Location> {
        let mut frontier: Vec<Location> = self.unvisited.iter().copied().collect();
        frontier.sort_by_key(|loc| {
            let f_cost = self.get(*loc).and_then(|c| c.f_cost).unwrap_or(0);
            source.distance(loc) + f_cost
        });
        frontier
    }

    /// Known cells other than `source` with a side never sensed, nearest first.
    /// Dead ends are left out.
    pub fn partially_explored(&self, source: Location) -> Vec<Location> {
        let mut cells: Vec<Location> = self
            .cells()
            .filter(|c| c.location != source && !c.is_fully_explored() && !c.is_deadend())
            .map(|c| c.location)
            .collect();
        cells.sort_by_key(|loc| source.distance(loc));
        cells
    }

    /// Fold one sensor reading into the cell the robot stands on and register
    /// newly seen neighbours as frontier cells
    pub fn on_visit(&mut self, loc: Location, heading: Heading, sensors: SensorReadings) {
        let Some(cell) = self.get_mut(loc) else {
            return;
        };

        cell.visits += 1;
        for (side, reading) in heading.sensor_headings().iter().zip(sensors) {
            cell.viable[side.index()] = Some(reading);
        }
        self.unvisited.remove(&loc);

        let neighbours = self.neighbours(loc, false);
        self.share_walls(loc);

        for &neighbour in &neighbours {
            self.unvisited.insert(neighbour);
            trace!("Unvisited: {} (from {})", neighbour, loc);
        }
        self.relax_costs(loc, &neighbours);
    }

    /// Open, non-dead-end neighbours of `loc`, creating cells on first sight.
    /// Neighbours already stood on are only returned with `include_visited`.
    pub fn neighbours(&mut self, loc: Location, include_visited: bool) -> Vec<Location> {
        let Some(cell) = self.get(loc) else {
            return Vec::new();
        };
        let open: Vec<Heading> = Heading::ALL
            .into_iter()
            .filter(|h| cell.is_open(*h))
            .collect();

        let mut result = Vec::new();
        for heading in open {
            let Some(neighbour) = self.get_or_create(loc, heading) else {
                continue;
            };
            if let Some(n) = self.get(neighbour) {
                if !n.is_deadend() && (n.visits == 0 || include_visited) {
                    result.push(neighbour);
                }
            }
        }
        result
    }

    /// Neighbour of `from` in direction `heading`, created if missing.
    ///
    /// A new cell points back at `from`. When both of `from`'s openings along
    /// this line are known, the new cell's openings along it are guessed too:
    /// one more cell behind, one fewer ahead. The guess is overwritten once the
    /// cell is sensed. Sides facing the outer boundary start out as walls.
    pub fn get_or_create(&mut self, from: Location, heading: Heading) -> Option<Location> {
        let target = from.step(heading);
        if !self.in_bounds(target) {
            return None;
        }

        if let Some(existing) = self.get_mut(target) {
            // Cells that carry a cost are search roots or already relaxed
            if existing.parent.is_none() && existing.g_cost.is_none() {
                existing.parent = Some(from);
            }
            return Some(target);
        }

        let source = self.get(from)?;
        let ahead = source.opening(heading);
        let behind = source.opening(heading.opposite());

        let mut cell = Cell::with_parent(target, from);
        if let (Some(ahead), Some(behind)) = (ahead, behind) {
            cell.viable[heading.opposite().index()] = Some(behind + 1);
            cell.viable[heading.index()] = Some(ahead.saturating_sub(1));
        }
        self.seal_perimeter(&mut cell);
        trace!("New cell: {:?}", cell);
        self.insert(cell)
    }

    /// Walls are shared between adjacent cells: copy what `loc` knows onto the
    /// facing side of each existing neighbour that has not been sensed there
    fn share_walls(&mut self, loc: Location) {
        let Some(cell) = self.get(loc) else {
            return;
        };
        let viable = cell.viable;

        for heading in Heading::ALL {
            let Some(opening) = viable[heading.index()] else {
                continue;
            };
            let facing = heading.opposite().index();
            let Some(neighbour) = self.get_mut(loc.step(heading)) else {
                continue;
            };
            if neighbour.viable[facing].is_some() {
                continue;
            }
            neighbour.viable[facing] = if opening == 0 {
                Some(0)
            } else {
                Some(viable[facing].map_or(1, |behind| behind + 1))
            };
        }
    }

    /// Relax the cost of each candidate through `from`: a candidate takes `from`
    /// as parent when it has no cost yet or the new cost is strictly lower.
    /// A `from` cell without a cost acts as a local root with cost 0.
    pub fn relax_costs(&mut self, from: Location, candidates: &[Location]) {
        let from_g = match self.get(from).and_then(|c| c.g_cost) {
            Some(g) => g,
            None => {
                let h = self.distance_to_goal(from);
                match self.get_mut(from) {
                    Some(cell) => cell.set_cost(0, h),
                    None => return,
                }
                0
            }
        };

        let tentative = from_g + 1;
        for &loc in candidates {
            let h = self.distance_to_goal(loc);
            if let Some(cell) = self.get_mut(loc) {
                if cell.g_cost.map_or(true, |g| tentative < g) {
                    cell.parent = Some(from);
                    cell.set_cost(tentative, tentative + h);
                }
            }
        }
    }

    /// Walk parent links back from `end` to `root`.
    /// Returns the path without `root`, ending at `end`.
    pub fn follow_parent(&self, root: Location, end: Location) -> Result<Vec<Location>, NavigationError> {
        if root == end {
            return Ok(Vec::new());
        }

        let mut path = VecDeque::from([end]);
        let mut seen = HashSet::from([end]);
        let mut current = end;

        loop {
            let parent = self
                .get(current)
                .and_then(|c| c.parent)
                .ok_or(NavigationError::BrokenParentChain { location: current })?;
            if parent == root {
                break;
            }
            if !seen.insert(parent) {
                return Err(NavigationError::InconsistentParentChain { location: parent });
            }
            path.push_front(parent);
            current = parent;
        }

        Ok(path.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_with(loc: (i32, i32), viable: [Option<u32>; 4], g_cost: u32) -> Cell {
        let mut cell = Cell::with_viable(loc.into(), viable);
        cell.set_cost(g_cost, g_cost);
        cell
    }

    #[test]
    fn test_centre_goals() {
        let grid = Grid::new(12);
        assert_eq!(
            grid.goals(),
            &[
                Location::new(5, 5),
                Location::new(5, 6),
                Location::new(6, 6),
                Location::new(6, 5)
            ]
        );
        assert!(grid.get(Location::new(11, 0)).is_some());
        assert_eq!(grid.discovered(), 1);
    }

    #[test]
    fn test_distance_to_goal() {
        let mut grid = Grid::new(12);
        assert_eq!(grid.distance_to_goal(Location::new(11, 0)), 11);
        assert_eq!(grid.distance_to_goal(Location::new(6, 6)), 0);
        grid.set_goals(Some(vec![Location::new(11, 0)]));
        assert_eq!(grid.distance_to_goal(Location::new(6, 6)), 11);
    }

    #[test]
    fn test_on_visit_heading_north() {
        let mut grid = Grid::new(12);
        grid.insert(cell_with((11, 0), [Some(11), Some(0), Some(0), Some(0)], 0));

        grid.on_visit(Location::new(11, 0), Heading::North, [0, 11, 0]);

        let cell = grid.get(Location::new(11, 0)).unwrap();
        assert_eq!(cell.viable[Heading::West.index()], Some(0));
        assert_eq!(cell.viable[Heading::North.index()], Some(11));
        assert_eq!(cell.viable[Heading::East.index()], Some(0));
        assert_eq!(cell.visits, 1);
        assert!(grid.unvisited().contains(&Location::new(10, 0)));
    }

    #[test]
    fn test_on_visit_heading_east() {
        let mut grid = Grid::new(12);
        grid.insert(cell_with((9, 0), [Some(9), Some(3), Some(2), Some(0)], 2));

        grid.on_visit(Location::new(9, 0), Heading::East, [9, 3, 2]);

        let cell = grid.get(Location::new(9, 0)).unwrap();
        assert_eq!(cell.viable, [Some(9), Some(3), Some(2), Some(0)]);
    }

    #[test]
    fn test_neighbours_in_heading_order() {
        let mut grid = Grid::new(12);
        grid.insert(cell_with((9, 0), [Some(9), Some(3), Some(2), Some(0)], 2));

        let cells = grid.neighbours(Location::new(9, 0), false);
        assert_eq!(
            cells,
            vec![Location::new(8, 0), Location::new(9, 1), Location::new(10, 0)]
        );
    }

    #[test]
    fn test_get_or_create_seeds_openings() {
        let mut grid = Grid::new(12);
        grid.insert(cell_with((9, 0), [Some(9), Some(3), Some(2), Some(0)], 0));

        let north = grid.get_or_create(Location::new(9, 0), Heading::North).unwrap();
        let cell = grid.get(north).unwrap();
        assert_eq!(cell.location, Location::new(8, 0));
        assert_eq!(cell.parent, Some(Location::new(9, 0)));
        // West of column 0 is the outer wall
        assert_eq!(cell.viable, [Some(8), None, Some(3), Some(0)]);

        let east = grid.get_or_create(Location::new(9, 0), Heading::East).unwrap();
        assert_eq!(grid.get(east).unwrap().viable, [None, Some(2), None, Some(1)]);
    }

    #[test]
    fn test_entrance_starts_with_outer_walls() {
        let grid = Grid::new(6);
        let cell = grid.get(Grid::entrance(6)).unwrap();
        assert_eq!(cell.viable, [None, None, Some(0), Some(0)]);
    }

    #[test]
    fn test_get_or_create_adopts_parentless_cell() {
        let mut grid = Grid::new(12);
        let from = Location::new(9, 0);
        grid.insert(cell_with((9, 0), [Some(9), Some(3), Some(2), Some(0)], 0));
        grid.insert(Cell::new(Location::new(8, 0)));
        grid.insert(Cell::with_parent(Location::new(9, 1), Location::new(8, 1)));
        let mut root = Cell::new(Location::new(10, 0));
        root.set_cost(0, 5);
        grid.insert(root);
        let before = grid.discovered();

        assert_eq!(grid.get_or_create(from, Heading::North), Some(Location::new(8, 0)));
        assert_eq!(grid.get(Location::new(8, 0)).unwrap().parent, Some(from));

        // Already parented
        grid.get_or_create(from, Heading::East);
        assert_eq!(
            grid.get(Location::new(9, 1)).unwrap().parent,
            Some(Location::new(8, 1))
        );

        // A costed cell without parent is a search root and stays one
        grid.get_or_create(from, Heading::South);
        assert_eq!(grid.get(Location::new(10, 0)).unwrap().parent, None);

        // Existing cells keep their walls and are not counted again
        assert_eq!(grid.get(Location::new(8, 0)).unwrap().viable, [None; 4]);
        assert_eq!(grid.discovered(), before);
    }

    #[test]
    fn test_partially_explored() {
        let mut grid = Grid::new(4);
        let start = Grid::entrance(4);
        grid.get_mut(start).unwrap().viable = [Some(1), Some(0), Some(0), Some(0)];
        grid.insert(Cell::with_viable(
            Location::new(2, 0),
            [None, Some(1), Some(1), Some(0)],
        ));
        grid.insert(Cell::with_viable(
            Location::new(2, 1),
            [Some(1), Some(0), Some(0), Some(1)],
        ));
        let mut deadend = Cell::new(Location::new(1, 1));
        deadend.deadend_score = 17;
        grid.insert(deadend);
        grid.insert(Cell::new(Location::new(0, 0)));

        assert_eq!(
            grid.partially_explored(start),
            vec![Location::new(2, 0), Location::new(0, 0)]
        );
        assert_eq!(
            grid.partially_explored(Location::new(2, 0)),
            vec![Location::new(0, 0)]
        );
    }

    #[test]
    fn test_get_or_create_off_grid() {
        let mut grid = Grid::new(4);
        grid.insert(cell_with((3, 0), [Some(1), Some(0), Some(0), Some(1)], 0));
        assert_eq!(grid.get_or_create(Location::new(3, 0), Heading::West), None);
        assert_eq!(grid.get_or_create(Location::new(3, 0), Heading::South), None);
    }

    #[test]
    fn test_walls_are_shared_with_neighbours() {
        let mut grid = Grid::new(4);
        grid.insert(Cell::new(Location::new(2, 0)));
        grid.insert(Cell::with_viable(
            Location::new(3, 0),
            [None, None, Some(0), None],
        ));

        grid.on_visit(Location::new(3, 0), Heading::North, [0, 1, 0]);

        // (2, 0) learns its south side is open, one cell behind it
        let above = grid.get(Location::new(2, 0)).unwrap();
        assert_eq!(above.viable[Heading::South.index()], Some(1));
    }

    #[test]
    fn test_viable_never_returns_to_unknown() {
        let mut grid = Grid::new(6);
        let start = Grid::entrance(6);
        grid.get_mut(start).unwrap().viable[Heading::South.index()] = Some(0);

        let readings: [(Heading, SensorReadings); 4] = [
            (Heading::North, [0, 2, 1]),
            (Heading::East, [2, 1, 0]),
            (Heading::West, [0, 0, 2]),
            (Heading::South, [1, 0, 0]),
        ];

        let mut before = grid.get(start).unwrap().viable;
        for (heading, sensors) in readings {
            grid.on_visit(start, heading, sensors);
            let after = grid.get(start).unwrap().viable;
            for side in 0..4 {
                if before[side].is_some() {
                    assert!(after[side].is_some(), "slot {} went back to unknown", side);
                }
            }
            before = after;
        }
        assert!(grid.get(start).unwrap().is_fully_explored());
    }

    #[test]
    fn test_relax_costs_only_lowers() {
        let mut grid = Grid::new(12);
        grid.insert(cell_with((7, 4), [Some(1); 4], 3));
        grid.insert(cell_with((7, 6), [Some(1); 4], 8));
        grid.insert(Cell::new(Location::new(7, 5)));
        let target = Location::new(7, 5);

        grid.relax_costs(Location::new(7, 6), &[target]);
        let cell = grid.get(target).unwrap();
        assert_eq!(cell.g_cost, Some(9));
        assert_eq!(cell.f_cost, Some(9 + grid.distance_to_goal(target)));
        assert_eq!(cell.parent, Some(Location::new(7, 6)));

        grid.relax_costs(Location::new(7, 4), &[target]);
        let cell = grid.get(target).unwrap();
        assert_eq!(cell.g_cost, Some(4));
        assert_eq!(cell.parent, Some(Location::new(7, 4)));

        // A worse route leaves the cost alone
        grid.relax_costs(Location::new(7, 6), &[target]);
        let cell = grid.get(target).unwrap();
        assert_eq!(cell.g_cost, Some(4));
        assert_eq!(cell.f_cost, Some(4 + grid.distance_to_goal(target)));
        assert_eq!(cell.parent, Some(Location::new(7, 4)));
    }

    #[test]
    fn test_relax_costs_from_uncosted_cell() {
        let mut grid = Grid::new(12);
        grid.insert(Cell::new(Location::new(4, 4)));
        grid.insert(Cell::new(Location::new(4, 5)));

        grid.relax_costs(Location::new(4, 4), &[Location::new(4, 5)]);
        assert_eq!(grid.get(Location::new(4, 4)).unwrap().g_cost, Some(0));
        assert_eq!(grid.get(Location::new(4, 5)).unwrap().g_cost, Some(1));
    }

    #[test]
    fn test_unvisited_sorted() {
        let mut grid = Grid::new(12);
        for (loc, g) in [((2, 5), 16), ((3, 7), 15), ((8, 4), 9)] {
            let mut cell = Cell::new(loc.into());
            cell.g_cost = Some(g);
            cell.f_cost = Some(3);
            grid.insert(cell);
            grid.mark_unvisited(loc.into());
        }

        let order = |source: (i32, i32)| grid.unvisited_sorted(source.into());
        assert_eq!(
            order((3, 4)),
            vec![Location::new(2, 5), Location::new(3, 7), Location::new(8, 4)]
        );
        assert_eq!(
            order((5, 4)),
            vec![Location::new(8, 4), Location::new(2, 5), Location::new(3, 7)]
        );
        assert_eq!(
            order((3, 6)),
            vec![Location::new(3, 7), Location::new(2, 5), Location::new(8, 4)]
        );
    }

    #[test]
    fn test_reset_keeps_walls() {
        let mut grid = Grid::new(4);
        let start = Grid::entrance(4);
        grid.get_mut(start).unwrap().viable = [Some(1), Some(0), Some(0), Some(0)];
        grid.relax_costs(start, &[]);
        grid.on_visit(start, Heading::North, [0, 1, 0]);
        grid.get_mut(start).unwrap().deadend_score = 3;

        grid.reset();

        let cell = grid.get(start).unwrap();
        assert_eq!(cell.visits, 0);
        assert_eq!(cell.g_cost, None);
        assert_eq!(cell.parent, None);
        assert_eq!(cell.viable, [Some(1), Some(0), Some(0), Some(0)]);
        assert_eq!(cell.deadend_score, 3);
        assert!(grid.unvisited().is_empty());
    }

    #[test]
    fn test_follow_parent() {
        let mut grid = Grid::new(12);
        grid.insert(Cell::new(Location::new(11, 0)));
        grid.insert(Cell::with_parent(Location::new(10, 0), Location::new(11, 0)));
        grid.insert(Cell::with_parent(Location::new(10, 1), Location::new(10, 0)));

        let path = grid
            .follow_parent(Location::new(11, 0), Location::new(10, 1))
            .unwrap();
        assert_eq!(path, vec![Location::new(10, 0), Location::new(10, 1)]);
    }

    #[test]
    fn test_follow_parent_detects_cycle() {
        let mut grid = Grid::new(12);
        grid.insert(Cell::with_parent(Location::new(5, 5), Location::new(5, 6)));
        grid.insert(Cell::with_parent(Location::new(5, 6), Location::new(5, 5)));

        let result = grid.follow_parent(Location::new(11, 0), Location::new(5, 5));
        assert_eq!(
            result,
            Err(NavigationError::InconsistentParentChain {
                location: Location::new(5, 5)
            })
        );
    }
}
