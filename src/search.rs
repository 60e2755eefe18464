use crate::error::NavigationError;
use crate::grid::Grid;
use crate::location::{Heading, Location};
use log::trace;
use std::collections::{HashMap, HashSet, VecDeque};

/// Search tree shared by all candidates of one planning step.
/// Maps a location to the number of steps from the root and the cell it was reached from.
pub type SearchTree = HashMap<Location, (u32, Location)>;

/// Tree holding only its root
pub fn new_tree(root: Location) -> SearchTree {
    HashMap::from([(root, (0, root))])
}

/// Known open neighbours of `loc` that are not dead ends, in heading order.
/// Unlike `Grid::neighbours` this never creates cells.
fn open_neighbours(grid: &Grid, loc: Location) -> Vec<Location> {
    let Some(cell) = grid.get(loc) else {
        return Vec::new();
    };
    Heading::ALL
        .into_iter()
        .filter(|h| cell.is_open(*h))
        .map(|h| loc.step(h))
        .filter(|n| grid.get(*n).map_or(false, |c| !c.is_deadend()))
        .collect()
}

/// Depth-first search from `start` towards `target`, recording every cell it
/// passes through in `tree`. Only fully explored cells are expanded; the
/// target itself may still have unknown sides.
///
/// A branch is pruned once the target is already recorded at `budget` steps or
/// fewer, or when `budget` exceeds the number of cells in the maze.
/// Returns true if this call or one of its descendants reached the target.
pub fn build_tree(
    grid: &Grid,
    start: Location,
    target: Location,
    tree: &mut SearchTree,
    budget: u32,
) -> bool {
    if let Some(&(steps, _)) = tree.get(&target) {
        if steps <= budget {
            return false;
        }
    }
    if budget > (grid.dim * grid.dim) as u32 {
        return false;
    }

    let mut found = false;
    for neighbour in open_neighbours(grid, start) {
        if let Some(&(steps, _)) = tree.get(&neighbour) {
            if steps <= budget {
                continue;
            }
        }

        if neighbour == target {
            trace!("Reached {} from {} in {} steps", target, start, budget);
            tree.insert(neighbour, (budget, start));
            found = true;
            continue;
        }

        let explored = grid.get(neighbour).map_or(false, |c| c.is_fully_explored());
        if !explored {
            continue;
        }

        tree.insert(neighbour, (budget, start));
        if build_tree(grid, neighbour, target, tree, budget + 1) {
            found = true;
        }
    }
    found
}

/// Make sure `end` is in the tree rooted at `root`.
///
/// Cells found by earlier candidates are reused: when a fully explored tree
/// cell opens onto `end`, the closest such cell becomes its parent. Otherwise
/// a fresh `build_tree` pass runs from the root.
pub fn reach(grid: &Grid, root: Location, end: Location, tree: &mut SearchTree) -> bool {
    if tree.contains_key(&end) {
        return true;
    }

    let mut best: Option<(u32, Location)> = None;
    for heading in Heading::ALL {
        let neighbour = end.step(heading);
        let Some(&(steps, _)) = tree.get(&neighbour) else {
            continue;
        };
        let Some(cell) = grid.get(neighbour) else {
            continue;
        };
        let usable = neighbour == root || (cell.is_fully_explored() && !cell.is_deadend());
        if usable && cell.is_open(heading.opposite()) && best.map_or(true, |(s, _)| steps < s) {
            best = Some((steps, neighbour));
        }
    }

    if let Some((steps, parent)) = best {
        tree.insert(end, (steps + 1, parent));
        return true;
    }

    build_tree(grid, root, end, tree, 1);
    tree.contains_key(&end)
}

/// Rebuild the path from `start` to `end` through the tree's parent links.
/// `start` is excluded, `end` included.
pub fn tree_path(
    tree: &SearchTree,
    start: Location,
    end: Location,
) -> Result<Vec<Location>, NavigationError> {
    if start == end {
        return Ok(Vec::new());
    }

    let mut path = VecDeque::from([end]);
    let mut seen = HashSet::from([end]);
    let mut current = end;

    loop {
        let &(_, parent) = tree
            .get(&current)
            .ok_or(NavigationError::BrokenParentChain { location: current })?;
        if parent == start {
            break;
        }
        if parent == current || !seen.insert(parent) {
            return Err(NavigationError::InconsistentParentChain { location: parent });
        }
        path.push_front(parent);
        current = parent;
    }

    Ok(path.into())
}

/// Format path for display
pub fn format_path(path: &[Location]) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    path.iter()
        .map(|loc| loc.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    /// Open corridor (3,0) -> (2,0) -> (2,1) -> (2,2) in a 4x4 maze, walls everywhere else
    fn corridor() -> Grid {
        let mut grid = Grid::new(4);
        grid.insert(Cell::with_viable(
            Location::new(3, 0),
            [Some(1), Some(0), Some(0), Some(0)],
        ));
        grid.insert(Cell::with_viable(
            Location::new(2, 0),
            [Some(0), Some(2), Some(1), Some(0)],
        ));
        grid.insert(Cell::with_viable(
            Location::new(2, 1),
            [Some(0), Some(1), Some(0), Some(1)],
        ));
        grid.insert(Cell::with_viable(
            Location::new(2, 2),
            [Some(0), None, Some(0), Some(2)],
        ));
        grid
    }

    #[test]
    fn test_build_tree_follows_corridor() {
        let grid = corridor();
        let root = Location::new(3, 0);
        let target = Location::new(2, 2);
        let mut tree = new_tree(root);

        assert!(build_tree(&grid, root, target, &mut tree, 1));
        assert_eq!(tree[&target], (3, Location::new(2, 1)));

        let path = tree_path(&tree, root, target).unwrap();
        assert_eq!(
            path,
            vec![Location::new(2, 0), Location::new(2, 1), Location::new(2, 2)]
        );
        assert_eq!(format_path(&path), "(2, 0) -> (2, 1) -> (2, 2)");
    }

    #[test]
    fn test_build_tree_skips_unexplored_cells() {
        let mut grid = corridor();
        // (2, 1) loses its west reading, so nothing can route through it
        grid.get_mut(Location::new(2, 1)).unwrap().viable[3] = None;
        let root = Location::new(3, 0);
        let mut tree = new_tree(root);

        assert!(!build_tree(&grid, root, Location::new(2, 2), &mut tree, 1));
        assert!(!tree.contains_key(&Location::new(2, 1)));
    }

    #[test]
    fn test_build_tree_never_enters_dead_ends() {
        let mut grid = corridor();
        grid.get_mut(Location::new(2, 1)).unwrap().deadend_score = 5;
        let root = Location::new(3, 0);
        let mut tree = new_tree(root);

        assert!(!build_tree(&grid, root, Location::new(2, 2), &mut tree, 1));
    }

    #[test]
    fn test_build_tree_respects_recursion_bound() {
        let grid = corridor();
        let root = Location::new(3, 0);
        let mut tree = new_tree(root);

        assert!(!build_tree(&grid, root, Location::new(2, 2), &mut tree, 17));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_reach_reuses_tree() {
        let grid = corridor();
        let root = Location::new(3, 0);
        let mut tree = new_tree(root);
        tree.insert(Location::new(2, 0), (1, root));
        tree.insert(Location::new(2, 1), (2, Location::new(2, 0)));

        assert!(reach(&grid, root, Location::new(2, 2), &mut tree));
        assert_eq!(tree[&Location::new(2, 2)], (3, Location::new(2, 1)));
    }

    #[test]
    fn test_tree_path_detects_cycle() {
        let root = Location::new(3, 0);
        let mut tree = new_tree(root);
        tree.insert(Location::new(2, 0), (1, Location::new(2, 1)));
        tree.insert(Location::new(2, 1), (2, Location::new(2, 0)));

        let result = tree_path(&tree, root, Location::new(2, 1));
        assert!(matches!(
            result,
            Err(NavigationError::InconsistentParentChain { .. })
        ));
    }

    #[test]
    fn test_tree_path_missing_link() {
        let root = Location::new(3, 0);
        let tree = new_tree(root);
        let result = tree_path(&tree, root, Location::new(0, 0));
        assert_eq!(
            result,
            Err(NavigationError::BrokenParentChain {
                location: Location::new(0, 0)
            })
        );
    }
}
