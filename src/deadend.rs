use crate::grid::{Grid, SensorReadings};
use crate::location::Location;
use log::{debug, trace};
use std::collections::HashSet;

/// Detect a dead end at `loc` and compute the route back out of it.
///
/// A cell is a dead end when all of its sides are known and the three sensors
/// see no opening. It is scored `dim² + 1`, and every ancestor in the corridor
/// leading to it (two or more closed sides) gets a score one lower than the
/// previous one. The walk stops at the first junction, at the search root, at
/// a goal or on a repeated location; the stopping cell is the last step of the
/// returned path but is never scored.
///
/// A cell that is already scored returns the same route and leaves every score
/// untouched. An empty path means `loc` is not a dead end.
pub fn escape_on_deadend(grid: &mut Grid, loc: Location, sensors: SensorReadings) -> Vec<Location> {
    let Some(cell) = grid.get(loc) else {
        return Vec::new();
    };
    if !cell.is_fully_explored() || sensors.iter().any(|s| *s != 0) {
        return Vec::new();
    }

    let assign = !cell.is_deadend();
    let mut score = (grid.dim * grid.dim) as u32 + 1;
    if assign {
        if let Some(cell) = grid.get_mut(loc) {
            cell.deadend_score = score;
        }
        debug!("Deadend at {} scored {}", loc, score);
    }

    let mut path = Vec::new();
    let mut seen = HashSet::from([loc]);
    let mut next = grid.get(loc).and_then(|c| c.parent);

    while let Some(ancestor) = next {
        if !seen.insert(ancestor) {
            break;
        }
        let Some(cell) = grid.get(ancestor) else {
            break;
        };
        path.push(ancestor);

        let parent = cell.parent;
        let in_corridor = cell.closed_sides() >= 2 && parent.is_some() && !grid.is_goal(ancestor);
        if !in_corridor {
            break;
        }

        score = score.saturating_sub(1).max(1);
        if assign {
            trace!("Corridor cell {} scored {}", ancestor, score);
            if let Some(cell) = grid.get_mut(ancestor) {
                cell.deadend_score = score;
            }
        }
        next = parent;
    }

    path
}
