//! Path optimizer for the final run.
//!
//! Combines the outbound and return traversals into one route, then
//! compresses straight stretches into multi-cell waypoints.

use crate::error::NavigationError;
use crate::location::{Heading, Location};

/// Merge two routes that share their endpoints, keeping the cheaper leg
/// between every pair of locations they have in common.
///
/// The longer route is walked; whenever one of its locations also appears in
/// the shorter route (at or after the shorter route's cursor), the two legs
/// ending there are compared and the shorter one is kept. Ties keep the
/// longer route's leg.
///
/// The result is never longer than the shorter input. Mixing legs from both
/// routes can make it strictly shorter than either one.
pub fn select_short_legs(a: &[Location], b: &[Location]) -> Vec<Location> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut merged = Vec::with_capacity(short.len());
    let mut long_cursor = 0;
    let mut short_cursor = 0;

    for (i, loc) in long.iter().enumerate() {
        let Some(offset) = short[short_cursor..].iter().position(|l| l == loc) else {
            continue;
        };
        let j = short_cursor + offset;

        let long_leg = &long[long_cursor..=i];
        let short_leg = &short[short_cursor..=j];
        if short_leg.len() < long_leg.len() {
            merged.extend_from_slice(short_leg);
        } else {
            merged.extend_from_slice(long_leg);
        }

        long_cursor = i + 1;
        short_cursor = j + 1;
    }

    // Routes that do not share their last location keep the rest of the longer one
    merged.extend_from_slice(&long[long_cursor..]);
    merged
}

/// Compress a cell-by-cell route into waypoints.
///
/// The last cell of every straight run becomes a waypoint, and a run is cut
/// after `max_stride` cells. The final location is always a waypoint.
/// The first location is the origin and is not repeated in the output.
pub fn merge_steps(locations: &[Location], max_stride: u32) -> Vec<Location> {
    let max_stride = max_stride.max(1);
    let mut waypoints = Vec::new();
    let mut run_heading: Option<Heading> = None;
    let mut run_len = 0;

    for pair in locations.windows(2) {
        let heading = Heading::between(pair[0], pair[1]);
        if run_len > 0 && heading != run_heading {
            waypoints.push(pair[0]);
            run_len = 0;
        }
        run_heading = heading;
        run_len += 1;

        if run_len == max_stride {
            waypoints.push(pair[1]);
            run_len = 0;
        }
    }

    if run_len > 0 {
        if let Some(last) = locations.last() {
            waypoints.push(*last);
        }
    }
    waypoints
}

/// Walk straight from `origin` through each waypoint, listing every cell passed.
/// The origin itself is not included.
pub fn expand_waypoints(
    origin: Location,
    waypoints: &[Location],
) -> Result<Vec<Location>, NavigationError> {
    let mut cells = Vec::new();
    let mut from = origin;

    for &to in waypoints {
        let heading = Heading::between(from, to).ok_or(NavigationError::NonStraightMove { from, to })?;
        let mut cursor = from;
        while cursor != to {
            cursor = cursor.step(heading);
            cells.push(cursor);
        }
        from = to;
    }

    Ok(cells)
}
