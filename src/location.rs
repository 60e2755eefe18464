use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell position in the maze: row 0 is the north edge, column 0 the west edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub row: i32,
    pub col: i32,
}

impl Location {
    pub fn new(row: i32, col: i32) -> Self {
        Location { row, col }
    }

    /// Manhattan distance between two locations
    pub fn distance(&self, other: &Location) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Location one cell away in the given direction
    pub fn step(&self, heading: Heading) -> Location {
        self.offset(heading, 1)
    }

    /// Location `cells` away in the given direction
    pub fn offset(&self, heading: Heading, cells: i32) -> Location {
        let (dr, dc) = heading.delta();
        Location::new(self.row + dr * cells, self.col + dc * cells)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(i32, i32)> for Location {
    fn from(tuple: (i32, i32)) -> Self {
        Location::new(tuple.0, tuple.1)
    }
}

/// Absolute heading. The discriminant is the index into a cell's `viable` slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Heading {
        Self::ALL[index % 4]
    }

    /// Rotate by quarter turns, positive is clockwise
    pub fn rotate(self, quarter_turns: i32) -> Heading {
        Heading::from_index((self as i32 + quarter_turns).rem_euclid(4) as usize)
    }

    pub fn opposite(self) -> Heading {
        self.rotate(2)
    }

    /// (row, col) delta of one step
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::North => (-1, 0),
            Heading::East => (0, 1),
            Heading::South => (1, 0),
            Heading::West => (0, -1),
        }
    }

    /// Direction of a straight move; `None` for diagonal or zero deltas
    pub fn from_delta(dr: i32, dc: i32) -> Option<Heading> {
        match (dr.signum(), dc.signum()) {
            (-1, 0) => Some(Heading::North),
            (0, 1) => Some(Heading::East),
            (1, 0) => Some(Heading::South),
            (0, -1) => Some(Heading::West),
            _ => None,
        }
    }

    /// Direction from one location to another on the same row or column
    pub fn between(from: Location, to: Location) -> Option<Heading> {
        Heading::from_delta(to.row - from.row, to.col - from.col)
    }

    /// Map the left/front/right sensor order onto absolute headings
    pub fn sensor_headings(self) -> [Heading; 3] {
        [self.rotate(-1), self, self.rotate(1)]
    }

    pub fn short_name(self) -> char {
        match self {
            Heading::North => 'N',
            Heading::East => 'E',
            Heading::South => 'S',
            Heading::West => 'W',
        }
    }
}

/// Turn applied before moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    Left,
    Straight,
    Right,
}

impl Rotation {
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Left => -90,
            Rotation::Straight => 0,
            Rotation::Right => 90,
        }
    }

    /// Anything other than -90/0/90 is rejected, as the tester ignores it
    pub fn from_degrees(degrees: i32) -> Option<Rotation> {
        match degrees {
            -90 => Some(Rotation::Left),
            0 => Some(Rotation::Straight),
            90 => Some(Rotation::Right),
            _ => None,
        }
    }

    pub fn quarter_turns(self) -> i32 {
        self.degrees() / 90
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        let a = Location::new(11, 0);
        let b = Location::new(5, 6);
        assert_eq!(a.distance(&b), 12);
        assert_eq!(b.distance(&a), 12);
    }

    #[test]
    fn test_heading_rotation() {
        assert_eq!(Heading::North.rotate(-1), Heading::West);
        assert_eq!(Heading::West.rotate(1), Heading::North);
        assert_eq!(Heading::East.opposite(), Heading::West);
        assert_eq!(Heading::South.rotate(6), Heading::North);
    }

    #[test]
    fn test_sensor_headings() {
        assert_eq!(
            Heading::North.sensor_headings(),
            [Heading::West, Heading::North, Heading::East]
        );
        assert_eq!(
            Heading::East.sensor_headings(),
            [Heading::North, Heading::East, Heading::South]
        );
    }

    #[test]
    fn test_heading_between() {
        let from = Location::new(7, 4);
        assert_eq!(Heading::between(from, Location::new(6, 4)), Some(Heading::North));
        assert_eq!(Heading::between(from, Location::new(7, 1)), Some(Heading::West));
        assert_eq!(Heading::between(from, Location::new(6, 5)), None);
        assert_eq!(Heading::between(from, from), None);
    }

    #[test]
    fn test_rotation_degrees() {
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Left));
        assert_eq!(Rotation::from_degrees(180), None);
        assert_eq!(Rotation::Right.quarter_turns(), 1);
    }
}
