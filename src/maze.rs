use crate::error::MazeError;
use crate::grid::{Grid, SensorReadings};
use crate::location::{Heading, Location};
use log::info;
use std::fs;
use std::path::Path;

/// Ground truth of a maze, read from a wall bitmask description.
///
/// File format: the first line holds the dimension, followed by `dim` lines of
/// `dim` comma-separated values. Line `x` describes column `x`, value `y`
/// counts from the bottom row. Each value is a bitmask of open sides:
/// 1 = north, 2 = east, 4 = south, 8 = west.
#[derive(Debug, Clone, PartialEq)]
pub struct Maze {
    pub dim: i32,
    /// Open-side bitmask per cell, indexed `row * dim + col`
    openings: Vec<u8>,
}

impl Maze {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MazeError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let maze = Maze::parse(&contents)?;
        info!("Loaded {}x{} maze from {}", maze.dim, maze.dim, path.display());
        Ok(maze)
    }

    pub fn parse(contents: &str) -> Result<Self, MazeError> {
        let mut lines = contents
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (line_no, first) = lines
            .next()
            .ok_or_else(|| MazeError::malformed("empty maze description"))?;
        let dim: i32 = first.parse().map_err(|_| MazeError::Parse {
            line: line_no,
            value: first.to_string(),
        })?;
        if dim < 2 || dim % 2 != 0 {
            return Err(MazeError::malformed(format!(
                "dimension {} must be even and at least 2",
                dim
            )));
        }

        let mut openings = vec![0u8; (dim * dim) as usize];
        let mut columns = 0;
        for (line_no, line) in lines {
            if columns == dim {
                return Err(MazeError::malformed(format!(
                    "line {}: more than {} columns",
                    line_no, dim
                )));
            }

            let values = line
                .split(',')
                .map(|v| {
                    let v = v.trim();
                    v.parse::<u8>().map_err(|_| MazeError::Parse {
                        line: line_no,
                        value: v.to_string(),
                    })
                })
                .collect::<Result<Vec<u8>, MazeError>>()?;
            if values.len() != dim as usize {
                return Err(MazeError::malformed(format!(
                    "line {}: {} values, expected {}",
                    line_no,
                    values.len(),
                    dim
                )));
            }

            let col = columns;
            for (y, value) in values.into_iter().enumerate() {
                if value > 15 {
                    return Err(MazeError::malformed(format!(
                        "line {}: wall mask {} out of range",
                        line_no, value
                    )));
                }
                let row = dim - 1 - y as i32;
                openings[(row * dim + col) as usize] = value;
            }
            columns += 1;
        }

        if columns != dim {
            return Err(MazeError::malformed(format!(
                "{} columns, expected {}",
                columns, dim
            )));
        }

        let maze = Maze { dim, openings };
        maze.validate()?;
        Ok(maze)
    }

    /// Walls must agree between neighbours and the outer boundary must be closed
    fn validate(&self) -> Result<(), MazeError> {
        for row in 0..self.dim {
            for col in 0..self.dim {
                let loc = Location::new(row, col);
                for heading in Heading::ALL {
                    let open = self.mask(loc) & heading_bit(heading) != 0;
                    let neighbour = loc.step(heading);
                    if !self.in_bounds(neighbour) {
                        if open {
                            return Err(MazeError::malformed(format!(
                                "cell {} opens {:?} through the outer wall",
                                loc, heading
                            )));
                        }
                        continue;
                    }
                    let reverse = self.mask(neighbour) & heading_bit(heading.opposite()) != 0;
                    if open != reverse {
                        return Err(MazeError::malformed(format!(
                            "walls of {} and {} disagree",
                            loc, neighbour
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn in_bounds(&self, loc: Location) -> bool {
        loc.row >= 0 && loc.row < self.dim && loc.col >= 0 && loc.col < self.dim
    }

    fn mask(&self, loc: Location) -> u8 {
        self.openings[(loc.row * self.dim + loc.col) as usize]
    }

    /// True when the side of `loc` facing `heading` is open
    pub fn is_open(&self, loc: Location, heading: Heading) -> bool {
        self.in_bounds(loc) && self.mask(loc) & heading_bit(heading) != 0
    }

    /// Number of open cells in a straight line before a wall
    pub fn dist_to_wall(&self, loc: Location, heading: Heading) -> u32 {
        let mut distance = 0;
        let mut cursor = loc;
        while self.is_open(cursor, heading) {
            distance += 1;
            cursor = cursor.step(heading);
        }
        distance
    }

    /// Left, front and right distances seen from `loc` facing `heading`
    pub fn sensor_readings(&self, loc: Location, heading: Heading) -> SensorReadings {
        heading
            .sensor_headings()
            .map(|side| self.dist_to_wall(loc, side))
    }

    /// Move up to `distance` cells, backwards when negative, stopping at the
    /// first wall. Returns the final location and whether a wall cut the move short.
    pub fn advance(&self, loc: Location, heading: Heading, distance: i32) -> (Location, bool) {
        let direction = if distance < 0 { heading.opposite() } else { heading };
        let mut cursor = loc;
        for _ in 0..distance.unsigned_abs() {
            if !self.is_open(cursor, direction) {
                return (cursor, true);
            }
            cursor = cursor.step(direction);
        }
        (cursor, false)
    }

    pub fn is_goal(&self, loc: Location) -> bool {
        Grid::centre_goals(self.dim).contains(&loc)
    }

    pub fn entrance(&self) -> Location {
        Grid::entrance(self.dim)
    }
}

fn heading_bit(heading: Heading) -> u8 {
    1 << heading.index()
}
