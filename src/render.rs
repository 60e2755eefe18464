use crate::grid::Grid;
use crate::location::{Heading, Location};
use crate::maze::Maze;

const CELL_LEN: usize = 5;
const COORD_LEN: usize = 3;

/// What to print inside each cell
#[derive(Debug, Clone, Copy)]
pub enum Overlay<'a> {
    Empty,
    /// Star on each listed cell and on the entrance
    Marks(&'a [Location]),
    /// `row,col` of every cell
    Coordinates,
    /// Manhattan distance to the centre goal
    DistanceToGoal,
}

/// Per-cell labels for an overlay, indexed `row * dim + col`
pub fn labels(dim: i32, overlay: Overlay) -> Vec<Option<String>> {
    let mut labels = vec![None; (dim * dim).max(0) as usize];
    let index = |loc: Location| -> Option<usize> {
        if loc.row >= 0 && loc.row < dim && loc.col >= 0 && loc.col < dim {
            Some((loc.row * dim + loc.col) as usize)
        } else {
            None
        }
    };

    match overlay {
        Overlay::Empty => {}
        Overlay::Marks(cells) => {
            for &loc in cells.iter().chain(std::iter::once(&Grid::entrance(dim))) {
                if let Some(i) = index(loc) {
                    labels[i] = Some("*".to_string());
                }
            }
        }
        Overlay::Coordinates => {
            for row in 0..dim {
                for col in 0..dim {
                    labels[(row * dim + col) as usize] = Some(format!("{},{}", row, col));
                }
            }
        }
        Overlay::DistanceToGoal => {
            let grid = Grid::new(dim);
            for row in 0..dim {
                for col in 0..dim {
                    let distance = grid.distance_to_goal(Location::new(row, col));
                    labels[(row * dim + col) as usize] = Some(distance.to_string());
                }
            }
        }
    }
    labels
}

/// Draw the maze as text, north at the top, with row and column numbers
pub fn render_maze(maze: &Maze, overlay: Overlay) -> String {
    let dim = maze.dim;
    let labels = labels(dim, overlay);
    let blank = " ".repeat(CELL_LEN);

    let mut out = String::from("\n");
    out.push_str(&" ".repeat(COORD_LEN + 1));
    for col in 0..dim {
        out.push_str(&format!("{:^6}", col));
    }
    out.push('\n');
    out.push_str(&" ".repeat(COORD_LEN));
    out.push('+');
    for _ in 0..dim {
        out.push_str(&"-".repeat(CELL_LEN));
        out.push('+');
    }
    out.push('\n');

    for row in 0..dim {
        out.push_str(&format!("{:^3}|", row));
        for col in 0..dim {
            let loc = Location::new(row, col);
            match &labels[(row * dim + col) as usize] {
                Some(label) => out.push_str(&format!("{:^5}", label)),
                None => out.push_str(&blank),
            }
            out.push(east_edge(maze, loc));
        }
        out.push('\n');

        out.push_str(&" ".repeat(COORD_LEN));
        out.push('|');
        for col in 0..dim {
            let loc = Location::new(row, col);
            if maze.is_open(loc, Heading::South) {
                out.push_str(&blank);
            } else {
                out.push_str(&"_".repeat(CELL_LEN));
            }
            out.push(east_edge(maze, loc));
        }
        out.push('\n');
    }

    out
}

fn east_edge(maze: &Maze, loc: Location) -> char {
    if maze.is_open(loc, Heading::East) {
        ' '
    } else {
        '|'
    }
}
