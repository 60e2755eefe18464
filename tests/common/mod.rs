#![allow(dead_code)]

use maze_runner::config::TrialConfig;
use maze_runner::{Heading, Location, Maze, Robot, Trial, TrialSummary};
use std::path::PathBuf;

/// Path of a maze description shipped in `mazes/`
pub fn maze_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("mazes").join(name)
}

pub fn load_maze(name: &str) -> Maze {
    let path = maze_path(name);
    Maze::load(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
}

/// Route log output through the test harness; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Run a full trial with default settings
pub fn run_trial(maze: &Maze) -> (Robot, TrialSummary) {
    init_logging();
    let mut robot = Robot::new(maze.dim);
    let mut trial = Trial::new(maze, TrialConfig::default(), robot.config().max_stride);
    let summary = trial
        .run_to_end(&mut robot)
        .unwrap_or_else(|e| panic!("navigation failed: {}", e));
    (robot, summary)
}

pub fn path(cells: &[(i32, i32)]) -> Vec<Location> {
    cells.iter().map(|&c| c.into()).collect()
}

/// True when every consecutive pair is adjacent with no wall between them
pub fn is_walkable(maze: &Maze, cells: &[Location]) -> bool {
    cells.windows(2).all(|pair| {
        Heading::ALL
            .into_iter()
            .any(|h| pair[0].step(h) == pair[1] && maze.is_open(pair[0], h))
    })
}
