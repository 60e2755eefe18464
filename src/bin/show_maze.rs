//! Prints a maze description as text, optionally with marks, coordinates,
//! distance to the centre, or the paths and statistics of a run report.

use clap::{Parser, ValueEnum};
use maze_runner::optimizer::expand_waypoints;
use maze_runner::render::{render_maze, Overlay};
use maze_runner::report::RunReport;
use maze_runner::{Config, Location, Maze};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PathKind {
    /// Entrance to centre, as explored
    Outbound,
    /// Centre back to the entrance, as explored
    Return,
    /// Every cell crossed by the final run
    Optimized,
}

#[derive(Parser)]
#[command(name = "show_maze")]
#[command(about = "Render a maze description with optional overlays")]
struct Cli {
    /// Maze description file
    maze: PathBuf,

    /// JSON file holding a list of [row, col] pairs to mark
    #[arg(short = 'r', long = "marks", conflicts_with_all = ["coord", "dist", "report"])]
    marks: Option<PathBuf>,

    /// Show cell coordinates
    #[arg(short = 'c', long = "coord", conflicts_with_all = ["dist", "report"])]
    coord: bool,

    /// Show distance to the centre
    #[arg(short = 'd', long = "dist", conflicts_with = "report")]
    dist: bool,

    /// Run report written by run_trial; prints its statistics and marks a path
    #[arg(short = 'l', long = "report")]
    report: Option<PathBuf>,

    /// Which path of the report to mark
    #[arg(short = 'p', long = "path", value_enum, default_value = "optimized")]
    path: PathKind,
}

fn report_path(report: &RunReport, kind: PathKind) -> Result<Vec<Location>, Box<dyn std::error::Error>> {
    let cells = match kind {
        PathKind::Outbound => report.outbound_path.clone(),
        PathKind::Return => report.return_path.clone(),
        PathKind::Optimized => {
            let entrance = maze_runner::Grid::entrance(report.maze_dim);
            expand_waypoints(entrance, &report.optimized_path)?
        }
    };
    Ok(cells)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let maze = Maze::load(&cli.maze)?;

    let output = if let Some(marks) = &cli.marks {
        let pairs: Vec<(i32, i32)> = serde_json::from_str(&fs::read_to_string(marks)?)?;
        let cells: Vec<Location> = pairs.into_iter().map(Location::from).collect();
        render_maze(&maze, Overlay::Marks(&cells))
    } else if let Some(report_file) = &cli.report {
        let report = RunReport::load_from_file(report_file)?;
        let cells = report_path(&report, cli.path)?;
        let config = Config::load();
        format!(
            "{}{}",
            report.table(config.trial.exploration_divisor),
            render_maze(&maze, Overlay::Marks(&cells))
        )
    } else if cli.coord {
        render_maze(&maze, Overlay::Coordinates)
    } else if cli.dist {
        render_maze(&maze, Overlay::DistanceToGoal)
    } else {
        render_maze(&maze, Overlay::Empty)
    };

    println!("{}", output);
    Ok(())
}
