//! Runs a full headless trial of the navigator on a maze description and
//! writes the run report.

use clap::Parser;
use log::info;
use maze_runner::report::RunReport;
use maze_runner::{Config, Maze, Robot, Trial};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "run_trial")]
#[command(about = "Drive the navigator through a maze and score the result")]
struct Cli {
    /// Maze description file (defaults to the configured maze)
    maze: Option<PathBuf>,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(short = 'f', long = "config")]
    config: Option<PathBuf>,

    /// Where to write the JSON run report (defaults to the configured path)
    #[arg(short = 'o', long = "report")]
    report: Option<PathBuf>,

    /// Skip writing the run report
    #[arg(long = "no-report")]
    no_report: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load(),
    };
    let maze_path = cli
        .maze
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.maze.path));
    let maze = Maze::load(&maze_path)?;

    let mut robot = Robot::with_config(maze.dim, config.navigator.clone());
    let mut trial = Trial::new(&maze, config.trial.clone(), config.navigator.max_stride);
    let summary = trial.run_to_end(&mut robot)?;

    let report = RunReport::from_robot(&robot, Some(summary));
    print!("{}", report.table(config.trial.exploration_divisor));

    if !cli.no_report && config.logging.enable_report {
        let report_path = cli
            .report
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.logging.report_path));
        report.save_to_file(&report_path)?;
        info!("Run report saved to {}", report_path.display());
    }

    Ok(())
}
