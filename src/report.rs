use crate::error::ReportError;
use crate::location::Location;
use crate::robot::{Phase, Robot};
use crate::trial::TrialSummary;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Per-phase exploration figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    /// Cells known when the phase ended
    pub discovered: usize,
    /// Distinct cells stood on
    pub visited: usize,
    pub moves: u32,
}

/// Run report written after a trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub maze_dim: i32,
    pub phases: Vec<PhaseReport>,
    pub outbound_path: Vec<Location>,
    pub return_path: Vec<Location>,
    pub optimized_path: Vec<Location>,
    /// Harness summary, when the robot was driven by a trial
    pub trial: Option<TrialSummary>,
}

impl RunReport {
    /// Create a report from the robot's bookkeeping
    pub fn from_robot(robot: &Robot, trial: Option<TrialSummary>) -> Self {
        let phases = Phase::ALL
            .iter()
            .map(|&phase| {
                let stats = robot.stats(phase);
                PhaseReport {
                    phase,
                    discovered: stats.discovered,
                    visited: stats.visited.len(),
                    moves: stats.moves,
                }
            })
            .collect();

        RunReport {
            maze_dim: robot.grid.dim,
            phases,
            outbound_path: robot.outbound_path().to_vec(),
            return_path: robot.return_path().to_vec(),
            optimized_path: robot.optimized_path().to_vec(),
            trial,
        }
    }

    /// Trial score, or the same formula applied to the robot's own move counts
    pub fn score(&self, exploration_divisor: f64) -> f64 {
        if let Some(score) = self.trial.as_ref().and_then(|t| t.score) {
            return score;
        }
        let moves = |phase: Phase| {
            self.phases
                .iter()
                .find(|p| p.phase == phase)
                .map_or(0, |p| p.moves) as f64
        };
        (moves(Phase::ExploreToGoal) + moves(Phase::ReturnToStart)) / exploration_divisor
            + moves(Phase::FinalRun)
    }

    /// Save to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load from file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Analysis table: share of cells discovered and visited, moves and score
    pub fn table(&self, exploration_divisor: f64) -> String {
        let total = (self.maze_dim * self.maze_dim).max(1) as f64;
        let mut out = format!("\nTotal cells: {}\n", self.maze_dim * self.maze_dim);
        out.push_str("\nPhase           | Discovered | Visited | Moves");
        out.push_str("\n----------------+------------+---------+-------");
        for p in &self.phases {
            out.push_str(&format!(
                "\n{:15} | {:9.1}% | {:6.1}% | {:5}",
                p.phase.to_string(),
                100.0 * p.discovered as f64 / total,
                100.0 * p.visited as f64 / total,
                p.moves
            ));
        }
        out.push_str(&format!("\n\nScore: {:.3}\n", self.score(exploration_divisor)));
        out
    }
}
