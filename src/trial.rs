//! Headless trial harness: drives a `Robot` through a `Maze` the way the
//! micromouse tester does.
//!
//! A trial has two runs and a shared step limit. During the first run the
//! robot may reset once it has entered the goal region; the second run ends
//! as soon as it enters the goal. Score = second run steps + first run steps / 30.

use crate::config::TrialConfig;
use crate::error::NavigationError;
use crate::location::{Heading, Location};
use crate::maze::Maze;
use crate::robot::{Command, Motion, Robot};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Result of one harness step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The robot moved, possibly cut short by a wall
    Moved {
        from: Location,
        to: Location,
        motion: Motion,
        blocked: bool,
    },
    /// First run ended; the robot is back at the entrance
    ResetAccepted,
    /// Reset requested before reaching the goal, or during the second run
    ResetRejected,
    /// Second run reached the goal
    Completed,
    /// Step limit hit
    TimedOut,
}

/// Summary of a trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Steps taken in each run that ended
    pub run_steps: Vec<u32>,
    pub total_steps: u32,
    pub completed: bool,
    pub score: Option<f64>,
}

pub struct Trial<'a> {
    maze: &'a Maze,
    config: TrialConfig,
    max_stride: i32,
    location: Location,
    heading: Heading,
    run: usize,
    hit_goal: bool,
    total_steps: u32,
    run_steps: Vec<u32>,
    completed: bool,
    timed_out: bool,
}

impl<'a> Trial<'a> {
    pub fn new(maze: &'a Maze, config: TrialConfig, max_stride: u32) -> Self {
        Trial {
            maze,
            config,
            max_stride: max_stride as i32,
            location: maze.entrance(),
            heading: Heading::North,
            run: 0,
            hit_goal: false,
            total_steps: 0,
            run_steps: Vec::new(),
            completed: false,
            timed_out: false,
        }
    }

    pub fn maze(&self) -> &Maze {
        self.maze
    }

    /// Robot position as seen by the harness
    pub fn location(&self) -> Location {
        self.location
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Index of the current run, 0 or 1
    pub fn run(&self) -> usize {
        self.run
    }

    pub fn is_finished(&self) -> bool {
        self.completed || self.timed_out
    }

    /// Feed one sensor reading to the robot and apply its answer
    pub fn step(&mut self, robot: &mut Robot) -> Result<StepOutcome, NavigationError> {
        if self.completed {
            return Ok(StepOutcome::Completed);
        }
        if self.timed_out || self.total_steps >= self.config.max_steps {
            if !self.timed_out {
                warn!("Allotted time exceeded after {} steps", self.total_steps);
            }
            self.timed_out = true;
            return Ok(StepOutcome::TimedOut);
        }

        self.total_steps += 1;
        let sensors = self.maze.sensor_readings(self.location, self.heading);

        match robot.next_move(sensors)? {
            Command::Reset => Ok(self.reset()),
            Command::Move(motion) => Ok(self.apply(motion)),
        }
    }

    fn reset(&mut self) -> StepOutcome {
        if self.run == 0 && self.hit_goal {
            info!("Ending first run after {} steps. Starting next run.", self.total_steps);
            self.run_steps.push(self.total_steps);
            self.run = 1;
            self.location = self.maze.entrance();
            self.heading = Heading::North;
            StepOutcome::ResetAccepted
        } else if self.run == 0 {
            warn!("Cannot reset - robot has not hit goal yet.");
            StepOutcome::ResetRejected
        } else {
            warn!("Cannot reset on runs after the first.");
            StepOutcome::ResetRejected
        }
    }

    fn apply(&mut self, motion: Motion) -> StepOutcome {
        self.heading = self.heading.rotate(motion.rotation.quarter_turns());

        let distance = motion.distance.clamp(-self.max_stride, self.max_stride);
        if distance != motion.distance {
            warn!("Movement limited to {} squares in a direction.", self.max_stride);
        }

        let from = self.location;
        let (to, blocked) = self.maze.advance(from, self.heading, distance);
        if blocked {
            warn!("Movement stopped by wall at {}.", to);
        }
        self.location = to;

        if self.maze.is_goal(to) {
            self.hit_goal = true;
            if self.run != 0 {
                let earlier: u32 = self.run_steps.iter().sum();
                self.run_steps.push(self.total_steps - earlier);
                self.completed = true;
                info!("Goal found; run {} completed!", self.run);
                return StepOutcome::Completed;
            }
        }

        StepOutcome::Moved {
            from,
            to,
            motion,
            blocked,
        }
    }

    /// Score of a completed trial
    pub fn score(&self) -> Option<f64> {
        if !self.completed {
            return None;
        }
        let exploration = *self.run_steps.first()? as f64;
        let final_run = *self.run_steps.get(1)? as f64;
        Some(final_run + exploration / self.config.exploration_divisor)
    }

    pub fn summary(&self) -> TrialSummary {
        TrialSummary {
            run_steps: self.run_steps.clone(),
            total_steps: self.total_steps,
            completed: self.completed,
            score: self.score(),
        }
    }

    /// Step until the trial completes or times out
    pub fn run_to_end(&mut self, robot: &mut Robot) -> Result<TrialSummary, NavigationError> {
        while !self.is_finished() {
            self.step(robot)?;
        }
        let summary = self.summary();
        match summary.score {
            Some(score) => info!("Task complete! Score: {:.3}", score),
            None => warn!("Trial ended without completing the final run"),
        }
        Ok(summary)
    }
}
