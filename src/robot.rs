use crate::config::NavigatorConfig;
use crate::deadend::escape_on_deadend;
use crate::error::NavigationError;
use crate::grid::{Grid, SensorReadings};
use crate::location::{Heading, Location, Rotation};
use crate::optimizer::{merge_steps, select_short_legs};
use crate::search::{self, format_path};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

/// Navigation phase. Each run of a trial ends when the phase's goal is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Map the maze on the way from the entrance to the centre
    ExploreToGoal,
    /// Keep mapping on the way back to the entrance
    ReturnToStart,
    /// Replay the optimized route; terminal
    FinalRun,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::ExploreToGoal, Phase::ReturnToStart, Phase::FinalRun];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ExploreToGoal => "explore to goal",
            Phase::ReturnToStart => "return to start",
            Phase::FinalRun => "final run",
        };
        write!(f, "{}", name)
    }
}

/// One motion instruction: turn first, then move.
/// A negative distance drives backwards without turning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motion {
    pub rotation: Rotation,
    pub distance: i32,
}

impl Motion {
    /// Number of cells covered
    pub fn cells(&self) -> u32 {
        self.distance.unsigned_abs()
    }
}

/// What the navigator asks of the harness after a sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Motion),
    /// End the current run; the robot is put back at the entrance facing north
    Reset,
}

/// Bookkeeping for one phase, used for scoring and analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseStats {
    /// Cells known to the grid when the phase ended (or so far)
    pub discovered: usize,
    /// Cells the robot stood on during the phase
    pub visited: BTreeSet<Location>,
    /// Motion commands issued during the phase
    pub moves: u32,
}

/// Translate a straight move between two cells into a motion instruction.
///
/// Returns the motion and the heading after it. Turning left or right changes
/// the heading; moving into the cell behind drives backwards and keeps it.
/// The sign of `distance` encodes the reversal: `(7,4)` facing east to `(7,1)`
/// is rotation 0 with distance -3.
pub fn move_instruction(
    from: Location,
    to: Location,
    heading: Heading,
) -> Result<(Motion, Heading), NavigationError> {
    let direction = Heading::between(from, to).ok_or(NavigationError::NonStraightMove { from, to })?;
    let cells = from.distance(&to) as i32;

    let result = match (direction.index() + 4 - heading.index()) % 4 {
        0 => (
            Motion {
                rotation: Rotation::Straight,
                distance: cells,
            },
            heading,
        ),
        1 => (
            Motion {
                rotation: Rotation::Right,
                distance: cells,
            },
            direction,
        ),
        3 => (
            Motion {
                rotation: Rotation::Left,
                distance: cells,
            },
            direction,
        ),
        _ => (
            Motion {
                rotation: Rotation::Straight,
                distance: -cells,
            },
            heading,
        ),
    };
    Ok(result)
}

/// Maze navigator. Receives one sensor reading per call and answers with one command.
#[derive(Clone, Debug)]
pub struct Robot {
    pub grid: Grid,
    pub heading: Heading,
    pub phase: Phase,
    pub current: Location,
    /// Root of the current phase's search
    pub start: Location,
    /// The maze entrance
    pub origin: Location,
    /// First goal cell reached
    pub goal_cell: Option<Location>,
    active_path: VecDeque<Location>,
    outbound_path: Vec<Location>,
    return_path: Vec<Location>,
    optimized_path: Vec<Location>,
    /// Cells stood on during the current phase, in order
    trail: Vec<Location>,
    stats: [PhaseStats; 3],
    config: NavigatorConfig,
}

impl Robot {
    pub fn new(dim: i32) -> Self {
        Robot::with_config(dim, NavigatorConfig::default())
    }

    pub fn with_config(dim: i32, config: NavigatorConfig) -> Self {
        let origin = Grid::entrance(dim);
        let mut grid = Grid::new(dim);
        let h = grid.distance_to_goal(origin);
        if let Some(cell) = grid.get_mut(origin) {
            cell.set_cost(0, h);
        }

        Robot {
            grid,
            heading: Heading::North,
            phase: Phase::ExploreToGoal,
            current: origin,
            start: origin,
            origin,
            goal_cell: None,
            active_path: VecDeque::new(),
            outbound_path: Vec::new(),
            return_path: Vec::new(),
            optimized_path: Vec::new(),
            trail: vec![origin],
            stats: Default::default(),
            config,
        }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Entrance to first goal cell, both ends included
    pub fn outbound_path(&self) -> &[Location] {
        &self.outbound_path
    }

    /// Goal cell back to the entrance, both ends included
    pub fn return_path(&self) -> &[Location] {
        &self.return_path
    }

    /// Waypoints of the final run, entrance excluded
    pub fn optimized_path(&self) -> &[Location] {
        &self.optimized_path
    }

    /// Cells still queued on the committed route
    pub fn active_path(&self) -> impl Iterator<Item = &Location> {
        self.active_path.iter()
    }

    pub fn stats(&self, phase: Phase) -> &PhaseStats {
        &self.stats[phase.index()]
    }

    /// Decide the next command from the left, front and right sensor distances
    pub fn next_move(&mut self, sensors: SensorReadings) -> Result<Command, NavigationError> {
        self.grid.on_visit(self.current, self.heading, sensors);
        self.record_visit();

        if self.grid.distance_to_goal(self.current) == 0 && self.on_goal_reached() {
            return Ok(Command::Reset);
        }

        let mut next = match self.active_path.pop_front() {
            Some(next) => next,
            None => {
                let route = match self.select_next(sensors) {
                    Err(NavigationError::PlanningExhausted { .. }) => {
                        if let Some(rotation) = self.unsensed_side_turn() {
                            return Ok(self.turn_in_place(rotation));
                        }
                        self.route_to_unsensed()?
                    }
                    other => other?,
                };
                self.active_path = route.into();
                self.active_path
                    .pop_front()
                    .ok_or(NavigationError::PlanningExhausted {
                        location: self.current,
                    })?
            }
        };

        // Waypoints further than one stride away are reached over several moves
        let max_stride = self.config.max_stride.max(1);
        if self.current.distance(&next) > max_stride {
            let heading = Heading::between(self.current, next).ok_or(NavigationError::NonStraightMove {
                from: self.current,
                to: next,
            })?;
            self.active_path.push_front(next);
            next = self.current.offset(heading, max_stride as i32);
        }

        let (motion, heading) = move_instruction(self.current, next, self.heading)?;
        info!(
            "Next move from {} to {}: rotation {}, distance {}, heading {}",
            self.current,
            next,
            motion.rotation.degrees(),
            motion.distance,
            heading.short_name()
        );

        self.heading = heading;
        self.current = next;
        self.trail.push(next);
        self.stats[self.phase.index()].moves += 1;
        Ok(Command::Move(motion))
    }

    fn record_visit(&mut self) {
        let discovered = self.grid.discovered();
        let stats = &mut self.stats[self.phase.index()];
        stats.discovered = discovered;
        stats.visited.insert(self.current);
    }

    /// Plan a route from the current cell: back out of a dead end, or head for
    /// the cheapest reachable frontier cell
    pub fn select_next(&mut self, sensors: SensorReadings) -> Result<Vec<Location>, NavigationError> {
        let escape = escape_on_deadend(&mut self.grid, self.current, sensors);
        if !escape.is_empty() {
            info!("Deadend: {}. Escape path: {}", self.current, format_path(&escape));
            return Ok(escape);
        }

        let candidates = self.grid.unvisited_sorted(self.current);
        match self.cheapest_route(candidates)? {
            Some(path) => {
                debug!("Selected path from {}: {}", self.current, format_path(&path));
                Ok(path)
            }
            None => {
                debug!("No reachable frontier cell from {}", self.current);
                Err(NavigationError::PlanningExhausted {
                    location: self.current,
                })
            }
        }
    }

    /// Lowest-cost reachable candidate, the candidates sharing one search tree
    fn cheapest_route(&self, candidates: Vec<Location>) -> Result<Option<Vec<Location>>, NavigationError> {
        let mut tree = search::new_tree(self.current);
        let mut best: Option<(f64, Vec<Location>)> = None;

        for end in candidates {
            if !search::reach(&self.grid, self.current, end, &mut tree) {
                continue;
            }

            let path = match search::tree_path(&tree, self.current, end) {
                Ok(path) => path,
                Err(err) if err.is_recoverable() => {
                    warn!("Skipping candidate {}: {}", end, err);
                    continue;
                }
                Err(err) => return Err(err),
            };
            if path.is_empty() {
                continue;
            }

            let h_cost = self.grid.distance_to_goal(end);
            let cost = if h_cost == 0 {
                0.0
            } else {
                path.len() as f64 + self.config.heuristic_weight * h_cost as f64
            };
            debug!(
                "From {} to {}, steps: {}, h-cost: {}, cost: {}, path: {}",
                self.current,
                end,
                path.len(),
                h_cost,
                cost,
                format_path(&path)
            );

            if best.as_ref().map_or(true, |(best_cost, _)| cost < *best_cost) {
                best = Some((cost, path));
            }
        }

        Ok(best.map(|(_, path)| path))
    }

    /// Route to the nearest known cell with a side never sensed, such as a
    /// cell entered backwards
    fn route_to_unsensed(&self) -> Result<Vec<Location>, NavigationError> {
        let candidates = self.grid.partially_explored(self.current);
        match self.cheapest_route(candidates)? {
            Some(path) => {
                info!(
                    "Frontier exhausted at {}; revisiting partly sensed cells: {}",
                    self.current,
                    format_path(&path)
                );
                Ok(path)
            }
            None => {
                error!("No more cells to visit. Current: {}", self.current);
                Err(NavigationError::PlanningExhausted {
                    location: self.current,
                })
            }
        }
    }

    /// Quarter turn that brings the unsensed side of the current cell under a sensor
    fn unsensed_side_turn(&self) -> Option<Rotation> {
        let cell = self.grid.get(self.current)?;
        let side = Heading::ALL
            .into_iter()
            .find(|h| cell.opening(*h).is_none())?;
        match (side.index() + 4 - self.heading.index()) % 4 {
            3 => Some(Rotation::Left),
            _ => Some(Rotation::Right),
        }
    }

    fn turn_in_place(&mut self, rotation: Rotation) -> Command {
        self.heading = self.heading.rotate(rotation.quarter_turns());
        info!(
            "Turning in place at {}: rotation {}, heading {}",
            self.current,
            rotation.degrees(),
            self.heading.short_name()
        );
        self.stats[self.phase.index()].moves += 1;
        Command::Move(Motion {
            rotation,
            distance: 0,
        })
    }

    /// Phase transition at a goal. Returns true when the run should stop.
    fn on_goal_reached(&mut self) -> bool {
        info!(
            "Reached goal: {}. Phase: {}, moves: {}",
            self.current,
            self.phase,
            self.stats[self.phase.index()].moves
        );

        match self.phase {
            Phase::ExploreToGoal => {
                self.outbound_path = self.walk_back(self.origin, self.current);
                info!(
                    "Outbound path ({} cells): {}",
                    self.outbound_path.len(),
                    format_path(&self.outbound_path)
                );
                self.goal_cell = Some(self.current);
                let first_step = self.grid.get(self.current).and_then(|c| c.parent);

                self.restart_phase(Some(vec![self.origin]), 1);
                if let Some(step) = first_step {
                    let h = self.grid.distance_to_goal(step);
                    if let Some(cell) = self.grid.get_mut(step) {
                        cell.parent = Some(self.current);
                        cell.set_cost(1, 1 + h);
                    }
                    self.active_path = VecDeque::from([step]);
                }
                self.phase = Phase::ReturnToStart;
                false
            }
            Phase::ReturnToStart => {
                let goal = self.goal_cell.unwrap_or(self.start);
                self.return_path = self.walk_back(goal, self.current);
                info!(
                    "Return path ({} cells): {}",
                    self.return_path.len(),
                    format_path(&self.return_path)
                );

                let inbound: Vec<Location> = self.return_path.iter().rev().copied().collect();
                let merged = select_short_legs(&self.outbound_path, &inbound);
                self.optimized_path = merge_steps(&merged, self.config.max_stride);
                info!(
                    "Optimized path ({} waypoints): {}",
                    self.optimized_path.len(),
                    format_path(&self.optimized_path)
                );

                self.current = self.origin;
                self.heading = Heading::North;
                self.restart_phase(None, 0);
                self.active_path = self.optimized_path.iter().copied().collect();
                self.phase = Phase::FinalRun;
                true
            }
            Phase::FinalRun => true,
        }
    }

    /// Reset per-phase bookkeeping and make the current cell the new search root
    fn restart_phase(&mut self, goals: Option<Vec<Location>>, visits: u32) {
        self.grid.reset();
        self.grid.set_goals(goals);

        let h = self.grid.distance_to_goal(self.current);
        if let Some(cell) = self.grid.get_mut(self.current) {
            cell.parent = None;
            cell.set_cost(0, h);
            cell.visits = visits;
        }
        self.start = self.current;
        self.active_path.clear();
        self.trail = vec![self.current];
    }

    /// Path from `root` to the current cell through parent links, both ends included.
    /// Falls back to the cells stood on during the phase when the chain is unusable.
    fn walk_back(&self, root: Location, end: Location) -> Vec<Location> {
        match self.grid.follow_parent(root, end) {
            Ok(path) => std::iter::once(root).chain(path).collect(),
            Err(err) => {
                warn!("{}; using the {} cells travelled instead", err, self.trail.len());
                self.trail.clone()
            }
        }
    }
}
