use arboard::Clipboard;
use log::{error, info, warn};
use macroquad::prelude::*;
use maze_runner::render::{render_maze, Overlay};
use maze_runner::report::RunReport;
use maze_runner::{Config, Heading, Location, Maze, Robot, StepOutcome, Trial};

/// Visualization state
struct VisState<'a> {
    maze: &'a Maze,
    config: &'a Config,
    robot: Robot,
    trial: Trial<'a>,
    playing: bool,
    since_step: f32,
    last_outcome: Option<StepOutcome>,
    failure: Option<String>,
    report_written: bool,
}

impl<'a> VisState<'a> {
    fn new(maze: &'a Maze, config: &'a Config) -> Self {
        VisState {
            maze,
            config,
            robot: Robot::with_config(maze.dim, config.navigator.clone()),
            trial: Trial::new(maze, config.trial.clone(), config.navigator.max_stride),
            playing: false,
            since_step: 0.0,
            last_outcome: None,
            failure: None,
            report_written: false,
        }
    }

    fn restart(&mut self) {
        *self = VisState::new(self.maze, self.config);
        info!("Trial restarted");
    }

    fn step(&mut self) {
        if self.trial.is_finished() || self.failure.is_some() {
            self.playing = false;
            return;
        }
        match self.trial.step(&mut self.robot) {
            Ok(outcome) => self.last_outcome = Some(outcome),
            Err(e) => {
                error!("Navigation failed: {}", e);
                self.failure = Some(e.to_string());
                self.playing = false;
            }
        }
        if self.trial.is_finished() {
            self.write_report();
        }
    }

    fn write_report(&mut self) {
        if self.report_written || !self.config.logging.enable_report {
            return;
        }
        self.report_written = true;
        let report = RunReport::from_robot(&self.robot, Some(self.trial.summary()));
        match report.save_to_file(&self.config.logging.report_path) {
            Ok(()) => info!("Run report saved to {}", self.config.logging.report_path),
            Err(e) => warn!("{}", e),
        }
    }

    fn update(&mut self, delta_time: f32) {
        if !self.playing {
            return;
        }
        self.since_step += delta_time;
        if self.since_step >= self.config.visual.step_interval {
            self.since_step = 0.0;
            self.step();
        }
    }

    fn maze_to_string(&self) -> String {
        let visited: Vec<Location> = self
            .robot
            .grid
            .cells()
            .filter(|c| c.visits > 0)
            .map(|c| c.location)
            .collect();
        render_maze(self.maze, Overlay::Marks(&visited))
    }

    fn copy_to_clipboard(&self) {
        let maze_string = self.maze_to_string();
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(&maze_string) {
                    warn!("Failed to copy to clipboard: {}", e);
                } else {
                    info!("Maze copied to clipboard!");
                    // Keep clipboard alive for a moment to ensure clipboard managers can capture it
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
            Err(e) => {
                warn!("Failed to access clipboard: {}", e);
            }
        }
    }

    fn cell_origin(&self, loc: Location) -> (f32, f32) {
        let size = self.config.visual.cell_size;
        (loc.col as f32 * size, loc.row as f32 * size)
    }

    fn cell_centre(&self, loc: Location) -> (f32, f32) {
        let half = self.config.visual.cell_size / 2.0;
        let (x, y) = self.cell_origin(loc);
        (x + half, y + half)
    }

    fn draw(&self) {
        let visual = &self.config.visual;
        clear_background(Color::from_rgba(
            visual.background_r,
            visual.background_g,
            visual.background_b,
            255,
        ));
        let size = visual.cell_size;

        // Cells: unknown, known, visited, dead end, goal
        for row in 0..self.maze.dim {
            for col in 0..self.maze.dim {
                let loc = Location::new(row, col);
                let (px, py) = self.cell_origin(loc);
                let color = match self.robot.grid.get(loc) {
                    Some(cell) if cell.is_deadend() => Color::from_rgba(140, 50, 50, 255),
                    Some(cell) if cell.visits > 0 => Color::from_rgba(70, 110, 160, 255),
                    Some(_) => Color::from_rgba(70, 70, 90, 255),
                    None if self.maze.is_goal(loc) => Color::from_rgba(50, 100, 50, 255),
                    None => Color::from_rgba(50, 50, 50, 255),
                };
                draw_rectangle(px, py, size - 1.0, size - 1.0, color);
                if self.maze.is_goal(loc) {
                    draw_rectangle_lines(px + 2.0, py + 2.0, size - 5.0, size - 5.0, 2.0, GREEN);
                }
            }
        }

        // Committed route and optimized waypoints
        let mut from = self.trial.location();
        for &to in self.robot.active_path() {
            let (x1, y1) = self.cell_centre(from);
            let (x2, y2) = self.cell_centre(to);
            draw_line(x1, y1, x2, y2, 2.0, YELLOW);
            from = to;
        }
        for &waypoint in self.robot.optimized_path() {
            let (x, y) = self.cell_centre(waypoint);
            draw_circle(x, y, size * 0.12, ORANGE);
        }

        // Walls
        for row in 0..self.maze.dim {
            for col in 0..self.maze.dim {
                let loc = Location::new(row, col);
                let (px, py) = self.cell_origin(loc);
                if !self.maze.is_open(loc, Heading::North) {
                    draw_line(px, py, px + size, py, 3.0, WHITE);
                }
                if !self.maze.is_open(loc, Heading::West) {
                    draw_line(px, py, px, py + size, 3.0, WHITE);
                }
                if !self.maze.is_open(loc, Heading::South) {
                    draw_line(px, py + size, px + size, py + size, 3.0, WHITE);
                }
                if !self.maze.is_open(loc, Heading::East) {
                    draw_line(px + size, py, px + size, py + size, 3.0, WHITE);
                }
            }
        }

        // Robot with a heading marker
        let (x, y) = self.cell_centre(self.trial.location());
        let (dr, dc) = self.trial.heading().delta();
        draw_circle(x, y, size * 0.3, BLUE);
        draw_line(
            x,
            y,
            x + dc as f32 * size * 0.4,
            y + dr as f32 * size * 0.4,
            3.0,
            SKYBLUE,
        );

        // Draw info
        let status = match (&self.failure, self.trial.summary().score) {
            (Some(failure), _) => format!("Failed: {}", failure),
            (None, Some(score)) => format!("Completed, score {:.3}", score),
            (None, None) if self.trial.is_finished() => "Out of time".to_string(),
            (None, None) => format!("Run {}, phase: {}", self.trial.run(), self.robot.phase),
        };
        let info = format!(
            "{}\nSteps: {}  Discovered: {}\nLast: {:?}\nSpace: play/pause  N: step  R: restart\nC: copy maze to clipboard  Esc: close window",
            status,
            self.trial.summary().total_steps,
            self.robot.grid.discovered(),
            self.last_outcome
        );
        let text_y = self.maze.dim as f32 * size + 20.0;
        for (i, line) in info.lines().enumerate() {
            draw_text(line, 10.0, text_y + i as f32 * 20.0, 20.0, WHITE);
        }
    }
}

fn window_conf() -> Conf {
    let config = Config::load();
    Conf {
        window_title: config.visual.window_title.clone(),
        window_width: 800,
        window_height: 900,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    let config = Config::load();
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.maze.path.clone());
    let maze = match Maze::load(&path) {
        Ok(maze) => maze,
        Err(e) => {
            error!("{}: {}", path, e);
            return;
        }
    };

    let mut state = VisState::new(&maze, &config);

    loop {
        // Handle input
        if is_key_pressed(KeyCode::Space) {
            state.playing = !state.playing;
        }
        if is_key_pressed(KeyCode::N) {
            state.step();
        }
        if is_key_pressed(KeyCode::R) {
            state.restart();
        }

        // Copy maze to clipboard on C key
        if is_key_pressed(KeyCode::C) {
            state.copy_to_clipboard();
        }

        // Close window on Escape
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        state.update(get_frame_time());

        // Draw
        state.draw();

        next_frame().await
    }
}
