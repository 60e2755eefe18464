pub mod cell;
pub mod config;
pub mod deadend;
pub mod error;
pub mod grid;
pub mod location;
pub mod maze;
pub mod optimizer;
pub mod render;
pub mod report;
pub mod robot;
pub mod search;
pub mod trial;

pub use cell::Cell;
pub use config::Config;
pub use error::{ConfigError, MazeError, NavigationError, ReportError};
pub use grid::{Grid, SensorReadings};
pub use location::{Heading, Location, Rotation};
pub use maze::Maze;
pub use robot::{move_instruction, Command, Motion, Phase, Robot};
pub use trial::{StepOutcome, Trial, TrialSummary};
