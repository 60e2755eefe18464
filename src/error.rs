//! Error types for the navigator and its tooling.

use crate::location::Location;
use thiserror::Error;

/// Failures raised while the navigator plans or translates a move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// No frontier cell is reachable and there is no dead end to back out of.
    #[error("planning exhausted at {location}: no reachable unvisited cell")]
    PlanningExhausted { location: Location },

    /// A parent walk revisited a location before reaching its root.
    #[error("inconsistent parent chain: {location} repeats before reaching the root")]
    InconsistentParentChain { location: Location },

    /// A parent walk ran off the chain without reaching its root.
    #[error("broken parent chain: {location} has no parent and is not the root")]
    BrokenParentChain { location: Location },

    /// Two consecutive waypoints are not on a straight line.
    #[error("cannot move from {from} to {to} in a straight line")]
    NonStraightMove { from: Location, to: Location },
}

impl NavigationError {
    /// Recoverable errors abort one path attempt; the planner moves on to the next candidate.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InconsistentParentChain { .. } | Self::BrokenParentChain { .. }
        )
    }
}

/// Failures while reading a wall-bitmask maze description.
#[derive(Debug, Error)]
pub enum MazeError {
    #[error("failed to read maze file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: `{value}` is not a number")]
    Parse { line: usize, value: String },

    #[error("malformed maze description: {0}")]
    Malformed(String),
}

impl MazeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }
}

/// Failures while writing or reading a run report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize run report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to access report file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while reading an explicit configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NavigationError::PlanningExhausted {
            location: Location::new(3, 4),
        };
        assert_eq!(
            err.to_string(),
            "planning exhausted at (3, 4): no reachable unvisited cell"
        );
    }

    #[test]
    fn test_recoverable_errors() {
        let cycle = NavigationError::InconsistentParentChain {
            location: Location::new(1, 1),
        };
        let exhausted = NavigationError::PlanningExhausted {
            location: Location::new(1, 1),
        };
        assert!(cycle.is_recoverable());
        assert!(!exhausted.is_recoverable());
    }

    #[test]
    fn test_maze_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: MazeError = io_err.into();
        assert!(matches!(err, MazeError::Io(_)));
        assert!(MazeError::malformed("2 lines, expected 4")
            .to_string()
            .contains("2 lines, expected 4"));
    }
}
