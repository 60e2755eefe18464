use crate::error::ConfigError;
use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub maze: MazeConfig,
    #[serde(default)]
    pub navigator: NavigatorConfig,
    #[serde(default)]
    pub trial: TrialConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MazeConfig {
    #[serde(default = "default_maze_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NavigatorConfig {
    /// Longest straight move, in cells, the robot may make in one turn
    #[serde(default = "default_max_stride")]
    pub max_stride: u32,
    /// Weight of the distance-to-goal term when choosing a frontier cell
    #[serde(default = "default_heuristic_weight")]
    pub heuristic_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrialConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Exploration moves are divided by this when scoring
    #[serde(default = "default_exploration_divisor")]
    pub exploration_divisor: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    #[serde(default = "default_bg_r")]
    pub background_r: u8,
    #[serde(default = "default_bg_g")]
    pub background_g: u8,
    #[serde(default = "default_bg_b")]
    pub background_b: u8,
    /// Seconds between robot moves while the viewer is playing
    #[serde(default = "default_step_interval")]
    pub step_interval: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_enable_report")]
    pub enable_report: bool,
    #[serde(default = "default_report_path")]
    pub report_path: String,
}

// Default values
fn default_maze_path() -> String { "mazes/loops_8x8.txt".to_string() }
fn default_max_stride() -> u32 { 3 }
fn default_heuristic_weight() -> f64 { 1.5 }
fn default_max_steps() -> u32 { 1000 }
fn default_exploration_divisor() -> f64 { 30.0 }
fn default_window_title() -> String { "Maze Runner - Micromouse Trial".to_string() }
fn default_cell_size() -> f32 { 40.0 }
fn default_bg_r() -> u8 { 30 }
fn default_bg_g() -> u8 { 30 }
fn default_bg_b() -> u8 { 30 }
fn default_step_interval() -> f32 { 0.15 }
fn default_enable_report() -> bool { true }
fn default_report_path() -> String { "run_report.json".to_string() }

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            path: default_maze_path(),
        }
    }
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            max_stride: default_max_stride(),
            heuristic_weight: default_heuristic_weight(),
        }
    }
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            exploration_divisor: default_exploration_divisor(),
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            cell_size: default_cell_size(),
            background_r: default_bg_r(),
            background_g: default_bg_g(),
            background_b: default_bg_b(),
            step_interval: default_step_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_report: default_enable_report(),
            report_path: default_report_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            maze: MazeConfig::default(),
            navigator: NavigatorConfig::default(),
            trial: TrialConfig::default(),
            visual: VisualConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Self {
        match Config::from_file("config.toml") {
            Ok(config) => {
                info!("Loaded configuration from config.toml");
                config
            }
            Err(ConfigError::Io(_)) => {
                info!("No config.toml found, using default configuration");
                Config::default()
            }
            Err(e) => {
                warn!("{}; using default configuration", e);
                Config::default()
            }
        }
    }

    /// Read an explicit configuration file; unlike `load` this reports every failure
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Config::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.navigator.max_stride, 3);
        assert_eq!(config.navigator.heuristic_weight, 1.5);
        assert_eq!(config.trial.max_steps, 1000);
        assert_eq!(config.trial.exploration_divisor, 30.0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [navigator]
            max_stride = 2

            [maze]
            path = "mazes/corridor.txt"
            "#,
        )
        .unwrap();

        assert_eq!(config.navigator.max_stride, 2);
        assert_eq!(config.navigator.heuristic_weight, 1.5);
        assert_eq!(config.maze.path, "mazes/corridor.txt");
        assert_eq!(config.trial, TrialConfig::default());
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let result = Config::from_toml("[navigator]\nmax_stride = \"three\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        let result = Config::from_file("does/not/exist.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
