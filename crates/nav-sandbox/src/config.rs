//! Configuration System
//!
//! Loads tuning parameters from tuning.toml for easy adjustment without
//! recompiling.

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    pub graph: GraphConfig,
    pub agent: AgentConfig,
    pub targets: TargetConfig,
}

/// World grid and terrain parameters
#[derive(Debug, Clone, Deserialize)]
pub struct WorldConfig {
    /// Grid cells run 0..grid_range on both axes
    pub grid_range: i32,
    /// World units per grid cell
    pub spacing: f32,
    /// Terrain height amplitude in world units
    pub height_amplitude: f32,
    /// Terrain undulation period in grid cells
    pub height_period: f32,
    /// Authored obstacle footprints
    pub obstacles: Vec<ObstacleSpec>,
    /// Extra clearance added around each obstacle footprint
    pub obstacle_margin: f32,
}

/// One authored obstacle: grid cell of its center plus bounding radius
#[derive(Debug, Clone, Deserialize)]
pub struct ObstacleSpec {
    pub x: i32,
    pub z: i32,
    pub radius: f32,
}

/// Graph construction parameters
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// Waypoints are seeded every `seed_stride` cells across the range
    pub seed_stride: i32,
    /// Connection radius given to every seeded waypoint, in world units
    pub neighbor_radius: f32,
}

/// Agent movement parameters
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Steps taken per tick
    pub step: f32,
    /// World units per step
    pub step_size: f32,
    /// Maximum turn per tick, radians
    pub turn_rate: f32,
    /// Bounding radius used when blocking cells around obstacles
    pub radius: f32,
    /// Snap radius = snap_factor * (step * step_size)
    pub snap_factor: f32,
    /// Fixed patrol route as [x, z] grid coordinates, traversed as a loop
    pub route: Vec<[i32; 2]>,
}

/// Target placement and tagging parameters
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub count: usize,
    /// Distance under which a sought target counts as tagged
    pub tag_radius: f32,
    /// Distance under which an unfound target triggers a seek
    pub detection_radius: f32,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            eprintln!("Warning: Could not load tuning.toml: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Snap radius derived from the agent's per-tick displacement
    pub fn snap_radius(&self) -> f32 {
        self.agent.snap_factor * self.agent.step * self.agent.step_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig {
                grid_range: 48,
                spacing: 10.0,
                height_amplitude: 3.0,
                height_period: 16.0,
                obstacles: vec![
                    ObstacleSpec {
                        x: 24,
                        z: 24,
                        radius: 12.0,
                    },
                    ObstacleSpec {
                        x: 12,
                        z: 36,
                        radius: 8.0,
                    },
                ],
                obstacle_margin: 6.0,
            },
            graph: GraphConfig {
                seed_stride: 2,
                neighbor_radius: 30.0,
            },
            agent: AgentConfig {
                step: 2.0,
                step_size: 1.0,
                turn_rate: 0.5,
                radius: 4.0,
                snap_factor: 1.5,
                route: vec![[4, 4], [44, 4], [44, 44], [4, 44]],
            },
            targets: TargetConfig {
                count: 2,
                tag_radius: 4.0,
                detection_radius: 60.0,
            },
        }
    }
}

/// Configuration error type
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
