//! Terrain and Obstacles
//!
//! Stand-ins for the world collaborators the navigation core consumes: a
//! height lookup over the grid and the authored obstacle footprints.

use glam::Vec3;
use nav_core::GridPos;

use crate::config::{Config, ObstacleSpec};

/// Smooth analytic height field over the grid.
///
/// The production system samples a height texture; an undulating analytic
/// surface stands in here so waypoints still sit at varied heights.
#[derive(Debug, Clone)]
pub struct Terrain {
    amplitude: f32,
    period: f32,
    spacing: f32,
}

impl Terrain {
    pub fn new(config: &Config) -> Self {
        Self {
            amplitude: config.world.height_amplitude,
            period: config.world.height_period.max(1.0),
            spacing: config.world.spacing,
        }
    }

    /// Surface height at a grid cell.
    pub fn surface_height(&self, grid_x: i32, grid_z: i32) -> f32 {
        self.height_at(grid_x as f32 * self.spacing, grid_z as f32 * self.spacing)
    }

    /// Surface height at an arbitrary world-space (x, z).
    pub fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        let tau = std::f32::consts::TAU;
        let u = world_x / (self.period * self.spacing);
        let v = world_z / (self.period * self.spacing);
        self.amplitude * ((u * tau).sin() + (v * tau).cos()) * 0.5
    }

    /// World position of a grid cell, on the surface.
    pub fn world_pos(&self, grid: GridPos) -> Vec3 {
        grid.to_world(self.spacing, self.surface_height(grid.x, grid.z))
    }
}

/// An obstacle entity: world position plus bounding radius. Used only at
/// setup to mark blocked cells around its footprint.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub grid: GridPos,
    pub position: Vec3,
    pub radius: f32,
}

/// Resolve the authored obstacle specs onto the terrain surface.
pub fn build_obstacles(specs: &[ObstacleSpec], terrain: &Terrain) -> Vec<Obstacle> {
    specs
        .iter()
        .map(|spec| {
            let grid = GridPos::new(spec.x, spec.z);
            Obstacle {
                grid,
                position: terrain.world_pos(grid),
                radius: spec.radius,
            }
        })
        .collect()
}
