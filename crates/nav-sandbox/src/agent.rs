//! Agent Components
//!
//! The mobile entity the navigator drives: a pose plus locomotion limits.
//! The navigator only reads the pose and hands back steering; these
//! components own the actual turning and stepping.

use bevy_ecs::prelude::*;
use glam::Vec3;
use nav_core::Navigator;

/// Component: position and facing of a mobile entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct AgentPose {
    pub position: Vec3,
    /// Unit vector in the ground plane.
    pub forward: Vec3,
}

impl AgentPose {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            forward: Vec3::new(0.0, 0.0, 1.0),
        }
    }

    /// Rotate the facing toward a world point, limited to `max_radians`
    /// this tick. Rotation happens in the ground plane only.
    pub fn turn_toward(&mut self, point: Vec3, max_radians: f32) {
        let to_x = point.x - self.position.x;
        let to_z = point.z - self.position.z;
        if to_x * to_x + to_z * to_z < 1e-8 {
            return;
        }
        let desired = to_z.atan2(to_x);
        let current = self.forward.z.atan2(self.forward.x);
        let mut delta = desired - current;
        while delta > std::f32::consts::PI {
            delta -= std::f32::consts::TAU;
        }
        while delta < -std::f32::consts::PI {
            delta += std::f32::consts::TAU;
        }
        let turn = delta.clamp(-max_radians, max_radians);
        let heading = current + turn;
        self.forward = Vec3::new(heading.cos(), 0.0, heading.sin());
    }

    /// Step along the current facing.
    pub fn step_forward(&mut self, distance: f32) {
        self.position += self.forward * distance;
    }
}

/// Component: per-tick movement limits.
#[derive(Component, Debug, Clone, Copy)]
pub struct Locomotion {
    pub step: f32,
    pub step_size: f32,
    pub turn_rate: f32,
}

impl Locomotion {
    /// Maximum displacement in one tick.
    pub fn displacement(&self) -> f32 {
        self.step * self.step_size
    }
}

/// Component: the navigation state machine driving this entity.
#[derive(Component)]
pub struct NavControl {
    pub navigator: Navigator,
}
