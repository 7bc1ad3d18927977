//! Navigation Nodes
//!
//! Graph vertices used for path following and path finding.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Stable handle to a node inside its owning [`NavGraph`](crate::NavGraph).
///
/// All cross-references between nodes (neighbor lists, search predecessors,
/// path waypoints) are ids into the graph's arena, never direct references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Integer (x, z) coordinate identifying a node on the discretized world grid.
///
/// Ordered so that key-sorted iteration gives deterministic scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub z: i32,
}

impl GridPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World-space position of this cell at the given surface height.
    pub fn to_world(self, spacing: f32, height: f32) -> Vec3 {
        Vec3::new(self.x as f32 * spacing, height, self.z as f32 * spacing)
    }
}

/// Classification of a node.
///
/// Mutated during graph construction (obstacle marking) and during each
/// search run (frontier/visited/path marking). The rendering collaborator
/// reads the derived [`color`](NodeClass::color); the core itself only uses
/// the class to select obstacle markers for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeClass {
    /// Obstacle-footprint marker, stripped before adjacency is computed.
    Blocked,
    /// A traversable vertex eligible for routing.
    Waypoint,
    /// Member of the current search frontier.
    Open,
    /// Already expanded by the current search.
    Closed,
    /// Part of the most recently reconstructed path.
    OnPath,
}

impl NodeClass {
    /// Display color read by the waypoint renderer.
    pub fn color(&self) -> [f32; 3] {
        match self {
            NodeClass::Blocked => [0.0, 0.0, 0.0],
            NodeClass::Waypoint => [1.0, 1.0, 0.0],
            NodeClass::Open => [0.0, 0.0, 1.0],
            NodeClass::Closed => [1.0, 0.0, 0.0],
            NodeClass::OnPath => [1.0, 1.0, 1.0],
        }
    }
}

/// A waypoint or marker on the navigation grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavNode {
    grid_pos: GridPos,
    world_pos: Vec3,
    /// Current classification; drives the display color.
    pub class: NodeClass,
    /// Maximum distance at which this node connects to another.
    /// Freshly placed nodes default to 0.0 (no connections) unless set.
    pub neighbor_radius: f32,
    pub(crate) neighbors: Vec<NodeId>,
}

impl NavNode {
    /// Create a Waypoint node. `world_pos` is derived once from the grid
    /// coordinate and the world scale and is immutable afterwards.
    pub fn new(grid_pos: GridPos, world_pos: Vec3) -> Self {
        Self {
            grid_pos,
            world_pos,
            class: NodeClass::Waypoint,
            neighbor_radius: 0.0,
            neighbors: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: NodeClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_neighbor_radius(mut self, radius: f32) -> Self {
        self.neighbor_radius = radius;
        self
    }

    pub fn grid_pos(&self) -> GridPos {
        self.grid_pos
    }

    pub fn world_pos(&self) -> Vec3 {
        self.world_pos
    }

    /// Ids of the nodes this one connects to, in deterministic order.
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }
}
