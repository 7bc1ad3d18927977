//! Waypoint Paths
//!
//! An ordered, indexable traversal over a sequence of graph nodes, with
//! loop or single-pass semantics.

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::graph::NavGraph;
use crate::node::{GridPos, NodeId};

/// Traversal semantics once the cursor reaches the last waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathMode {
    /// Wrap back to the first waypoint; `next()` never exhausts.
    Loop,
    /// Hold at the last waypoint; repeated calls keep returning it.
    Single,
}

/// An ordered traversal over graph nodes.
///
/// Built either from an authored list of grid coordinates (a fixed route)
/// or from the node sequence an A* search returned (a detour/seek route).
#[derive(Debug, Clone)]
pub struct Path {
    waypoints: Vec<NodeId>,
    mode: PathMode,
    cursor: usize,
}

impl Path {
    /// Resolve an authored route of grid coordinates against a graph.
    ///
    /// Every coordinate must name an existing node; a missing key fails the
    /// whole construction (fatal to setup, per the propagation policy).
    pub fn from_grid_route(
        graph: &NavGraph,
        route: &[(i32, i32)],
        mode: PathMode,
    ) -> Result<Self, NavError> {
        let mut waypoints = Vec::with_capacity(route.len());
        for &(x, z) in route {
            waypoints.push(graph.require(GridPos::new(x, z))?);
        }
        Ok(Self {
            waypoints,
            mode,
            cursor: 0,
        })
    }

    /// Wrap a node sequence already in traversal order (an A* result).
    pub fn from_nodes(waypoints: Vec<NodeId>, mode: PathMode) -> Self {
        Self {
            waypoints,
            mode,
            cursor: 0,
        }
    }

    /// Return the waypoint at the cursor and advance it.
    ///
    /// Loop wraps past the last index; Single holds there, so the terminal
    /// waypoint is returned indefinitely. An empty path is a defined error,
    /// never an out-of-bounds index.
    pub fn next(&mut self) -> Result<NodeId, NavError> {
        if self.waypoints.is_empty() {
            return Err(NavError::EmptyPath);
        }
        let waypoint = self.waypoints[self.cursor];
        match self.mode {
            PathMode::Loop => self.cursor = (self.cursor + 1) % self.waypoints.len(),
            PathMode::Single => {
                if self.cursor + 1 < self.waypoints.len() {
                    self.cursor += 1;
                }
            }
        }
        Ok(waypoint)
    }

    /// Waypoints left before the cursor wraps (Loop) or holds (Single).
    /// The navigator uses this to detect a fully consumed detour.
    pub fn remaining_count(&self) -> usize {
        self.waypoints.len() - self.cursor
    }

    /// The waypoint `next()` would return, without advancing the cursor.
    pub fn peek(&self) -> Option<NodeId> {
        self.waypoints.get(self.cursor).copied()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn mode(&self) -> PathMode {
        self.mode
    }
}
