//! Navigation Errors
//!
//! Error taxonomy for graph lookups, searches, and path traversal.

use thiserror::Error;

/// Errors produced by the navigation subsystem.
///
/// Per-tick failures (`NoPath`, `EmptyPath`) are recovered by the caller
/// falling back to its fixed route; setup failures (`NodeNotFound` while
/// resolving an authored route) are fatal to world construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavError {
    /// No node is registered at the requested grid coordinate.
    #[error("no nav node at grid ({x}, {z})")]
    NodeNotFound { x: i32, z: i32 },

    /// The open set drained before the destination was reached.
    #[error("no traversable path between the requested nodes")]
    NoPath,

    /// A traversal was requested on a path with zero waypoints.
    #[error("path has no waypoints")]
    EmptyPath,

    /// A seek was requested without a live (unfound) target.
    #[error("no live target to seek")]
    NoTarget,

    /// A mode change was requested from a state that does not allow it.
    /// The navigator keeps its current state.
    #[error("mode transition not allowed from the current state")]
    InvalidTransition,
}
