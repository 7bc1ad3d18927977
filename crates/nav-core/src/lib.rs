//! Navigation core: spatial graph, A* search, waypoint paths, and the
//! agent state machine that consumes them.
//!
//! The crate is deliberately free of ECS and I/O concerns; the simulation
//! harness owns the world and feeds agent poses in each tick.

pub mod error;
pub mod graph;
pub mod navigator;
pub mod node;
pub mod path;

pub use error::NavError;
pub use graph::NavGraph;
pub use navigator::{NavMode, NavTick, Navigator, Steering, TargetRef, TickEvent};
pub use node::{GridPos, NavNode, NodeClass, NodeId};
pub use path::{Path, PathMode};
