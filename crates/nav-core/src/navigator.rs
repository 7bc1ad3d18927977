//! Agent Navigator
//!
//! The state machine driving one mobile entity: follows a fixed route,
//! splices in A*-computed detours back to that route, and seeks detected
//! targets, tagging them on arrival.

use glam::{Vec2, Vec3};
use tracing::{debug, warn};

use crate::error::NavError;
use crate::graph::NavGraph;
use crate::node::NodeId;
use crate::path::{Path, PathMode};

/// Which behavior the navigator is running this tick. Exactly one is
/// active per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    /// Following the authored patrol route.
    OnFixedPath,
    /// Traversing a temporary A* route back to the patrol route.
    OnDetour,
    /// Traversing a route toward a detected target.
    Seeking,
    /// Target resolved; falls back to the fixed route on the next tick.
    TargetReached,
}

/// Reference to a sought entity, valid only while seeking.
#[derive(Debug, Clone, Copy)]
pub struct TargetRef {
    /// Index of the target in the world's target list, echoed back in
    /// [`TickEvent::TargetTagged`] so the world can mark it found.
    pub index: usize,
    pub position: Vec3,
    found: bool,
}

impl TargetRef {
    pub fn new(index: usize, position: Vec3) -> Self {
        Self {
            index,
            position,
            found: false,
        }
    }

    pub fn is_found(&self) -> bool {
        self.found
    }
}

/// Per-tick command written back to the moving entity.
#[derive(Debug, Clone, Copy)]
pub struct Steering {
    /// World point the entity should orient toward.
    pub face_toward: Vec3,
    /// Whether the entity should take its step this tick.
    pub advance: bool,
}

/// Notable outcome of a tick, for the world to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    None,
    /// The detour route has been fully traversed.
    DetourComplete,
    /// The sought target was tagged this tick.
    TargetTagged { index: usize },
    /// The sought target was found by another actor; no tag awarded.
    SeekAbandoned,
}

/// Result of one navigator tick.
#[derive(Debug, Clone, Copy)]
pub struct NavTick {
    pub steering: Option<Steering>,
    pub event: TickEvent,
}

/// State machine driving one mobile entity across the nav graph.
///
/// `snap_radius` must exceed the entity's per-tick displacement (the
/// harness sets it to 1.5x one tick's maximum step) or the goal check can
/// oscillate past waypoints.
#[derive(Debug)]
pub struct Navigator {
    mode: NavMode,
    fixed_path: Path,
    /// Cached detour route; recomputed only on re-entering OnDetour.
    detour_path: Option<Path>,
    seek_path: Option<Path>,
    /// Waypoint currently approached on the fixed route.
    next_goal: NodeId,
    /// Last fixed-route waypoint passed; detours rejoin the route here.
    previous_goal: NodeId,
    /// Waypoint currently approached on the detour or seek route.
    side_goal: Option<NodeId>,
    snap_radius: f32,
    tag_radius: f32,
    target: Option<TargetRef>,
    tagged_count: u32,
}

impl Navigator {
    /// Build a navigator over its fixed route. The route must have at
    /// least one waypoint.
    pub fn new(mut fixed_path: Path, snap_radius: f32, tag_radius: f32) -> Result<Self, NavError> {
        let next_goal = fixed_path.next()?;
        Ok(Self {
            mode: NavMode::OnFixedPath,
            fixed_path,
            detour_path: None,
            seek_path: None,
            next_goal,
            previous_goal: next_goal,
            side_goal: None,
            snap_radius,
            tag_radius,
            target: None,
            tagged_count: 0,
        })
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    pub fn tagged_count(&self) -> u32 {
        self.tagged_count
    }

    pub fn next_goal(&self) -> NodeId {
        self.next_goal
    }

    pub fn previous_goal(&self) -> NodeId {
        self.previous_goal
    }

    /// The waypoint being approached this tick, whichever path is active.
    pub fn current_goal(&self) -> NodeId {
        self.side_goal.unwrap_or(self.next_goal)
    }

    /// Request a detour back to the fixed route. The route itself is
    /// computed lazily on the first detour tick. Refused while a detour or
    /// seek is already running; the cached detour is invalidated only here,
    /// never mid-traversal.
    pub fn request_detour(&mut self) -> Result<(), NavError> {
        match self.mode {
            NavMode::OnFixedPath | NavMode::TargetReached => {
                self.detour_path = None;
                self.side_goal = None;
                self.mode = NavMode::OnDetour;
                Ok(())
            }
            NavMode::OnDetour | NavMode::Seeking => Err(NavError::InvalidTransition),
        }
    }

    /// Switch to Seeking along `path` toward a live target. Rejected if the
    /// target is already found, the path is empty, or a seek is already
    /// running; the current state is kept on rejection.
    pub fn begin_seek(&mut self, target: TargetRef, mut path: Path) -> Result<(), NavError> {
        if self.mode == NavMode::Seeking {
            return Err(NavError::InvalidTransition);
        }
        if target.is_found() {
            return Err(NavError::NoTarget);
        }
        let first = path.next()?;
        self.detour_path = None;
        self.side_goal = Some(first);
        self.seek_path = Some(path);
        self.target = Some(target);
        self.mode = NavMode::Seeking;
        debug!(target = target.index, "seeking target");
        Ok(())
    }

    /// Another actor found the target; the navigator notices on its next
    /// tick and abandons the seek without tagging.
    pub fn notify_target_found(&mut self, index: usize) {
        if let Some(target) = self.target.as_mut() {
            if target.index == index {
                target.found = true;
            }
        }
    }

    /// Advance the state machine by one simulation tick.
    ///
    /// Never panics and never propagates an error: per-tick failures (no
    /// detour path, exhausted route) are logged and recovered by falling
    /// back to the fixed route.
    pub fn update(&mut self, graph: &mut NavGraph, position: Vec3) -> NavTick {
        match self.mode {
            NavMode::TargetReached => {
                self.mode = NavMode::OnFixedPath;
                self.tick_fixed(graph, position)
            }
            NavMode::OnFixedPath => self.tick_fixed(graph, position),
            NavMode::OnDetour => self.tick_detour(graph, position),
            NavMode::Seeking => self.tick_seek(graph, position),
        }
    }

    /// Diagnostic line for the on-screen display collaborator.
    pub fn status_line(&self, graph: &NavGraph, position: Vec3) -> String {
        let goal_pos = graph.node(self.current_goal()).world_pos();
        format!(
            "{:?}: location ({:.0}, {:.0}, {:.0})  goal ({:.0}, {:.0}, {:.0})  distance {:.2}  tagged {}",
            self.mode,
            position.x,
            position.y,
            position.z,
            goal_pos.x,
            goal_pos.y,
            goal_pos.z,
            xz_distance(position, goal_pos),
            self.tagged_count,
        )
    }

    fn tick_fixed(&mut self, graph: &NavGraph, position: Vec3) -> NavTick {
        // Orient toward the goal as it stood at the start of the tick; the
        // snap updates take effect on the next tick's steering.
        let goal_pos = graph.node(self.next_goal).world_pos();
        if xz_distance(position, goal_pos) <= self.snap_radius {
            match self.fixed_path.next() {
                Ok(goal) => {
                    self.previous_goal = self.next_goal;
                    self.next_goal = goal;
                }
                Err(err) => warn!(%err, "fixed route yielded no next goal"),
            }
        }
        NavTick {
            steering: Some(Steering {
                face_toward: goal_pos,
                advance: true,
            }),
            event: TickEvent::None,
        }
    }

    fn tick_detour(&mut self, graph: &mut NavGraph, position: Vec3) -> NavTick {
        if self.detour_path.is_none() {
            if let Err(err) = self.compute_detour(graph, position) {
                warn!(%err, "detour unavailable, resuming fixed route");
                self.detour_path = None;
                self.side_goal = None;
                self.mode = NavMode::OnFixedPath;
                return self.tick_fixed(graph, position);
            }
        }
        let Some(goal) = self.side_goal else {
            self.mode = NavMode::OnFixedPath;
            return self.tick_fixed(graph, position);
        };

        let goal_pos = graph.node(goal).world_pos();
        let mut event = TickEvent::None;
        if xz_distance(position, goal_pos) <= self.snap_radius {
            let at_terminal = self
                .detour_path
                .as_ref()
                .map(|path| path.remaining_count() == 1 && path.peek() == Some(goal))
                .unwrap_or(true);
            if at_terminal {
                self.detour_path = None;
                self.side_goal = None;
                self.mode = NavMode::OnFixedPath;
                event = TickEvent::DetourComplete;
                debug!("detour complete, back on fixed route");
            } else if let Some(path) = self.detour_path.as_mut() {
                match path.next() {
                    Ok(next) => self.side_goal = Some(next),
                    Err(err) => {
                        warn!(%err, "detour route exhausted early");
                        self.detour_path = None;
                        self.side_goal = None;
                        self.mode = NavMode::OnFixedPath;
                    }
                }
            }
        }
        NavTick {
            steering: Some(Steering {
                face_toward: goal_pos,
                advance: true,
            }),
            event,
        }
    }

    fn tick_seek(&mut self, graph: &mut NavGraph, position: Vec3) -> NavTick {
        let Some(target) = self.target else {
            self.mode = NavMode::OnFixedPath;
            return self.tick_fixed(graph, position);
        };

        if target.is_found() {
            self.clear_seek();
            self.mode = NavMode::TargetReached;
            debug!(target = target.index, "target found elsewhere, abandoning seek");
            return NavTick {
                steering: None,
                event: TickEvent::SeekAbandoned,
            };
        }

        let steering = self.side_goal.map(|goal| {
            let goal_pos = graph.node(goal).world_pos();
            if xz_distance(position, goal_pos) <= self.snap_radius {
                if let Some(path) = self.seek_path.as_mut() {
                    match path.next() {
                        Ok(next) => self.side_goal = Some(next),
                        Err(err) => warn!(%err, "seek route exhausted"),
                    }
                }
            }
            Steering {
                face_toward: goal_pos,
                advance: true,
            }
        });

        // Straight-line check against the target itself, full 3D distance.
        if position.distance(target.position) <= self.tag_radius {
            self.tagged_count += 1;
            self.clear_seek();
            self.mode = NavMode::TargetReached;
            debug!(target = target.index, tagged = self.tagged_count, "target tagged");
            return NavTick {
                steering,
                event: TickEvent::TargetTagged {
                    index: target.index,
                },
            };
        }

        NavTick {
            steering,
            event: TickEvent::None,
        }
    }

    fn clear_seek(&mut self) {
        self.target = None;
        self.seek_path = None;
        self.side_goal = None;
    }

    /// A* route from the nearest graph node back to the node nearest the
    /// last fixed-route waypoint passed.
    fn compute_detour(&mut self, graph: &mut NavGraph, position: Vec3) -> Result<(), NavError> {
        let start = graph.find_nearest(position).ok_or(NavError::NoPath)?;
        let rejoin_pos = graph.node(self.previous_goal).world_pos();
        let rejoin = graph.find_nearest(rejoin_pos).ok_or(NavError::NoPath)?;
        let nodes = graph.find_path(start, rejoin)?;
        let mut path = Path::from_nodes(nodes, PathMode::Single);
        self.side_goal = Some(path.next()?);
        debug!(waypoints = path.len(), "detour computed");
        self.detour_path = Some(path);
        Ok(())
    }
}

/// Goal-snap distances are measured in the ground (XZ) plane; terrain
/// height does not count against the snap radius.
fn xz_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x, a.z).distance(Vec2::new(b.x, b.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{GridPos, NavNode};

    const SPACING: f32 = 10.0;
    const SNAP: f32 = 1.5;
    const TAG: f32 = 2.5;

    /// Connected line of nodes at (0,0), (1,0), (2,0), spacing 10.
    fn line_graph() -> NavGraph {
        let mut graph = NavGraph::new();
        for x in 0..3 {
            let pos = GridPos::new(x, 0);
            graph.add_node(
                NavNode::new(pos, pos.to_world(SPACING, 0.0)).with_neighbor_radius(15.0),
            );
        }
        graph.connect_all();
        graph
    }

    fn navigator(graph: &NavGraph) -> Navigator {
        let route = Path::from_grid_route(graph, &[(0, 0), (1, 0), (2, 0)], PathMode::Loop)
            .unwrap();
        Navigator::new(route, SNAP, TAG).unwrap()
    }

    /// Move one step of unit length toward the steering direction.
    fn apply(position: &mut Vec3, steering: &Steering) {
        let to = steering.face_toward - *position;
        let flat = Vec3::new(to.x, 0.0, to.z);
        if steering.advance && flat.length() > 1e-4 {
            *position += flat.normalize();
        }
    }

    #[test]
    fn test_snap_advances_goals_on_the_snap_tick() {
        let mut graph = line_graph();
        let mut nav = navigator(&graph);
        let first = graph.get(GridPos::new(0, 0)).unwrap();
        let second = graph.get(GridPos::new(1, 0)).unwrap();

        let mut position = Vec3::new(-5.0, 0.0, 0.0);
        let mut snap_tick = None;
        for tick in 0..10 {
            let before = nav.next_goal();
            let out = nav.update(&mut graph, position);
            if nav.next_goal() != before {
                snap_tick = Some(tick);
                break;
            }
            apply(&mut position, &out.steering.unwrap());
        }

        // Distance runs 5, 4, 3, 2, 1: the goal flips exactly when the
        // distance first drops inside the snap radius, not before.
        assert_eq!(snap_tick, Some(4));
        assert_eq!(nav.previous_goal(), first);
        assert_eq!(nav.next_goal(), second);
    }

    #[test]
    fn test_detour_runs_to_completion() {
        let mut graph = line_graph();
        let mut nav = navigator(&graph);

        // Pass the first waypoint so previous_goal is meaningful.
        nav.update(&mut graph, Vec3::ZERO);
        assert_eq!(nav.previous_goal(), graph.get(GridPos::new(0, 0)).unwrap());

        // Dragged off-route near the far end of the line.
        let mut position = Vec3::new(22.0, 0.0, 4.0);
        nav.request_detour().unwrap();
        assert_eq!(nav.mode(), NavMode::OnDetour);

        let mut completed = false;
        for _ in 0..200 {
            let out = nav.update(&mut graph, position);
            if out.event == TickEvent::DetourComplete {
                completed = true;
                break;
            }
            if let Some(steering) = out.steering {
                apply(&mut position, &steering);
            }
        }

        assert!(completed, "detour never completed");
        assert_eq!(nav.mode(), NavMode::OnFixedPath);
        // Back near the rejoin point on the fixed route.
        assert!(position.distance(Vec3::ZERO) <= 2.0 * SNAP + 1.0);
    }

    #[test]
    fn test_detour_refused_while_seeking() {
        let mut graph = line_graph();
        let mut nav = navigator(&graph);
        let start = graph.get(GridPos::new(0, 0)).unwrap();
        let dest = graph.get(GridPos::new(2, 0)).unwrap();
        let seek = Path::from_nodes(graph.find_path(start, dest).unwrap(), PathMode::Single);
        nav.begin_seek(TargetRef::new(0, Vec3::new(20.0, 0.0, 0.0)), seek)
            .unwrap();

        assert_eq!(nav.request_detour(), Err(NavError::InvalidTransition));
        assert_eq!(nav.mode(), NavMode::Seeking);
    }

    #[test]
    fn test_detour_without_route_falls_back() {
        // Disconnect everything: no edges, so no detour can exist.
        let mut graph = NavGraph::new();
        for x in 0..3 {
            let pos = GridPos::new(x, 0);
            graph.add_node(NavNode::new(pos, pos.to_world(SPACING, 0.0)));
        }
        graph.connect_all();
        let mut nav = navigator(&graph);
        nav.update(&mut graph, Vec3::ZERO);

        nav.request_detour().unwrap();
        let out = nav.update(&mut graph, Vec3::new(22.0, 0.0, 4.0));

        // Recovered locally: steering still produced, fixed route resumed.
        assert_eq!(nav.mode(), NavMode::OnFixedPath);
        assert!(out.steering.is_some());
    }

    #[test]
    fn test_seek_tags_target_once() {
        let mut graph = line_graph();
        let mut nav = navigator(&graph);
        let start = graph.get(GridPos::new(0, 0)).unwrap();
        let dest = graph.get(GridPos::new(2, 0)).unwrap();
        let target_pos = graph.node(dest).world_pos();

        let seek = Path::from_nodes(graph.find_path(start, dest).unwrap(), PathMode::Single);
        nav.begin_seek(TargetRef::new(3, target_pos), seek).unwrap();
        assert_eq!(nav.mode(), NavMode::Seeking);

        let mut position = Vec3::ZERO;
        let mut tagged = None;
        for tick in 0..60 {
            let out = nav.update(&mut graph, position);
            if let TickEvent::TargetTagged { index } = out.event {
                tagged = Some((tick, index));
                break;
            }
            if let Some(steering) = out.steering {
                apply(&mut position, &steering);
            }
        }

        let (_, index) = tagged.expect("target never tagged");
        assert_eq!(index, 3);
        assert_eq!(nav.tagged_count(), 1);
        assert_eq!(nav.mode(), NavMode::TargetReached);

        // The following tick falls back to the fixed route.
        nav.update(&mut graph, position);
        assert_eq!(nav.mode(), NavMode::OnFixedPath);
        assert_eq!(nav.tagged_count(), 1);
    }

    #[test]
    fn test_seek_abandoned_when_target_found_elsewhere() {
        let mut graph = line_graph();
        let mut nav = navigator(&graph);
        let start = graph.get(GridPos::new(0, 0)).unwrap();
        let dest = graph.get(GridPos::new(2, 0)).unwrap();
        let seek = Path::from_nodes(graph.find_path(start, dest).unwrap(), PathMode::Single);
        nav.begin_seek(TargetRef::new(1, Vec3::new(20.0, 0.0, 0.0)), seek)
            .unwrap();

        nav.notify_target_found(1);
        let out = nav.update(&mut graph, Vec3::ZERO);

        assert_eq!(out.event, TickEvent::SeekAbandoned);
        assert_eq!(nav.tagged_count(), 0);
        assert_eq!(nav.mode(), NavMode::TargetReached);
    }

    #[test]
    fn test_seek_rejects_found_target_and_empty_path() {
        let mut graph = line_graph();
        let mut nav = navigator(&graph);

        let mut found = TargetRef::new(0, Vec3::ZERO);
        found.found = true;
        let start = graph.get(GridPos::new(0, 0)).unwrap();
        let dest = graph.get(GridPos::new(1, 0)).unwrap();
        let path = Path::from_nodes(graph.find_path(start, dest).unwrap(), PathMode::Single);
        assert_eq!(nav.begin_seek(found, path), Err(NavError::NoTarget));
        assert_eq!(nav.mode(), NavMode::OnFixedPath);

        let empty = Path::from_nodes(Vec::new(), PathMode::Single);
        assert_eq!(
            nav.begin_seek(TargetRef::new(0, Vec3::ZERO), empty),
            Err(NavError::EmptyPath)
        );
        assert_eq!(nav.mode(), NavMode::OnFixedPath);
    }
}
