//! End-to-end navigation scenario
//!
//! Drives a simulated entity through the full pipeline: graph build and
//! adjacency, fixed-route patrol, target seek and tag, and the A* detour
//! back onto the route.

use glam::Vec3;
use nav_core::{GridPos, NavGraph, NavMode, NavNode, Navigator, Path, PathMode, TargetRef, TickEvent};

const SPACING: f32 = 10.0;
const STEP: f32 = 2.0;
const SNAP: f32 = 3.0; // 1.5x the per-tick step
const TAG: f32 = 4.0;

/// 4x4 block of waypoints; orthogonal and diagonal neighbors connect.
fn build_graph() -> NavGraph {
    let mut graph = NavGraph::new();
    for x in 0..4 {
        for z in 0..4 {
            let pos = GridPos::new(x, z);
            graph.add_node(
                NavNode::new(pos, pos.to_world(SPACING, 0.0)).with_neighbor_radius(15.0),
            );
        }
    }
    graph.connect_all();
    graph
}

fn step(position: &mut Vec3, face_toward: Vec3) {
    let to = face_toward - *position;
    let flat = Vec3::new(to.x, 0.0, to.z);
    if flat.length() > 1e-4 {
        *position += flat.normalize() * STEP;
    }
}

#[test]
fn test_patrol_seek_tag_and_detour_back() {
    let mut graph = build_graph();
    let route = [(0, 0), (3, 0), (3, 3), (0, 3)];
    let fixed = Path::from_grid_route(&graph, &route, PathMode::Loop).unwrap();
    let mut nav = Navigator::new(fixed, SNAP, TAG).unwrap();

    let mut position = Vec3::new(0.0, 0.0, 0.0);

    // Phase 1: patrol at least one full circuit of the fixed route.
    let first_goal = nav.next_goal();
    let mut goal_changes = 0;
    for _ in 0..400 {
        let before = nav.next_goal();
        let out = nav.update(&mut graph, position);
        if nav.next_goal() != before {
            goal_changes += 1;
        }
        if let Some(steering) = out.steering {
            step(&mut position, steering.face_toward);
        }
        if goal_changes >= route.len() && nav.next_goal() == first_goal {
            break;
        }
    }
    assert!(
        goal_changes >= route.len(),
        "never completed a circuit: {goal_changes} goal changes"
    );
    assert_eq!(nav.mode(), NavMode::OnFixedPath);

    // Phase 2: a target appears at the grid center; seek and tag it.
    let target_node = graph.get(GridPos::new(2, 2)).unwrap();
    let target_pos = graph.node(target_node).world_pos();
    let start = graph.find_nearest(position).unwrap();
    let seek_route = graph.find_path(start, target_node).unwrap();
    nav.begin_seek(
        TargetRef::new(0, target_pos),
        Path::from_nodes(seek_route, PathMode::Single),
    )
    .unwrap();

    let mut tagged = false;
    for _ in 0..400 {
        let out = nav.update(&mut graph, position);
        if matches!(out.event, TickEvent::TargetTagged { index: 0 }) {
            tagged = true;
            break;
        }
        if let Some(steering) = out.steering {
            step(&mut position, steering.face_toward);
        }
    }
    assert!(tagged, "target was never tagged");
    assert_eq!(nav.tagged_count(), 1);
    assert_eq!(nav.mode(), NavMode::TargetReached);

    // Phase 3: detour from the tag site back onto the fixed route.
    nav.request_detour().unwrap();
    let mut rejoined = false;
    for _ in 0..400 {
        let out = nav.update(&mut graph, position);
        if out.event == TickEvent::DetourComplete {
            rejoined = true;
            break;
        }
        if let Some(steering) = out.steering {
            step(&mut position, steering.face_toward);
        }
    }
    assert!(rejoined, "detour never completed");
    assert_eq!(nav.mode(), NavMode::OnFixedPath);

    // The rejoin point is the last fixed waypoint passed before the seek.
    let rejoin_pos = graph.node(nav.previous_goal()).world_pos();
    assert!(
        position.distance(rejoin_pos) <= 3.0 * SNAP,
        "agent did not rejoin near its previous fixed goal"
    );
}

#[test]
fn test_detour_is_deterministic_across_runs() {
    // Same graph, same request: the spliced route is identical.
    let run = || {
        let mut graph = build_graph();
        let start = graph.get(GridPos::new(3, 3)).unwrap();
        let dest = graph.get(GridPos::new(0, 0)).unwrap();
        graph.find_path(start, dest).unwrap()
    };
    assert_eq!(run(), run());
}
