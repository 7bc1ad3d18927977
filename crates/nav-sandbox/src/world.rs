//! World Setup
//!
//! Builds the navigation graph from the terrain and obstacle layout, and
//! places the targets the agent will hunt.
//!
//! Construction order matters: obstacle footprints are marked Blocked
//! first, then waypoints are seeded (the duplicate-key no-op keeps them
//! out of blocked cells), then the markers are stripped, and adjacency is
//! computed last.

use glam::Vec3;
use nav_core::{GridPos, NavGraph, NavNode, NodeClass};
use rand::rngs::SmallRng;
use rand::Rng;
use tracing::info;

use crate::config::Config;
use crate::terrain::{Obstacle, Terrain};

/// A huntable target placed at a graph node site.
#[derive(Debug, Clone)]
pub struct Target {
    pub grid: GridPos,
    pub position: Vec3,
    pub found: bool,
}

/// Build the traversable graph for the configured world.
pub fn build_nav_graph(config: &Config, terrain: &Terrain, obstacles: &[Obstacle]) -> NavGraph {
    let mut graph = NavGraph::new();
    let range = config.world.grid_range;
    let spacing = config.world.spacing;

    // Mark every cell inside an obstacle clearance footprint as Blocked.
    for obstacle in obstacles {
        let clearance = config.agent.radius + obstacle.radius + config.world.obstacle_margin;
        let cells = (clearance / spacing).ceil() as i32;
        let reach = clearance / spacing;
        for x in (obstacle.grid.x - cells)..=(obstacle.grid.x + cells) {
            for z in (obstacle.grid.z - cells)..=(obstacle.grid.z + cells) {
                if x <= 0 || x >= range || z <= 0 || z >= range {
                    continue;
                }
                let dx = (x - obstacle.grid.x) as f32;
                let dz = (z - obstacle.grid.z) as f32;
                if (dx * dx + dz * dz).sqrt() < reach {
                    let grid = GridPos::new(x, z);
                    graph.add_node(
                        NavNode::new(grid, terrain.world_pos(grid))
                            .with_class(NodeClass::Blocked),
                    );
                }
            }
        }
    }
    let blocked = graph.len();

    // Seed waypoints on a regular stride; cells already claimed by a
    // Blocked marker are skipped by the duplicate-key no-op.
    let stride = config.graph.seed_stride.max(1);
    let mut x = stride;
    while x < range {
        let mut z = stride;
        while z < range {
            let grid = GridPos::new(x, z);
            graph.add_node(
                NavNode::new(grid, terrain.world_pos(grid))
                    .with_neighbor_radius(config.graph.neighbor_radius),
            );
            z += stride;
        }
        x += stride;
    }

    // The markers have served their purpose; only waypoints remain.
    graph.remove_nodes_where(|node| node.class == NodeClass::Blocked);
    graph.connect_all();

    info!(
        waypoints = graph.len(),
        blocked_cells = blocked,
        "navigation graph built"
    );
    graph
}

/// Place `count` targets at distinct waypoint sites, chosen by the seeded
/// RNG so runs are reproducible.
pub fn place_targets(graph: &NavGraph, rng: &mut SmallRng, count: usize) -> Vec<Target> {
    let sites: Vec<(GridPos, Vec3)> = graph
        .iter()
        .map(|(_, node)| (node.grid_pos(), node.world_pos()))
        .collect();

    let mut targets: Vec<Target> = Vec::with_capacity(count);
    if sites.is_empty() {
        return targets;
    }
    while targets.len() < count && targets.len() < sites.len() {
        let (grid, position) = sites[rng.gen_range(0..sites.len())];
        if targets.iter().any(|t| t.grid == grid) {
            continue;
        }
        targets.push(Target {
            grid,
            position,
            found: false,
        });
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::build_obstacles;
    use rand::SeedableRng;

    fn build_default() -> (Config, NavGraph) {
        let config = Config::default();
        let terrain = Terrain::new(&config);
        let obstacles = build_obstacles(&config.world.obstacles, &terrain);
        let graph = build_nav_graph(&config, &terrain, &obstacles);
        (config, graph)
    }

    #[test]
    fn test_blocked_cells_are_not_waypoints() {
        let (config, graph) = build_default();
        // Cell at the first obstacle's center must not be traversable.
        let spec = &config.world.obstacles[0];
        assert_eq!(graph.get(GridPos::new(spec.x, spec.z)), None);
        // And no Blocked marker survives construction.
        for (_, node) in graph.iter() {
            assert_eq!(node.class, NodeClass::Waypoint);
        }
    }

    #[test]
    fn test_seeded_waypoints_are_connected() {
        let (config, graph) = build_default();
        assert!(!graph.is_empty());
        // A corner waypoint far from any obstacle has stride neighbors.
        let corner = graph
            .get(GridPos::new(config.graph.seed_stride, config.graph.seed_stride))
            .expect("corner waypoint missing");
        assert!(!graph.node(corner).neighbors().is_empty());
    }

    #[test]
    fn test_route_cells_resolve() {
        let (config, graph) = build_default();
        for &[x, z] in &config.agent.route {
            assert!(
                graph.get(GridPos::new(x, z)).is_some(),
                "route waypoint ({x}, {z}) missing from the graph"
            );
        }
    }

    #[test]
    fn test_target_placement_is_deterministic() {
        let (config, graph) = build_default();
        let mut rng1 = SmallRng::seed_from_u64(7);
        let mut rng2 = SmallRng::seed_from_u64(7);
        let a = place_targets(&graph, &mut rng1, config.targets.count);
        let b = place_targets(&graph, &mut rng2, config.targets.count);
        assert_eq!(a.len(), config.targets.count);
        let grids_a: Vec<_> = a.iter().map(|t| t.grid).collect();
        let grids_b: Vec<_> = b.iter().map(|t| t.grid).collect();
        assert_eq!(grids_a, grids_b);
    }

    #[test]
    fn test_targets_sit_on_graph_nodes() {
        let (config, graph) = build_default();
        let mut rng = SmallRng::seed_from_u64(42);
        for target in place_targets(&graph, &mut rng, config.targets.count) {
            let id = graph.get(target.grid).expect("target off the graph");
            assert_eq!(graph.node(id).world_pos(), target.position);
        }
    }
}
