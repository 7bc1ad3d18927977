//! Navigation Graph
//!
//! Owns the arena of [`NavNode`]s keyed by grid coordinate, builds
//! proximity adjacency, and runs the A* shortest-path search.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use glam::Vec3;
use tracing::{debug, warn};

use crate::error::NavError;
use crate::node::{GridPos, NavNode, NodeClass, NodeId};

/// The spatial graph of traversable points.
///
/// Built once per world: populate with [`add_node`](NavGraph::add_node),
/// strip obstacle markers with [`remove_nodes_where`](NavGraph::remove_nodes_where),
/// then compute adjacency with [`connect_all`](NavGraph::connect_all).
/// Afterwards it is read-mostly; each [`find_path`](NavGraph::find_path)
/// call owns its own search scratch for its duration.
#[derive(Debug, Default)]
pub struct NavGraph {
    nodes: Vec<NavNode>,
    index: BTreeMap<GridPos, NodeId>,
}

/// Per-search scratch state, reset on every `find_path` call.
///
/// Kept in a side table rather than on the nodes so one search cannot
/// corrupt another's bookkeeping.
struct SearchScratch {
    dist_from_source: Vec<f32>,
    dist_to_goal: Vec<f32>,
    cost: Vec<f32>,
    predecessor: Vec<Option<NodeId>>,
    in_open: Vec<bool>,
    in_closed: Vec<bool>,
}

impl SearchScratch {
    fn new(len: usize) -> Self {
        Self {
            dist_from_source: vec![0.0; len],
            dist_to_goal: vec![0.0; len],
            cost: vec![0.0; len],
            predecessor: vec![None; len],
            in_open: vec![false; len],
            in_closed: vec![false; len],
        }
    }
}

/// Open-set entry ordered ascending by cost, ties broken by insertion
/// order so the first-inserted node wins (matches a stable re-sort).
struct OpenEntry {
    cost: f32,
    seq: u64,
    id: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Inverted on both keys: BinaryHeap is a max-heap and we want the
        // cheapest, earliest-inserted entry popped first.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl NavGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// An unpopulated graph is a valid state; searches on it report no path.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a node. A duplicate grid key is a no-op: the existing node is
    /// kept and its id returned.
    pub fn add_node(&mut self, node: NavNode) -> NodeId {
        if let Some(&existing) = self.index.get(&node.grid_pos()) {
            return existing;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.index.insert(node.grid_pos(), id);
        self.nodes.push(node);
        id
    }

    /// Look up the node at a grid coordinate. A miss is `None`, never a
    /// sentinel node.
    pub fn get(&self, pos: GridPos) -> Option<NodeId> {
        self.index.get(&pos).copied()
    }

    /// Like [`get`](NavGraph::get) but a miss is an explicit error, for
    /// callers resolving authored routes where the node must exist.
    pub fn require(&self, pos: GridPos) -> Result<NodeId, NavError> {
        self.get(pos)
            .ok_or(NavError::NodeNotFound { x: pos.x, z: pos.z })
    }

    pub fn node(&self, id: NodeId) -> &NavNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NavNode {
        &mut self.nodes[id.index()]
    }

    /// Iterate nodes in sorted grid-key order (deterministic).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NavNode)> {
        self.index.values().map(|&id| (id, &self.nodes[id.index()]))
    }

    /// Remove every node matching the predicate, compacting the arena and
    /// remapping ids so no neighbor list is left dangling.
    ///
    /// Used to strip Blocked obstacle markers once they have served their
    /// purpose in connectivity computation. Ids handed out before this call
    /// are invalidated.
    pub fn remove_nodes_where(&mut self, predicate: impl Fn(&NavNode) -> bool) {
        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut kept: Vec<NavNode> = Vec::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.drain(..).enumerate() {
            if !predicate(&node) {
                remap[i] = Some(NodeId(kept.len() as u32));
                kept.push(node);
            }
        }
        for node in &mut kept {
            node.neighbors = node
                .neighbors
                .iter()
                .filter_map(|id| remap[id.index()])
                .collect();
        }
        self.index = kept
            .iter()
            .enumerate()
            .map(|(i, n)| (n.grid_pos(), NodeId(i as u32)))
            .collect();
        self.nodes = kept;
    }

    /// Connect every unordered pair (u, v) whose separation is within both
    /// nodes' neighbor radii. Each side stores its own neighbor list; the
    /// symmetric predicate makes the adjacency effectively undirected.
    ///
    /// O(n^2) pair comparisons, run once at world setup.
    pub fn connect_all(&mut self) {
        for node in &mut self.nodes {
            node.neighbors.clear();
        }
        let ids: Vec<NodeId> = self.index.values().copied().collect();
        for &u in &ids {
            for &v in &ids {
                if u == v {
                    continue;
                }
                let d = self.nodes[u.index()]
                    .world_pos()
                    .distance(self.nodes[v.index()].world_pos());
                if d <= self.nodes[u.index()].neighbor_radius
                    && d <= self.nodes[v.index()].neighbor_radius
                {
                    self.nodes[u.index()].neighbors.push(v);
                }
            }
        }
        let edges: usize = self.nodes.iter().map(|n| n.neighbors.len()).sum();
        debug!(nodes = self.nodes.len(), edges, "connected nav graph");
    }

    /// Linear scan for the node nearest to `point`, in sorted key order so
    /// ties resolve to the first-seen key. `None` on an empty graph.
    pub fn find_nearest(&self, point: Vec3) -> Option<NodeId> {
        let mut best: Option<(f32, NodeId)> = None;
        for &id in self.index.values() {
            let d = self.nodes[id.index()].world_pos().distance(point);
            match best {
                Some((shortest, _)) if d >= shortest => {}
                _ => best = Some((d, id)),
            }
        }
        best.map(|(_, id)| id)
    }

    /// A* shortest-path search from `source` to `destination`.
    ///
    /// The returned sequence runs source -> destination inclusive. The
    /// scoring rule is `cost = dist_from_source + dist_to_goal` where
    /// `dist_to_goal` is the expanding edge's length plus the full
    /// remaining Euclidean distance to the destination. The two-term form
    /// is intentional: route shape depends on it, so keep both terms.
    ///
    /// Termination is by world-position equality with the destination, so a
    /// destination position shared by several keys matches whichever node
    /// is expanded there first. If the open set drains first the search
    /// reports [`NavError::NoPath`]; it never reconstructs a partial route.
    pub fn find_path(
        &mut self,
        source: NodeId,
        destination: NodeId,
    ) -> Result<Vec<NodeId>, NavError> {
        if self.nodes.is_empty() {
            return Err(NavError::NoPath);
        }
        let source_pos = self.nodes[source.index()].world_pos();
        let dest_pos = self.nodes[destination.index()].world_pos();

        let mut scratch = SearchScratch::new(self.nodes.len());
        let mut open = BinaryHeap::new();
        let mut seq: u64 = 0;

        scratch.in_open[source.index()] = true;
        open.push(OpenEntry {
            cost: 0.0,
            seq,
            id: source,
        });
        seq += 1;

        let mut terminal = None;
        while let Some(entry) = open.pop() {
            let current = entry.id;
            let current_pos = self.nodes[current.index()].world_pos();
            if current_pos == dest_pos {
                terminal = Some(current);
                break;
            }

            scratch.in_open[current.index()] = false;
            scratch.in_closed[current.index()] = true;
            self.nodes[current.index()].class = NodeClass::Closed;

            let neighbors = self.nodes[current.index()].neighbors.clone();
            for neighbor in neighbors {
                if scratch.in_open[neighbor.index()] || scratch.in_closed[neighbor.index()] {
                    continue;
                }
                let neighbor_pos = self.nodes[neighbor.index()].world_pos();
                let edge = current_pos.distance(neighbor_pos);

                scratch.predecessor[neighbor.index()] = Some(current);
                scratch.dist_from_source[neighbor.index()] =
                    scratch.dist_from_source[current.index()] + edge;
                scratch.dist_to_goal[neighbor.index()] = edge + neighbor_pos.distance(dest_pos);
                scratch.cost[neighbor.index()] = scratch.dist_from_source[neighbor.index()]
                    + scratch.dist_to_goal[neighbor.index()];

                self.nodes[neighbor.index()].class = NodeClass::Open;
                scratch.in_open[neighbor.index()] = true;
                open.push(OpenEntry {
                    cost: scratch.cost[neighbor.index()],
                    seq,
                    id: neighbor,
                });
                seq += 1;
            }
        }

        let Some(terminal) = terminal else {
            warn!(
                source = ?self.nodes[source.index()].grid_pos(),
                destination = ?self.nodes[destination.index()].grid_pos(),
                "open set drained before reaching destination"
            );
            return Err(NavError::NoPath);
        };

        // Walk predecessor links back to the source, then reverse so the
        // result runs source -> destination.
        let mut path = Vec::new();
        let mut current = terminal;
        loop {
            self.nodes[current.index()].class = NodeClass::OnPath;
            path.push(current);
            if self.nodes[current.index()].world_pos() == source_pos {
                break;
            }
            current = scratch.predecessor[current.index()].ok_or(NavError::NoPath)?;
        }
        path.reverse();

        debug!(
            waypoints = path.len(),
            expanded = scratch.in_closed.iter().filter(|c| **c).count(),
            "path found"
        );
        Ok(path)
    }
}
