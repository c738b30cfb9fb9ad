//! Hole closing: pairing dead-end nodes with nearby nodes so the network
//! mender can bridge small topological gaps with straight lines.
//!
//! Both searches only *select* node pairs; materialising the synthetic edges
//! (and rebuilding the node table) is `Network`'s job.

use geo::Point;
use na_core::NodeId;
use na_geom::{GeometryKernel, SpatialIndex};
use rustc_hash::FxHashSet;

use crate::network::{NetEdge, NetNode};

/// Neighbour candidates examined per dead-end.
const K_NEIGHBOURS: usize = 50;

/// Find `(dead-end, node)` pairs within `max_distance` whose bridging line
/// would deviate at most `max_angle` degrees from the line the dead-end
/// terminates.
///
/// A dead-end is the degree-1 end of an edge.  Each dead-end sources at most
/// one pair, taken at the nearest qualifying neighbour.
pub(crate) fn find_holes(
    edges: &[NetEdge],
    nodes: &[NetNode],
    max_distance: f64,
    max_angle: f64,
    kernel: &impl GeometryKernel,
    index: &impl SpatialIndex,
) -> Vec<(NodeId, NodeId)> {
    // Ignore duplicates of lines digitised in both directions, so a two-way
    // street stored as two opposite rows still exposes its dead ends.
    let mut seen: FxHashSet<(NodeId, NodeId)> = FxHashSet::default();
    let mut candidates: Vec<(NodeId, NodeId)> = Vec::new();
    for edge in edges {
        let key = if edge.source <= edge.target {
            (edge.source, edge.target)
        } else {
            (edge.target, edge.source)
        };
        if !seen.insert(key) {
            continue;
        }
        if nodes[edge.source.index()].degree == 1 {
            candidates.push((edge.source, edge.target));
        }
        if nodes[edge.target.index()].degree == 1 {
            candidates.push((edge.target, edge.source));
        }
    }

    if candidates.len() <= 1 {
        return Vec::new();
    }

    let corpus: Vec<Point> = nodes.iter().map(|n| n.point).collect();
    let queries: Vec<Point> = candidates
        .iter()
        .map(|&(dead, _)| nodes[dead.index()].point)
        .collect();
    let k = K_NEIGHBOURS.min(corpus.len());
    let neighbours = index.k_nearest_points(&queries, &corpus, k);

    let mut pairs: Vec<(NodeId, NodeId)> = Vec::new();
    let mut used_sources: FxHashSet<NodeId> = FxHashSet::default();

    // Rank 0 is the dead-end itself; walk outwards one rank at a time and
    // stop as soon as a full rank adds nothing.
    for rank in 1..k {
        let before = pairs.len();

        for (ci, &(dead, other_end)) in candidates.iter().enumerate() {
            if used_sources.contains(&dead) {
                continue;
            }
            let Some(&(neighbour_idx, dist)) = neighbours[ci].get(rank) else {
                continue;
            };
            let neighbour = NodeId(neighbour_idx as u32);
            if neighbour == dead || neighbour == other_end {
                continue;
            }
            if dist > max_distance {
                continue;
            }

            let incoming =
                kernel.angle_degrees(nodes[other_end.index()].point, nodes[dead.index()].point);
            let outgoing = kernel.angle_degrees(nodes[dead.index()].point, corpus[neighbour_idx]);
            if (incoming.abs() - outgoing.abs()).abs() > max_angle {
                continue;
            }
            // Two facing dead-ends qualify in both directions; one bridge
            // is enough.
            if pairs.contains(&(neighbour, dead)) {
                continue;
            }

            pairs.push((dead, neighbour));
            used_sources.insert(dead);
        }

        if pairs.len() == before {
            break;
        }
    }

    pairs
}

/// Find `(dead-end, dead-end)` pairs: each dead-end and its nearest other
/// dead-end, when they lie within `max_distance` of each other.
///
/// Each dead-end sources at most one pair, and a pair already taken in one
/// direction is not emitted again in the other.
pub(crate) fn find_holes_to_deadends(
    nodes: &[NetNode],
    max_distance: f64,
    index: &impl SpatialIndex,
) -> Vec<(NodeId, NodeId)> {
    let deadends: Vec<NodeId> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.degree == 1)
        .map(|(i, _)| NodeId(i as u32))
        .collect();

    if deadends.len() <= 1 {
        return Vec::new();
    }

    let points: Vec<Point> = deadends.iter().map(|id| nodes[id.index()].point).collect();
    let neighbours = index.k_nearest_points(&points, &points, 2);

    let mut pairs: Vec<(NodeId, NodeId)> = Vec::new();
    let mut used_sources: FxHashSet<NodeId> = FxHashSet::default();
    let mut taken: FxHashSet<(NodeId, NodeId)> = FxHashSet::default();

    for (i, hits) in neighbours.iter().enumerate() {
        let Some(&(nearest_idx, dist)) = hits.get(1) else {
            continue;
        };
        // Coincident dead-ends can push the query point itself to rank 1.
        if nearest_idx == i || dist >= max_distance {
            continue;
        }
        let from = deadends[i];
        let to = deadends[nearest_idx];
        if used_sources.contains(&from) || taken.contains(&(to, from)) {
            continue;
        }
        pairs.push((from, to));
        used_sources.insert(from);
        taken.insert((from, to));
    }

    pairs
}
