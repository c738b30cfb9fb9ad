//! Node registry: stable integer ids for unique line endpoints.
//!
//! Endpoint coordinates are snapped to a fixed grid (1e-7 units, far below
//! any real CRS precision) before keying, so edges whose ends differ only by
//! floating drift meet in one node.  Unique endpoints are then sorted by
//! (x, y) and numbered `0..n` — identical input edges always produce
//! identical ids, independent of row order.

use geo::Point;
use na_core::NodeId;
use rustc_hash::FxHashMap;

use crate::network::{NetEdge, NetNode};

/// Snap denominator: coordinates are keyed at 1e-7 units.
const SNAP_SCALE: f64 = 1e7;

/// Canonical integer key for an endpoint coordinate.
#[inline]
fn canonical(x: f64, y: f64) -> (i64, i64) {
    ((x * SNAP_SCALE).round() as i64, (y * SNAP_SCALE).round() as i64)
}

/// Assign `source` and `target` node ids to every edge and build the node
/// table (canonical point and degree per node).
///
/// Edges with fewer than two coordinates keep `NodeId::INVALID` on both
/// ends; preparation never produces such edges.
pub fn make_node_ids(edges: &mut [NetEdge]) -> Vec<NetNode> {
    // Collect endpoint keys per edge.
    let mut endpoint_keys: Vec<Option<((i64, i64), (i64, i64))>> = Vec::with_capacity(edges.len());
    for edge in edges.iter() {
        let coords = &edge.geometry.0;
        match (coords.first(), coords.last()) {
            (Some(first), Some(last)) if coords.len() >= 2 => {
                endpoint_keys.push(Some((
                    canonical(first.x, first.y),
                    canonical(last.x, last.y),
                )));
            }
            _ => endpoint_keys.push(None),
        }
    }

    // Deduplicate and order deterministically by (x, y).
    let mut unique: Vec<(i64, i64)> = endpoint_keys
        .iter()
        .flatten()
        .flat_map(|&(s, t)| [s, t])
        .collect();
    unique.sort_unstable();
    unique.dedup();

    let id_of: FxHashMap<(i64, i64), NodeId> = unique
        .iter()
        .enumerate()
        .map(|(i, &key)| (key, NodeId(i as u32)))
        .collect();

    let mut nodes: Vec<NetNode> = unique
        .iter()
        .map(|&(kx, ky)| NetNode {
            point: Point::new(kx as f64 / SNAP_SCALE, ky as f64 / SNAP_SCALE),
            degree: 0,
        })
        .collect();

    // Write ids back and count degrees (both ends of every edge).
    for (edge, keys) in edges.iter_mut().zip(&endpoint_keys) {
        match keys {
            Some((source_key, target_key)) => {
                let source = id_of[source_key];
                let target = id_of[target_key];
                edge.source = source;
                edge.target = target;
                nodes[source.index()].degree += 1;
                nodes[target.index()].degree += 1;
            }
            None => {
                edge.source = NodeId::INVALID;
                edge.target = NodeId::INVALID;
            }
        }
    }

    nodes
}
