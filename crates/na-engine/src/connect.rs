//! Point connection and graph assembly: fuse the base network, the query
//! points, and the connector edges between them into one compiled graph.
//!
//! Two attachment modes, chosen by `RuleSet::split_lines`:
//!
//! - **endpoint attach** — a point connects to every network node inside its
//!   attachment window (tolerance plus factor-widened nearest distance);
//! - **line split** — a point connects to the projection of itself onto the
//!   nearest line, which is cut at the projection for the duration of the
//!   query.  The stored network is never touched; the cut lives in the
//!   compiled graph only.
//!
//! Points that reach nothing still get a vertex, so Dijkstra runs and the
//! pair simply comes back unreachable.

use geo::{LineString, Point};
use na_core::RuleSet;
use na_geom::{GeometryKernel, SpatialIndex};
use na_net::Network;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::EngineResult;
use crate::graph::{ArcKind, CompiledGraph, GraphBuilder};

/// Neighbour candidates examined per point in endpoint-attach mode.
const K_ATTACH: usize = 50;

/// Cut fractions closer than this collapse into one projection vertex.
const FRACTION_EPS: f64 = 1e-12;

/// Which side of the query a point set is on.  Origins leave onto the
/// network, destinations arrive from it; on directed graphs the connector
/// arcs point accordingly.
#[derive(Copy, Clone, PartialEq)]
enum Side {
    Origin,
    Destination,
}

pub(crate) struct AttachResult {
    /// Per origin: no connector was found within the search tolerance.
    pub origin_missing: Vec<bool>,
    /// Per destination: likewise.
    pub destination_missing: Vec<bool>,
}

/// Compile the query graph: base arcs (minus split-replaced edges), split
/// pieces, connector arcs, and isolated query-point vertices.
pub(crate) fn assemble_graph(
    network: &Network,
    weights: &[Option<f64>],
    rules: &RuleSet,
    origins: &[Point],
    destinations: &[Point],
    kernel: &impl GeometryKernel,
    index: &impl SpatialIndex,
) -> EngineResult<(CompiledGraph, AttachResult)> {
    let node_count = network.node_count();
    let origin_offset = node_count as u32;
    let destination_offset = origin_offset + origins.len() as u32;

    let mut builder = GraphBuilder::new(node_count);
    if let Some(last) = (origins.len() + destinations.len()).checked_sub(1) {
        builder.ensure_vertex(origin_offset + last as u32);
    }

    let mut replaced: FxHashSet<usize> = FxHashSet::default();
    let (origin_missing, destination_missing) = if rules.split_lines {
        attach_by_splitting(
            network,
            weights,
            rules,
            origins,
            destinations,
            origin_offset,
            destination_offset,
            kernel,
            index,
            &mut builder,
            &mut replaced,
        )
    } else {
        (
            attach_to_nodes(network, rules, origins, origin_offset, Side::Origin, index, &mut builder),
            attach_to_nodes(
                network,
                rules,
                destinations,
                destination_offset,
                Side::Destination,
                index,
                &mut builder,
            ),
        )
    };

    for (edge_idx, edge) in network.edges().iter().enumerate() {
        let Some(weight) = weights[edge_idx] else {
            continue;
        };
        if replaced.contains(&edge_idx) {
            continue;
        }
        let kind = ArcKind::Base { edge: edge_idx };
        if network.directed() {
            builder.arc(edge.source.0, edge.target.0, weight, kind);
        } else {
            builder.arc_pair(edge.source.0, edge.target.0, weight, kind);
        }
    }

    let graph = builder.build()?;
    Ok((
        graph,
        AttachResult {
            origin_missing,
            destination_missing,
        },
    ))
}

// ── Endpoint attach ───────────────────────────────────────────────────────────

/// Connect each point to every node in its attachment window: within the
/// search tolerance, and within `d* · (1 + f/100) + f` of the nearest
/// distance `d*`.
fn attach_to_nodes(
    network: &Network,
    rules: &RuleSet,
    points: &[Point],
    temp_offset: u32,
    side: Side,
    index: &impl SpatialIndex,
    builder: &mut GraphBuilder,
) -> Vec<bool> {
    if points.is_empty() {
        return Vec::new();
    }
    let corpus: Vec<Point> = network.nodes().iter().map(|n| n.point).collect();
    if corpus.is_empty() {
        return vec![true; points.len()];
    }

    let k = K_ATTACH.min(corpus.len());
    let hits = index.k_nearest_points(points, &corpus, k);

    let mut missing = Vec::with_capacity(points.len());
    for (i, point_hits) in hits.iter().enumerate() {
        let temp = temp_offset + i as u32;
        let Some(&(_, nearest)) = point_hits.first() else {
            missing.push(true);
            continue;
        };
        let window = nearest * (1.0 + rules.search_factor / 100.0) + rules.search_factor;

        let mut attached = false;
        for &(node_idx, dist) in point_hits {
            // Hits come sorted ascending, so the first distance past either
            // bound ends the window.
            if dist > rules.search_tolerance || dist > window {
                break;
            }
            connector(builder, network, side, temp, node_idx as u32, rules.connector_weight.cost(dist));
            attached = true;
        }
        missing.push(!attached);
    }
    missing
}

fn connector(
    builder: &mut GraphBuilder,
    network: &Network,
    side: Side,
    temp: u32,
    attach: u32,
    weight: f64,
) {
    if !network.directed() {
        builder.arc_pair(temp, attach, weight, ArcKind::Connector);
    } else if side == Side::Origin {
        builder.arc(temp, attach, weight, ArcKind::Connector);
    } else {
        builder.arc(attach, temp, weight, ArcKind::Connector);
    }
}

// ── Line split ────────────────────────────────────────────────────────────────

struct Cut {
    fraction: f64,
    /// Index into origins ++ destinations.
    global: usize,
    dist: f64,
}

#[allow(clippy::too_many_arguments)]
fn attach_by_splitting(
    network: &Network,
    weights: &[Option<f64>],
    rules: &RuleSet,
    origins: &[Point],
    destinations: &[Point],
    origin_offset: u32,
    destination_offset: u32,
    kernel: &impl GeometryKernel,
    index: &impl SpatialIndex,
    builder: &mut GraphBuilder,
    replaced: &mut FxHashSet<usize>,
) -> (Vec<bool>, Vec<bool>) {
    let n_origins = origins.len();
    let all_points: Vec<Point> = origins.iter().chain(destinations).copied().collect();
    let mut missing = vec![true; all_points.len()];

    // Only edges that survived weight resolution can be split.
    let candidates: Vec<usize> = weights
        .iter()
        .enumerate()
        .filter_map(|(i, w)| w.map(|_| i))
        .collect();
    let lines: Vec<LineString> = candidates
        .iter()
        .map(|&i| network.edges()[i].geometry.clone())
        .collect();

    if all_points.is_empty() || lines.is_empty() {
        let destination_missing = missing.split_off(n_origins);
        return (missing, destination_missing);
    }

    let hits = index.nearest_line(&all_points, &lines, rules.search_tolerance);

    // All cuts of one edge are handled together, whichever side the points
    // came from: an origin and a destination may well split the same line.
    let mut cuts_by_edge: FxHashMap<usize, Vec<Cut>> = FxHashMap::default();
    for (global, hit) in hits.iter().enumerate() {
        let Some((line_pos, dist)) = *hit else {
            continue;
        };
        let edge_idx = candidates[line_pos];
        let (_, fraction) = kernel.project(all_points[global], &network.edges()[edge_idx].geometry);
        cuts_by_edge
            .entry(edge_idx)
            .or_default()
            .push(Cut { fraction, global, dist });
        missing[global] = false;
    }

    let mut split_edges: Vec<(usize, Vec<Cut>)> = cuts_by_edge.into_iter().collect();
    split_edges.sort_by_key(|&(edge_idx, _)| edge_idx);

    let mut next_vertex = destination_offset + destinations.len() as u32;

    for (edge_idx, mut cuts) in split_edges {
        let Some(total_weight) = weights[edge_idx] else {
            continue;
        };
        let edge = &network.edges()[edge_idx];
        replaced.insert(edge_idx);

        cuts.sort_by(|a, b| {
            a.fraction
                .total_cmp(&b.fraction)
                .then(a.global.cmp(&b.global))
        });

        // One projection vertex per distinct cut fraction.
        let mut distinct_fractions: Vec<f64> = Vec::new();
        let mut distinct_vertices: Vec<u32> = Vec::new();
        let mut vertex_of_cut: Vec<u32> = Vec::with_capacity(cuts.len());
        for cut in &cuts {
            let coincides = distinct_fractions
                .last()
                .is_some_and(|&f| (cut.fraction - f).abs() < FRACTION_EPS);
            if coincides {
                vertex_of_cut.push(distinct_vertices[distinct_vertices.len() - 1]);
            } else {
                distinct_fractions.push(cut.fraction);
                distinct_vertices.push(next_vertex);
                vertex_of_cut.push(next_vertex);
                next_vertex += 1;
            }
        }

        // Cut the geometry at each distinct fraction, left to right.
        let mut pieces: Vec<LineString> = Vec::with_capacity(distinct_fractions.len() + 1);
        let mut remaining = edge.geometry.clone();
        let mut consumed = 0.0;
        for &fraction in &distinct_fractions {
            let relative = if 1.0 - consumed > FRACTION_EPS {
                (fraction - consumed) / (1.0 - consumed)
            } else {
                1.0
            };
            let (piece, rest) = kernel.split(&remaining, relative);
            pieces.push(piece);
            remaining = rest;
            consumed = fraction;
        }
        pieces.push(remaining);

        // Pieces get the edge's weight in proportion to their length share,
        // so the split conserves the original weight.
        let mut chain = Vec::with_capacity(distinct_vertices.len() + 2);
        chain.push(edge.source.0);
        chain.extend_from_slice(&distinct_vertices);
        chain.push(edge.target.0);

        let mut bounds = Vec::with_capacity(distinct_fractions.len() + 2);
        bounds.push(0.0);
        bounds.extend_from_slice(&distinct_fractions);
        bounds.push(1.0);

        for (pi, piece) in pieces.into_iter().enumerate() {
            let share = (bounds[pi + 1] - bounds[pi]).max(0.0);
            let kind = ArcKind::Split {
                edge: edge_idx,
                geometry: piece,
            };
            if network.directed() {
                builder.arc(chain[pi], chain[pi + 1], total_weight * share, kind);
            } else {
                builder.arc_pair(chain[pi], chain[pi + 1], total_weight * share, kind);
            }
        }

        // Attach each point to its projection vertex.
        for (ci, cut) in cuts.iter().enumerate() {
            let (temp, side) = if cut.global < n_origins {
                (origin_offset + cut.global as u32, Side::Origin)
            } else {
                (
                    destination_offset + (cut.global - n_origins) as u32,
                    Side::Destination,
                )
            };
            connector(
                builder,
                network,
                side,
                temp,
                vertex_of_cut[ci],
                rules.connector_weight.cost(cut.dist),
            );
        }
    }

    let destination_missing = missing.split_off(n_origins);
    (missing, destination_missing)
}
