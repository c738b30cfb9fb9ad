//! Route geometry queries: single routes, k alternative routes, and route
//! frequencies.

use geo::{LineString, MultiLineString};
use log::warn;
use na_core::{PointLabel, RowId, RuleSet};
use na_geom::GeometryKernel;
use na_net::Network;
use rustc_hash::FxHashMap;

use crate::assemble;
use crate::dijkstra;
use crate::error::{EngineError, EngineResult};
use crate::graph::CompiledGraph;
use crate::points::{PointRecord, label_for};

// ── Rows ──────────────────────────────────────────────────────────────────────

/// One recovered route.  `k` is the alternative index (from 1) for
/// [`crate::Engine::get_k_routes`], `None` for plain routes.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteRow {
    pub origin: PointLabel,
    pub destination: PointLabel,
    pub weight: f64,
    pub k: Option<u32>,
    pub geometry: MultiLineString,
}

/// One network edge with the number of routes that traversed it.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FrequencyRow {
    /// Input row the edge came from; `RowId::INVALID` for synthetic edges.
    pub row: RowId,
    pub frequency: f64,
    pub weight: f64,
    pub geometry: LineString,
}

pub(crate) struct RouteOutcome {
    pub rows: Vec<RouteRow>,
    pub n_pairs: usize,
    /// Pairs that produced at least one row.
    pub n_found_pairs: usize,
}

// ── Single routes ─────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub(crate) fn routes(
    graph: &CompiledGraph,
    network: &Network,
    rules: &RuleSet,
    origins: &[PointRecord],
    origin_offset: u32,
    destinations: &[PointRecord],
    destination_offset: u32,
    kernel: &impl GeometryKernel,
) -> RouteOutcome {
    let mut rows = Vec::new();
    let mut n_found_pairs = 0usize;

    for i in 0..origins.len() {
        for j in 0..destinations.len() {
            let path = dijkstra::path_from(
                graph,
                origin_offset + i as u32,
                destination_offset + j as u32,
                None,
            );
            let Some((arcs, _)) = path else {
                continue;
            };
            let Some(row) = route_row(graph, network, rules, &arcs, kernel) else {
                continue;
            };
            rows.push(RouteRow {
                origin: label_for(origins, origin_offset, i),
                destination: label_for(destinations, destination_offset, j),
                ..row
            });
            n_found_pairs += 1;
        }
    }

    let n_pairs = origins.len() * destinations.len();
    if rows.is_empty() && n_pairs > 0 {
        warn!(
            "no paths were found; try a larger search_tolerance or search_factor, \
             or close network holes"
        );
    }
    RouteOutcome {
        rows,
        n_pairs,
        n_found_pairs,
    }
}

/// Assemble one path into a route row (without labels).  `None` when the
/// path has no network edges, i.e. it only crossed connectors.
fn route_row(
    graph: &CompiledGraph,
    network: &Network,
    rules: &RuleSet,
    arcs: &[usize],
    kernel: &impl GeometryKernel,
) -> Option<RouteRow> {
    let lines = assemble::route_geometries(network, graph, arcs);
    if lines.is_empty() {
        return None;
    }
    Some(RouteRow {
        origin: PointLabel::Temp(0),
        destination: PointLabel::Temp(0),
        weight: assemble::route_weight(graph, arcs, rules.connector_weight),
        k: None,
        geometry: assemble::dissolve(kernel, lines),
    })
}

// ── K alternative routes ──────────────────────────────────────────────────────

/// For each pair, route up to `k` times on a working copy of the graph,
/// deleting the middle `drop_middle_percent` percent of each found route
/// before the next attempt.
#[allow(clippy::too_many_arguments)]
pub(crate) fn k_routes(
    graph: &CompiledGraph,
    network: &Network,
    rules: &RuleSet,
    origins: &[PointRecord],
    origin_offset: u32,
    destinations: &[PointRecord],
    destination_offset: u32,
    k: usize,
    drop_middle_percent: f64,
    kernel: &impl GeometryKernel,
) -> EngineResult<RouteOutcome> {
    if !(drop_middle_percent > 0.0 && drop_middle_percent <= 100.0) {
        return Err(EngineError::ArgumentRange(format!(
            "drop_middle_percent must be in (0, 100], got {drop_middle_percent}"
        )));
    }
    if k == 0 {
        return Err(EngineError::ArgumentRange("k must be at least 1".to_owned()));
    }

    let mut rows = Vec::new();
    let mut n_found_pairs = 0usize;

    for i in 0..origins.len() {
        for j in 0..destinations.len() {
            let mut mask = vec![true; graph.arc_count()];
            let mut found = false;

            for iteration in 1..=k as u32 {
                let path = dijkstra::path_from(
                    graph,
                    origin_offset + i as u32,
                    destination_offset + j as u32,
                    Some(&mask),
                );
                let Some((arcs, _)) = path else {
                    break;
                };
                if let Some(row) = route_row(graph, network, rules, &arcs, kernel) {
                    rows.push(RouteRow {
                        origin: label_for(origins, origin_offset, i),
                        destination: label_for(destinations, destination_offset, j),
                        k: Some(iteration),
                        ..row
                    });
                    found = true;
                }

                // Delete the middle slice of the found route, keeping
                // `(len · (100 − p) / 100) / 2` arcs (rounded, minimum 1) at
                // each end.
                let len = arcs.len();
                let mut keep =
                    ((len as f64 - len as f64 * drop_middle_percent / 100.0) / 2.0).round() as usize;
                if keep == 0 {
                    keep = 1;
                }
                if 2 * keep >= len {
                    break; // nothing left to drop; further routes would repeat
                }
                for &arc in &arcs[keep..len - keep] {
                    mask[arc] = false;
                    let twin = graph.twin(arc);
                    if twin != u32::MAX {
                        mask[twin as usize] = false;
                    }
                }
            }
            if found {
                n_found_pairs += 1;
            }
        }
    }

    let n_pairs = origins.len() * destinations.len();
    if rows.is_empty() && n_pairs > 0 {
        warn!(
            "no paths were found; try a larger search_tolerance or search_factor, \
             or close network holes"
        );
    }
    Ok(RouteOutcome {
        rows,
        n_pairs,
        n_found_pairs,
    })
}

// ── Route frequencies ─────────────────────────────────────────────────────────

/// Route every pair once and count, per network edge, how many routes
/// traversed it — each weighted by the pair's multiplier (default 1).
/// Returns the traversed subset of the network, in edge order.
#[allow(clippy::too_many_arguments)]
pub(crate) fn route_frequencies(
    graph: &CompiledGraph,
    network: &Network,
    weights: &[Option<f64>],
    origins: &[PointRecord],
    origin_offset: u32,
    destinations: &[PointRecord],
    destination_offset: u32,
    multipliers: Option<&[(usize, usize, f64)]>,
) -> (Vec<FrequencyRow>, usize, usize) {
    let multiplier_of: FxHashMap<(usize, usize), f64> = multipliers
        .unwrap_or_default()
        .iter()
        .map(|&(i, j, m)| ((i, j), m))
        .collect();

    let mut frequency: FxHashMap<usize, f64> = FxHashMap::default();
    let mut n_found = 0usize;

    for i in 0..origins.len() {
        for j in 0..destinations.len() {
            let path = dijkstra::path_from(
                graph,
                origin_offset + i as u32,
                destination_offset + j as u32,
                None,
            );
            let Some((arcs, _)) = path else {
                continue;
            };
            n_found += 1;
            let multiplier = multiplier_of.get(&(i, j)).copied().unwrap_or(1.0);
            for arc in arcs {
                if let Some(edge) = graph.kind(arc).base_edge() {
                    *frequency.entry(edge).or_insert(0.0) += multiplier;
                }
            }
        }
    }

    let mut visited: Vec<usize> = frequency.keys().copied().collect();
    visited.sort_unstable();

    let rows = visited
        .into_iter()
        .map(|edge| FrequencyRow {
            row: network.edges()[edge].row,
            frequency: frequency[&edge],
            weight: weights[edge].unwrap_or(0.0),
            geometry: network.edges()[edge].geometry.clone(),
        })
        .collect();

    (rows, origins.len() * destinations.len(), n_found)
}
