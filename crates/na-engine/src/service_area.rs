//! Service areas (isochrones): the network edges reachable from an origin
//! within each break.

use na_core::PointLabel;
use na_geom::GeometryKernel;
use na_net::Network;

use crate::assemble;
use crate::dijkstra;
use crate::error::{EngineError, EngineResult};
use crate::graph::{ArcKind, CompiledGraph};
use crate::points::{PointRecord, label_for};

/// One service area: the edges reachable from `origin` within
/// `break_value`.  With `dissolve` (the default) one row per origin and
/// break; without, one row per reached edge.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ServiceAreaRow {
    pub origin: PointLabel,
    pub break_value: f64,
    pub geometry: geo::MultiLineString,
}

pub(crate) struct ServiceAreaOutcome {
    pub rows: Vec<ServiceAreaRow>,
    pub n_cells: usize,
    pub n_filled: usize,
}

/// Compute service areas for every origin and break.
///
/// Breaks must be non-decreasing; output is ordered from the largest break
/// to the smallest so smaller areas plot on top.
pub(crate) fn service_area(
    graph: &CompiledGraph,
    network: &Network,
    origins: &[PointRecord],
    origin_offset: u32,
    breaks: &[f64],
    dissolve: bool,
    kernel: &impl GeometryKernel,
) -> EngineResult<ServiceAreaOutcome> {
    if breaks.is_empty() {
        return Err(EngineError::ArgumentRange(
            "at least one break is required".to_owned(),
        ));
    }
    if breaks.windows(2).any(|w| w[1] < w[0]) {
        return Err(EngineError::ArgumentRange(format!(
            "breaks must be non-decreasing, got {breaks:?}"
        )));
    }
    let max_break = breaks[breaks.len() - 1];

    let per_origin = |i: usize| -> Vec<ServiceAreaRow> {
        let costs = dijkstra::costs_from(graph, origin_offset + i as u32, Some(max_break), None);
        let mut rows = Vec::new();

        for &break_value in breaks.iter().rev() {
            let arcs = reached_arcs(graph, &costs, break_value);
            if arcs.is_empty() {
                continue;
            }
            if dissolve {
                let lines = assemble::route_geometries(network, graph, &arcs);
                rows.push(ServiceAreaRow {
                    origin: label_for(origins, origin_offset, i),
                    break_value,
                    geometry: assemble::dissolve(kernel, lines),
                });
            } else {
                for arc in arcs {
                    let lines = assemble::route_geometries(network, graph, &[arc]);
                    rows.push(ServiceAreaRow {
                        origin: label_for(origins, origin_offset, i),
                        break_value,
                        geometry: assemble::dissolve(kernel, lines),
                    });
                }
            }
        }
        rows
    };

    #[cfg(feature = "parallel")]
    let grouped: Vec<Vec<ServiceAreaRow>> = {
        use rayon::prelude::*;
        (0..origins.len()).into_par_iter().map(per_origin).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let grouped: Vec<Vec<ServiceAreaRow>> = (0..origins.len()).map(per_origin).collect();

    let n_cells = origins.len() * breaks.len();
    let n_filled = if dissolve {
        grouped.iter().map(Vec::len).sum()
    } else {
        // Without dissolving, count (origin, break) cells that produced rows.
        grouped
            .iter()
            .map(|rows| {
                let mut breaks_seen: Vec<f64> = rows.iter().map(|r| r.break_value).collect();
                breaks_seen.dedup();
                breaks_seen.len()
            })
            .sum()
    };

    Ok(ServiceAreaOutcome {
        rows: grouped.into_iter().flatten().collect(),
        n_cells,
        n_filled,
    })
}

/// Arcs inside a break: an edge counts when both its endpoints are reached
/// within the break, so the larger endpoint distance decides.  Partially
/// covered edges and edges only enterable from outside the area stay out.
/// Each physical edge is taken once (not once per direction), connectors
/// never.
fn reached_arcs(graph: &CompiledGraph, costs: &[f64], break_value: f64) -> Vec<usize> {
    let mut arcs = Vec::new();
    for arc in 0..graph.arc_count() {
        if matches!(graph.kind(arc), ArcKind::Connector) {
            continue;
        }
        let twin = graph.twin(arc);
        if twin != u32::MAX && (twin as usize) < arc {
            continue;
        }
        let reach = costs[graph.tail(arc) as usize].max(costs[graph.head(arc) as usize]);
        if reach <= break_value {
            arcs.push(arc);
        }
    }
    arcs
}
