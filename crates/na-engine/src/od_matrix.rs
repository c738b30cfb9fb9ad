//! Origin–destination cost matrix.

use geo::LineString;
use na_core::PointLabel;
use na_geom::GeometryKernel;

use crate::dijkstra;
use crate::error::{EngineError, EngineResult};
use crate::graph::CompiledGraph;
use crate::points::{PointRecord, label_for};

// ── Options and rows ──────────────────────────────────────────────────────────

/// Options of [`crate::Engine::od_cost_matrix`].
#[derive(Clone, Debug, Default)]
pub struct OdOptions {
    /// Emit a straight origin→destination segment per row.  Cosmetic — this
    /// is not the routed path.
    pub lines: bool,
    /// Pair origin *i* with destination *i* only; the two sets must have
    /// equal length.
    pub rowwise: bool,
    /// Drop rows whose cost is not below this threshold (unreachable rows
    /// included).  Dijkstra stops expanding beyond it.
    pub cutoff: Option<f64>,
    /// Keep only the cheapest `n` destinations per origin, ties broken by
    /// destination id.  Unreachable rows are dropped first.
    pub destination_count: Option<usize>,
}

/// One row of the OD cost matrix.  `cost` is `None` for unreachable pairs.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OdRow {
    pub origin: PointLabel,
    pub destination: PointLabel,
    pub cost: Option<f64>,
    pub geometry: Option<LineString>,
}

pub(crate) struct OdOutcome {
    pub rows: Vec<OdRow>,
    pub n_pairs: usize,
}

// ── Computation ───────────────────────────────────────────────────────────────

pub(crate) fn od_cost_matrix(
    graph: &CompiledGraph,
    origins: &[PointRecord],
    origin_offset: u32,
    destinations: &[PointRecord],
    destination_offset: u32,
    opts: &OdOptions,
    kernel: &impl GeometryKernel,
) -> EngineResult<OdOutcome> {
    if opts.rowwise && origins.len() != destinations.len() {
        return Err(EngineError::ArgumentRange(format!(
            "rowwise requires equal-length inputs, got {} origins and {} destinations",
            origins.len(),
            destinations.len()
        )));
    }

    let per_origin = |i: usize| -> Vec<OdRow> {
        let costs = dijkstra::costs_from(graph, origin_offset + i as u32, opts.cutoff, None);

        let pair_js: Vec<usize> = if opts.rowwise {
            vec![i]
        } else {
            (0..destinations.len()).collect()
        };

        let mut pairs: Vec<(usize, Option<f64>)> = pair_js
            .into_iter()
            .map(|j| {
                let cost = costs[(destination_offset + j as u32) as usize];
                let mut cost = cost.is_finite().then_some(cost);
                if kernel.equals_2d(origins[i].point, destinations[j].point, 0.0) {
                    cost = Some(0.0);
                }
                (j, cost)
            })
            .collect();

        if let Some(cutoff) = opts.cutoff {
            pairs.retain(|&(_, cost)| cost.is_some_and(|c| c < cutoff));
        }
        if let Some(keep) = opts.destination_count {
            pairs.retain(|&(_, cost)| cost.is_some());
            pairs.sort_by(|a, b| {
                a.1.unwrap_or(f64::INFINITY)
                    .total_cmp(&b.1.unwrap_or(f64::INFINITY))
                    .then(a.0.cmp(&b.0))
            });
            pairs.truncate(keep);
            pairs.sort_by_key(|&(j, _)| j);
        }

        pairs
            .into_iter()
            .map(|(j, cost)| OdRow {
                origin: label_for(origins, origin_offset, i),
                destination: label_for(destinations, destination_offset, j),
                cost,
                geometry: opts
                    .lines
                    .then(|| kernel.line_between(origins[i].point, destinations[j].point)),
            })
            .collect()
    };

    #[cfg(feature = "parallel")]
    let grouped: Vec<Vec<OdRow>> = {
        use rayon::prelude::*;
        (0..origins.len()).into_par_iter().map(per_origin).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let grouped: Vec<Vec<OdRow>> = (0..origins.len()).map(per_origin).collect();

    let n_pairs = if opts.rowwise {
        origins.len()
    } else {
        origins.len() * destinations.len()
    };

    Ok(OdOutcome {
        rows: grouped.into_iter().flatten().collect(),
        n_pairs,
    })
}
