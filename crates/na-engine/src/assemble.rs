//! Result assembly: map recovered arc paths back to weights and line
//! geometry.
//!
//! The compiled graph keeps, per arc, what it stands for ([`ArcKind`]):
//! a network edge, a split piece with its own geometry, or a connector.
//! Assembly drops the connectors, clones the line geometry of the rest, and
//! dissolves per result row into one multi-line.

use geo::{LineString, MultiLineString};
use na_core::ConnectorWeight;
use na_geom::GeometryKernel;
use na_net::Network;

use crate::graph::{ArcKind, CompiledGraph};

/// Route cost over `arcs`: base and split arcs always count; connector arcs
/// count only when the rule set actually prices them.
pub(crate) fn route_weight(
    graph: &CompiledGraph,
    arcs: &[usize],
    connector_weight: ConnectorWeight,
) -> f64 {
    arcs.iter()
        .map(|&arc| {
            if graph.kind(arc).is_connector() && connector_weight == ConnectorWeight::Zero {
                0.0
            } else {
                graph.weight(arc)
            }
        })
        .sum()
}

/// Line geometries of the non-connector arcs of a path, in traversal order.
pub(crate) fn route_geometries(
    network: &Network,
    graph: &CompiledGraph,
    arcs: &[usize],
) -> Vec<LineString> {
    arcs.iter()
        .filter_map(|&arc| match graph.kind(arc) {
            ArcKind::Base { edge } => Some(network.edges()[*edge].geometry.clone()),
            ArcKind::Split { geometry, .. } => Some(geometry.clone()),
            ArcKind::Connector => None,
        })
        .collect()
}

/// Dissolve a set of lines into one multi-line geometry.
pub(crate) fn dissolve(kernel: &impl GeometryKernel, lines: Vec<LineString>) -> MultiLineString {
    kernel.union(&lines)
}
