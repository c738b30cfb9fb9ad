//! Unit tests for na-net.  All networks are hand-crafted.

#[cfg(test)]
mod helpers {
    use geo::{LineString, line_string};

    use crate::{LineRecord, Network};

    pub fn segment(x0: f64, y0: f64, x1: f64, y1: f64) -> LineString {
        line_string![(x: x0, y: y0), (x: x1, y: y1)]
    }

    /// Three collinear segments: (0,0)-(10,0)-(20,0)-(30,0).
    pub fn chain() -> Network {
        Network::new(vec![
            LineRecord::new(segment(0.0, 0.0, 10.0, 0.0)),
            LineRecord::new(segment(10.0, 0.0, 20.0, 0.0)),
            LineRecord::new(segment(20.0, 0.0, 30.0, 0.0)),
        ])
        .unwrap()
    }
}

#[cfg(test)]
mod prepare {
    use geo::{Geometry, LineString, MultiLineString, line_string, point};

    use super::helpers::segment;
    use crate::{LineRecord, NetError, Network};

    #[test]
    fn empty_rows_are_dropped() {
        let network = Network::new(vec![
            LineRecord::new(segment(0.0, 0.0, 1.0, 0.0)),
            LineRecord::new(LineString::new(vec![])),
        ])
        .unwrap();
        assert_eq!(network.edge_count(), 1);
    }

    #[test]
    fn rings_are_dropped() {
        let ring = line_string![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0)
        ];
        let network = Network::new(vec![
            LineRecord::new(segment(5.0, 5.0, 6.0, 5.0)),
            LineRecord::new(ring),
        ])
        .unwrap();
        assert_eq!(network.edge_count(), 1);
    }

    #[test]
    fn only_rings_is_invalid_geometry() {
        let ring = line_string![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0)
        ];
        let err = Network::new(vec![LineRecord::new(ring)]).unwrap_err();
        assert!(matches!(err, NetError::InvalidGeometry(_)));
    }

    #[test]
    fn no_rows_is_empty_network() {
        let err = Network::new(vec![]).unwrap_err();
        assert!(matches!(err, NetError::EmptyNetwork));
        let err = Network::new(vec![LineRecord::new(LineString::new(vec![]))]).unwrap_err();
        assert!(matches!(err, NetError::EmptyNetwork));
    }

    #[test]
    fn mixed_types_fail() {
        let err = Network::new(vec![
            LineRecord::new(segment(0.0, 0.0, 1.0, 0.0)),
            LineRecord::from_geometry(Geometry::Point(point!(x: 0.0, y: 0.0))),
        ])
        .unwrap_err();
        assert!(matches!(err, NetError::InvalidGeometry(_)));
    }

    #[test]
    fn touching_multipart_is_merged() {
        let multi = MultiLineString::new(vec![
            segment(0.0, 0.0, 1.0, 0.0),
            segment(1.0, 0.0, 2.0, 0.0),
        ]);
        let network = Network::new(vec![LineRecord::multi(multi)]).unwrap();
        assert_eq!(network.edge_count(), 1);
        assert_eq!(network.edges()[0].geometry.0.len(), 3);
    }

    #[test]
    fn touching_reversed_multipart_is_merged() {
        let multi = MultiLineString::new(vec![
            segment(0.0, 0.0, 1.0, 0.0),
            segment(2.0, 0.0, 1.0, 0.0),
        ]);
        let network = Network::new(vec![LineRecord::multi(multi)]).unwrap();
        assert_eq!(network.edge_count(), 1);
    }

    #[test]
    fn disjoint_multipart_is_exploded() {
        let multi = MultiLineString::new(vec![
            segment(0.0, 0.0, 1.0, 0.0),
            segment(5.0, 5.0, 6.0, 5.0),
        ]);
        let network = Network::new(vec![LineRecord::multi(multi)]).unwrap();
        assert_eq!(network.edge_count(), 2);
        // Both parts trace back to the same input row.
        assert_eq!(network.edges()[0].row, network.edges()[1].row);
    }

    #[test]
    fn explode_without_merging() {
        let multi = MultiLineString::new(vec![
            segment(0.0, 0.0, 1.0, 0.0),
            segment(1.0, 0.0, 2.0, 0.0),
        ]);
        let network = Network::with_options(vec![LineRecord::multi(multi)], false).unwrap();
        assert_eq!(network.edge_count(), 2);
    }
}

#[cfg(test)]
mod nodes {
    use na_core::NodeId;

    use super::helpers::{chain, segment};
    use crate::{LineRecord, Network};

    #[test]
    fn shared_endpoints_share_node_ids() {
        let network = chain();
        assert_eq!(network.node_count(), 4);
        let edges = network.edges();
        assert_eq!(edges[0].target, edges[1].source);
        assert_eq!(edges[1].target, edges[2].source);
    }

    #[test]
    fn ids_ordered_by_x_then_y() {
        let network = chain();
        for (i, node) in network.nodes().iter().enumerate() {
            assert_eq!(node.point.x(), 10.0 * i as f64);
        }
    }

    #[test]
    fn degree_counts_both_ends() {
        let network = chain();
        let degrees: Vec<u32> = network.nodes().iter().map(|n| n.degree).collect();
        assert_eq!(degrees, vec![1, 2, 2, 1]);
    }

    #[test]
    fn ids_stable_under_row_order() {
        let a = Network::new(vec![
            LineRecord::new(segment(0.0, 0.0, 10.0, 0.0)),
            LineRecord::new(segment(10.0, 0.0, 20.0, 0.0)),
        ])
        .unwrap();
        let b = Network::new(vec![
            LineRecord::new(segment(10.0, 0.0, 20.0, 0.0)),
            LineRecord::new(segment(0.0, 0.0, 10.0, 0.0)),
        ])
        .unwrap();
        // Same node table either way; source/target follow the geometry.
        assert_eq!(a.node_count(), b.node_count());
        assert_eq!(a.edges()[0].source, b.edges()[1].source);
        assert_eq!(a.edges()[1].target, b.edges()[0].target);
    }

    #[test]
    fn floating_drift_snaps_to_one_node() {
        let network = Network::new(vec![
            LineRecord::new(segment(0.0, 0.0, 10.0, 0.0)),
            LineRecord::new(segment(10.0 + 1e-9, 0.0, 20.0, 0.0)),
        ])
        .unwrap();
        assert_eq!(network.node_count(), 3);
    }

    #[test]
    fn rerunning_gives_identical_assignment() {
        let mut network = chain();
        let before: Vec<(NodeId, NodeId)> = network
            .edges()
            .iter()
            .map(|e| (e.source, e.target))
            .collect();
        network.rebuild_nodes();
        let after: Vec<(NodeId, NodeId)> = network
            .edges()
            .iter()
            .map(|e| (e.source, e.target))
            .collect();
        assert_eq!(before, after);
    }
}

#[cfg(test)]
mod holes {
    use na_core::RowId;
    use na_geom::{EuclideanKernel, RTreeIndex};

    use super::helpers::segment;
    use crate::{LineRecord, Network};

    /// Two collinear segments with a 0.5-unit gap between their dead-ends.
    fn gapped() -> Network {
        Network::new(vec![
            LineRecord::new(segment(0.0, 0.0, 10.0, 0.0)),
            LineRecord::new(segment(10.5, 0.0, 20.0, 0.0)),
        ])
        .unwrap()
    }

    #[test]
    fn deadends_variant_bridges_gap() {
        let mut network = gapped();
        let added = network.close_holes_to_deadends(1.0, &EuclideanKernel, &RTreeIndex);
        assert_eq!(added, 1);
        assert_eq!(network.edge_count(), 3);

        let bridge = &network.edges()[2];
        assert!(bridge.synthetic);
        assert_eq!(bridge.row, RowId::INVALID);
        // Node table was rebuilt: the bridge connects the two gap nodes.
        let (a, b) = (
            network.node_point(bridge.source),
            network.node_point(bridge.target),
        );
        let mut xs = [a.x(), b.x()];
        xs.sort_by(f64::total_cmp);
        assert_eq!(xs, [10.0, 10.5]);
    }

    #[test]
    fn deadends_variant_respects_max_distance() {
        let mut network = gapped();
        let added = network.close_holes_to_deadends(0.4, &EuclideanKernel, &RTreeIndex);
        assert_eq!(added, 0);
        assert_eq!(network.edge_count(), 2);
    }

    #[test]
    fn deadends_do_not_double_close() {
        let mut network = gapped();
        network.close_holes_to_deadends(1.0, &EuclideanKernel, &RTreeIndex);
        // Exactly one bridge between the two facing dead-ends.
        assert_eq!(
            network.edges().iter().filter(|e| e.synthetic).count(),
            1
        );
    }

    #[test]
    fn angle_gate_accepts_straight_continuation() {
        let mut network = gapped();
        let added = network.close_holes(1.0, 30.0, &EuclideanKernel, &RTreeIndex);
        // One bridge only: the reverse pairing of the same two dead-ends is
        // suppressed.
        assert_eq!(added, 1);
    }

    #[test]
    fn angle_gate_rejects_sharp_turns() {
        // The second line continues laterally offset, so the bridge would
        // deviate ~31 degrees from both dead-end directions.
        let offset = || {
            Network::new(vec![
                LineRecord::new(segment(0.0, 0.0, 10.0, 0.0)),
                LineRecord::new(segment(10.5, 0.3, 20.0, 0.3)),
            ])
            .unwrap()
        };
        let mut network = offset();
        let added = network.close_holes(1.0, 10.0, &EuclideanKernel, &RTreeIndex);
        assert_eq!(added, 0);

        // With the gate wide open the same gap closes.
        let mut network = offset();
        let added = network.close_holes(1.0, 180.0, &EuclideanKernel, &RTreeIndex);
        assert_eq!(added, 1);
    }

    #[test]
    fn closing_bumps_revision() {
        let mut network = gapped();
        let before = network.revision();
        network.close_holes_to_deadends(1.0, &EuclideanKernel, &RTreeIndex);
        assert!(network.revision() > before);
    }
}

#[cfg(test)]
mod components {
    use super::helpers::segment;
    use crate::{LineRecord, Network};

    fn two_islands() -> Network {
        Network::new(vec![
            LineRecord::new(segment(0.0, 0.0, 10.0, 0.0)),
            LineRecord::new(segment(10.0, 0.0, 20.0, 0.0)),
            LineRecord::new(segment(100.0, 100.0, 110.0, 100.0)),
        ])
        .unwrap()
    }

    #[test]
    fn component_sizes_per_edge() {
        let network = two_islands();
        assert_eq!(network.component_sizes(), vec![3, 3, 2]);
    }

    #[test]
    fn remove_isolated_keeps_largest() {
        let mut network = two_islands();
        let removed = network.remove_isolated();
        assert_eq!(removed, 1);
        assert_eq!(network.edge_count(), 2);
        assert_eq!(network.node_count(), 3);
    }
}

#[cfg(test)]
mod direction {
    use super::helpers::segment;
    use crate::{AttrValue, DirectionPolicy, LineRecord, Network, direct};

    fn policy() -> DirectionPolicy {
        DirectionPolicy::new("drivetime_fw", "drivetime_bw")
    }

    fn record(code: &str, fw: f64, bw: f64) -> LineRecord {
        LineRecord::new(segment(0.0, 0.0, 10.0, 0.0))
            .with("oneway", code)
            .with("drivetime_fw", fw)
            .with("drivetime_bw", bw)
    }

    fn minutes(network: &Network) -> Vec<(u32, u32, f64)> {
        network
            .edges()
            .iter()
            .map(|e| {
                (
                    e.source.0,
                    e.target.0,
                    e.value("minutes").and_then(AttrValue::as_num).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn both_ways_becomes_two_edges() {
        let network = Network::new(vec![record("B", 2.0, 3.0)]).unwrap();
        let directed = direct(&network, &policy());
        assert!(directed.directed());
        assert_eq!(minutes(&directed), vec![(0, 1, 2.0), (1, 0, 3.0)]);
    }

    #[test]
    fn oneway_forward_keeps_one_edge() {
        let network = Network::new(vec![record("FT", 2.0, 3.0)]).unwrap();
        let directed = direct(&network, &policy());
        assert_eq!(minutes(&directed), vec![(0, 1, 2.0)]);
    }

    #[test]
    fn oneway_backward_flips_the_edge() {
        let network = Network::new(vec![record("TF", 2.0, 3.0)]).unwrap();
        let directed = direct(&network, &policy());
        assert_eq!(minutes(&directed), vec![(1, 0, 3.0)]);
    }

    #[test]
    fn missing_weights_drop_the_row() {
        let network = Network::new(vec![
            record("B", 2.0, 3.0).with("drivetime_fw", f64::NAN).with("drivetime_bw", f64::NAN),
        ])
        .unwrap();
        let directed = direct(&network, &policy());
        assert_eq!(directed.edge_count(), 0);
    }

    #[test]
    fn negative_weight_drops_the_row() {
        let network = Network::new(vec![record("B", -1.0, 3.0), record("B", 1.0, 1.0)]).unwrap();
        let directed = direct(&network, &policy());
        assert_eq!(directed.edge_count(), 2);
        assert!(minutes(&directed).iter().all(|&(_, _, w)| w >= 0.0));
    }

    #[test]
    fn unknown_code_counts_as_both() {
        let network = Network::new(vec![record("??", 2.0, 3.0)]).unwrap();
        let directed = direct(&network, &policy());
        assert_eq!(directed.edge_count(), 2);
    }

    #[test]
    fn directing_bumps_revision() {
        let network = Network::new(vec![record("B", 2.0, 3.0)]).unwrap();
        let directed = direct(&network, &policy());
        assert!(directed.revision() > network.revision());
    }

    #[test]
    fn custom_codes() {
        let policy = policy().with_codes("yes", "with", "against");
        let network = Network::new(vec![record("against", 2.0, 3.0)]).unwrap();
        let directed = direct(&network, &policy);
        assert_eq!(minutes(&directed), vec![(1, 0, 3.0)]);
    }
}
