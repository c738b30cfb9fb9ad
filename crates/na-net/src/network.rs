//! The `Network` value type: cleaned edges, derived nodes, and a revision
//! counter.

use geo::{LineString, Point};
use log::info;
use na_core::{NodeId, RowId};
use na_geom::{GeometryKernel, SpatialIndex};
use rustc_hash::FxHashMap;

use crate::error::NetResult;
use crate::line::{AttrValue, LineRecord};
use crate::nodes::make_node_ids;
use crate::prepare::prepare_lines;
use crate::{holes, prepare};

// ── Edge and node rows ────────────────────────────────────────────────────────

/// One directed or undirected edge of the network.
#[derive(Clone, Debug)]
pub struct NetEdge {
    /// Input row this edge came from; `RowId::INVALID` for synthetic edges.
    pub row: RowId,
    pub source: NodeId,
    pub target: NodeId,
    pub geometry: LineString,
    pub data: FxHashMap<String, AttrValue>,
    /// True for straight lines added by the hole closer.  Synthetic edges
    /// have no weight columns until the caller imputes them; with a length
    /// weight they are priced by geometry like any other edge.
    pub synthetic: bool,
}

impl NetEdge {
    pub(crate) fn from_prepared(line: prepare::PreparedLine) -> NetEdge {
        NetEdge {
            row: line.row,
            source: NodeId::INVALID,
            target: NodeId::INVALID,
            geometry: line.geometry,
            data: line.data,
            synthetic: false,
        }
    }

    /// Attribute value of `column`, if present.
    pub fn value(&self, column: &str) -> Option<&AttrValue> {
        self.data.get(column)
    }
}

/// One node of the network: a unique line endpoint.
#[derive(Clone, Debug)]
pub struct NetNode {
    /// Canonical (grid-snapped) endpoint coordinate.
    pub point: Point,
    /// Number of edge ends meeting here; 1 marks a dead-end.
    pub degree: u32,
}

// ── Network ───────────────────────────────────────────────────────────────────

/// An edge table with its derived node table.
///
/// Construction cleans the input rows (see crate docs) and assigns node
/// ids.  Every mutating method bumps [`Network::revision`]; the engine keys
/// its compiled-graph cache on that counter.
#[derive(Clone, Debug)]
pub struct Network {
    edges: Vec<NetEdge>,
    nodes: Vec<NetNode>,
    directed: bool,
    revision: u64,
}

impl Network {
    /// Build an undirected network from raw line rows, merging multi-part
    /// rows where their pieces touch.
    pub fn new(records: Vec<LineRecord>) -> NetResult<Network> {
        Network::with_options(records, true)
    }

    /// Like [`Network::new`] but with row-wise line merging made optional.
    /// Without merging the network may get more and shorter edges.
    pub fn with_options(records: Vec<LineRecord>, merge_lines: bool) -> NetResult<Network> {
        let mut edges: Vec<NetEdge> = prepare_lines(records, merge_lines)?
            .into_iter()
            .map(NetEdge::from_prepared)
            .collect();
        let nodes = make_node_ids(&mut edges);
        Ok(Network {
            edges,
            nodes,
            directed: false,
            revision: 0,
        })
    }

    /// Used by [`crate::direct`] to assemble the directed result.
    pub(crate) fn from_directed_edges(mut edges: Vec<NetEdge>, revision: u64) -> Network {
        let nodes = make_node_ids(&mut edges);
        Network {
            edges,
            nodes,
            directed: true,
            revision,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn edges(&self) -> &[NetEdge] {
        &self.edges
    }

    /// Mutable access to the edge rows, e.g. to impute weights on synthetic
    /// edges.  Bumps the revision: callers are assumed to change something.
    pub fn edges_mut(&mut self) -> &mut [NetEdge] {
        self.revision += 1;
        &mut self.edges
    }

    pub fn nodes(&self) -> &[NetNode] {
        &self.nodes
    }

    pub fn node_point(&self, node: NodeId) -> Point {
        self.nodes[node.index()].point
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn directed(&self) -> bool {
        self.directed
    }

    /// Monotonically increasing mutation counter.  Node ids are only stable
    /// within one revision.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ── Hole closing ──────────────────────────────────────────────────────

    /// Bridge dead-ends to nearby nodes with straight synthetic edges.
    ///
    /// `max_angle` (degrees, 0–180) bounds how far the bridge may deviate
    /// from the direction of the line the dead-end terminates; 180 accepts
    /// any direction.  Returns the number of edges added.  The node table is
    /// rebuilt and the revision bumped.
    pub fn close_holes(
        &mut self,
        max_distance: f64,
        max_angle: f64,
        kernel: &impl GeometryKernel,
        index: &impl SpatialIndex,
    ) -> usize {
        let pairs = holes::find_holes(&self.edges, &self.nodes, max_distance, max_angle, kernel, index);
        self.add_synthetic_edges(pairs, kernel)
    }

    /// Bridge each dead-end to its nearest other dead-end within
    /// `max_distance`.  Returns the number of edges added.
    pub fn close_holes_to_deadends(
        &mut self,
        max_distance: f64,
        kernel: &impl GeometryKernel,
        index: &impl SpatialIndex,
    ) -> usize {
        let pairs = holes::find_holes_to_deadends(&self.nodes, max_distance, index);
        self.add_synthetic_edges(pairs, kernel)
    }

    fn add_synthetic_edges(
        &mut self,
        pairs: Vec<(NodeId, NodeId)>,
        kernel: &impl GeometryKernel,
    ) -> usize {
        let added = pairs.len();
        for (from, to) in pairs {
            let geometry = kernel.line_between(self.node_point(from), self.node_point(to));
            self.edges.push(NetEdge {
                row: RowId::INVALID,
                source: NodeId::INVALID,
                target: NodeId::INVALID,
                geometry,
                data: FxHashMap::default(),
                synthetic: true,
            });
        }
        if added > 0 {
            info!("{added} holes were closed with straight lines");
            self.rebuild_nodes();
        }
        added
    }

    // ── Connected components ──────────────────────────────────────────────

    /// Node count of the connected component each edge belongs to, treating
    /// every edge as bidirectional.
    pub fn component_sizes(&self) -> Vec<usize> {
        let component = self.node_components();
        let mut node_counts: FxHashMap<u32, usize> = FxHashMap::default();
        for &c in &component {
            *node_counts.entry(c).or_insert(0) += 1;
        }
        self.edges
            .iter()
            .map(|e| node_counts[&component[e.source.index()]])
            .collect()
    }

    /// Drop every edge outside the largest connected component.  Returns
    /// the number of edges removed.
    pub fn remove_isolated(&mut self) -> usize {
        let component = self.node_components();
        let mut node_counts: FxHashMap<u32, usize> = FxHashMap::default();
        for &c in &component {
            *node_counts.entry(c).or_insert(0) += 1;
        }
        // Largest by node count; ties go to the lowest component id so the
        // result is deterministic.
        let Some((&largest, _)) = node_counts
            .iter()
            .max_by_key(|&(&c, &n)| (n, std::cmp::Reverse(c)))
        else {
            return 0;
        };

        let before = self.edges.len();
        self.edges
            .retain(|e| component[e.source.index()] == largest);
        let removed = before - self.edges.len();
        if removed > 0 {
            info!("{removed} edges outside the largest connected component were removed");
            self.rebuild_nodes();
        }
        removed
    }

    /// Component id per node, via breadth-first flooding of the undirected
    /// adjacency.
    fn node_components(&self) -> Vec<u32> {
        let mut adjacency: Vec<Vec<NodeId>> = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            adjacency[edge.source.index()].push(edge.target);
            adjacency[edge.target.index()].push(edge.source);
        }

        let mut component: Vec<u32> = vec![u32::MAX; self.nodes.len()];
        let mut next = 0u32;
        let mut stack: Vec<NodeId> = Vec::new();
        for start in 0..self.nodes.len() {
            if component[start] != u32::MAX {
                continue;
            }
            component[start] = next;
            stack.push(NodeId(start as u32));
            while let Some(node) = stack.pop() {
                for &neighbour in &adjacency[node.index()] {
                    if component[neighbour.index()] == u32::MAX {
                        component[neighbour.index()] = next;
                        stack.push(neighbour);
                    }
                }
            }
            next += 1;
        }
        component
    }

    // ── Internals ─────────────────────────────────────────────────────────

    pub(crate) fn rebuild_nodes(&mut self) {
        self.nodes = make_node_ids(&mut self.edges);
        self.revision += 1;
    }
}
