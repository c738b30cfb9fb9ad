//! The compiled graph: a CSR arc structure over network nodes, query-point
//! vertices, and (with line splitting) projection vertices.
//!
//! # Data layout
//!
//! Outgoing arcs of vertex `v` occupy `first_out[v] .. first_out[v + 1]` in
//! the arc arrays, so Dijkstra's inner loop is a contiguous scan.  `tail` is
//! redundant with the row pointer but required for cheap service-area
//! selection and route reconstruction.
//!
//! An undirected network contributes two arcs per edge; the two are
//! `twin`s of each other so a masked deletion (k-routes) removes the
//! physical edge, not just one direction.

use geo::LineString;

use crate::error::{EngineError, EngineResult};

// ── ArcKind ───────────────────────────────────────────────────────────────────

/// What a compiled arc stands for, and how to get back to line geometry.
#[derive(Clone, Debug)]
pub(crate) enum ArcKind {
    /// A network edge; `edge` indexes the network's edge table.
    Base { edge: usize },
    /// A piece of network edge `edge`, cut at query-point projections.
    Split { edge: usize, geometry: LineString },
    /// A connector between a query point and the network.  Dropped from
    /// recovered paths; priced per the connector-weight rule.
    Connector,
}

impl ArcKind {
    /// The network edge this arc maps back to, if any.
    pub fn base_edge(&self) -> Option<usize> {
        match *self {
            ArcKind::Base { edge } | ArcKind::Split { edge, .. } => Some(edge),
            ArcKind::Connector => None,
        }
    }

    pub fn is_connector(&self) -> bool {
        matches!(self, ArcKind::Connector)
    }
}

// ── CompiledGraph ─────────────────────────────────────────────────────────────

/// Immutable arc-list graph ready for repeated shortest-path calls.
pub(crate) struct CompiledGraph {
    first_out: Vec<u32>,
    tail: Vec<u32>,
    head: Vec<u32>,
    weight: Vec<f64>,
    kind: Vec<ArcKind>,
    twin: Vec<u32>,
}

impl CompiledGraph {
    pub fn vertex_count(&self) -> usize {
        self.first_out.len() - 1
    }

    pub fn arc_count(&self) -> usize {
        self.head.len()
    }

    /// Arc indices leaving `vertex`.
    #[inline]
    pub fn out(&self, vertex: u32) -> std::ops::Range<usize> {
        self.first_out[vertex as usize] as usize..self.first_out[vertex as usize + 1] as usize
    }

    #[inline]
    pub fn tail(&self, arc: usize) -> u32 {
        self.tail[arc]
    }

    #[inline]
    pub fn head(&self, arc: usize) -> u32 {
        self.head[arc]
    }

    #[inline]
    pub fn weight(&self, arc: usize) -> f64 {
        self.weight[arc]
    }

    #[inline]
    pub fn kind(&self, arc: usize) -> &ArcKind {
        &self.kind[arc]
    }

    /// The opposite-direction arc of the same physical edge, or `u32::MAX`.
    #[inline]
    pub fn twin(&self, arc: usize) -> u32 {
        self.twin[arc]
    }
}

// ── GraphBuilder ──────────────────────────────────────────────────────────────

struct RawArc {
    tail: u32,
    head: u32,
    weight: f64,
    kind: ArcKind,
    /// Shared id linking the two arcs of an undirected edge.
    pair: u32,
}

/// Accumulates arcs in any order; `build()` sorts them into CSR.
pub(crate) struct GraphBuilder {
    arcs: Vec<RawArc>,
    vertex_count: usize,
    next_pair: u32,
}

impl GraphBuilder {
    /// Network nodes occupy vertices `0..node_count`; query points and
    /// projection vertices come after.
    pub fn new(node_count: usize) -> GraphBuilder {
        GraphBuilder {
            arcs: Vec::new(),
            vertex_count: node_count,
            next_pair: 0,
        }
    }

    /// Make sure `vertex` exists even if no arc touches it, so isolated
    /// query points do not fail the shortest-path calls.
    pub fn ensure_vertex(&mut self, vertex: u32) {
        self.vertex_count = self.vertex_count.max(vertex as usize + 1);
    }

    /// One directed arc.
    pub fn arc(&mut self, tail: u32, head: u32, weight: f64, kind: ArcKind) {
        self.ensure_vertex(tail);
        self.ensure_vertex(head);
        self.arcs.push(RawArc {
            tail,
            head,
            weight,
            kind,
            pair: u32::MAX,
        });
    }

    /// Both directions of an undirected edge, twinned.
    pub fn arc_pair(&mut self, a: u32, b: u32, weight: f64, kind: ArcKind) {
        self.ensure_vertex(a);
        self.ensure_vertex(b);
        let pair = self.next_pair;
        self.next_pair += 1;
        self.arcs.push(RawArc {
            tail: a,
            head: b,
            weight,
            kind: kind.clone(),
            pair,
        });
        self.arcs.push(RawArc {
            tail: b,
            head: a,
            weight,
            kind,
            pair,
        });
    }

    /// Sort arcs into CSR and check the weight invariant.
    pub fn build(self) -> EngineResult<CompiledGraph> {
        if let Some(bad) = self
            .arcs
            .iter()
            .find(|a| !a.weight.is_finite() || a.weight < 0.0)
        {
            return Err(EngineError::InvalidWeight(format!(
                "arc {} -> {} has weight {}",
                bad.tail, bad.head, bad.weight
            )));
        }

        let mut order: Vec<usize> = (0..self.arcs.len()).collect();
        // Stable by insertion so equal tails keep a deterministic order.
        order.sort_by_key(|&i| self.arcs[i].tail);

        let vertex_count = self.vertex_count;
        let mut first_out = vec![0u32; vertex_count + 1];
        for arc in &self.arcs {
            first_out[arc.tail as usize + 1] += 1;
        }
        for v in 1..=vertex_count {
            first_out[v] += first_out[v - 1];
        }

        let mut tail = Vec::with_capacity(order.len());
        let mut head = Vec::with_capacity(order.len());
        let mut weight = Vec::with_capacity(order.len());
        let mut kind = Vec::with_capacity(order.len());
        let mut pair_of = Vec::with_capacity(order.len());
        for &i in &order {
            let arc = &self.arcs[i];
            tail.push(arc.tail);
            head.push(arc.head);
            weight.push(arc.weight);
            kind.push(arc.kind.clone());
            pair_of.push(arc.pair);
        }

        // Twins: the two sorted positions sharing a pair id point at each
        // other.
        let mut twin = vec![u32::MAX; order.len()];
        let mut first_of_pair = vec![u32::MAX; self.next_pair as usize];
        for (pos, &pair) in pair_of.iter().enumerate() {
            if pair == u32::MAX {
                continue;
            }
            let slot = &mut first_of_pair[pair as usize];
            if *slot == u32::MAX {
                *slot = pos as u32;
            } else {
                twin[pos] = *slot;
                twin[*slot as usize] = pos as u32;
            }
        }

        Ok(CompiledGraph {
            first_out,
            tail,
            head,
            weight,
            kind,
            twin,
        })
    }
}
