//! Dijkstra over the compiled graph.
//!
//! Ties on cost break by ascending vertex id, so results are reproducible
//! for a fixed graph.  The optional arc mask serves the k-routes working
//! copies: a masked arc is simply invisible.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::graph::CompiledGraph;

// ── Cost ──────────────────────────────────────────────────────────────────────

/// Heap priority: a finite non-negative `f64` with total order.
#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) struct Cost(pub f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

// ── One-to-many costs ─────────────────────────────────────────────────────────

/// Cost from `source` to every vertex; unreached vertices stay at
/// `f64::INFINITY`.  With a `cutoff`, vertices beyond it are not expanded
/// and report as unreached.
pub(crate) fn costs_from(
    graph: &CompiledGraph,
    source: u32,
    cutoff: Option<f64>,
    mask: Option<&[bool]>,
) -> Vec<f64> {
    let mut dist = vec![f64::INFINITY; graph.vertex_count()];
    dist[source as usize] = 0.0;

    let mut heap: BinaryHeap<Reverse<(Cost, u32)>> = BinaryHeap::new();
    heap.push(Reverse((Cost(0.0), source)));

    while let Some(Reverse((Cost(cost), vertex))) = heap.pop() {
        if cost > dist[vertex as usize] {
            continue; // stale entry
        }
        for arc in graph.out(vertex) {
            if mask.is_some_and(|m| !m[arc]) {
                continue;
            }
            let next = graph.head(arc);
            let next_cost = cost + graph.weight(arc);
            if cutoff.is_some_and(|c| next_cost > c) {
                continue;
            }
            if next_cost < dist[next as usize] {
                dist[next as usize] = next_cost;
                heap.push(Reverse((Cost(next_cost), next)));
            }
        }
    }

    dist
}

// ── Point-to-point path ───────────────────────────────────────────────────────

/// Shortest path from `source` to `target` as the arc indices traversed, in
/// order, with the total cost.  `None` when no path exists.
pub(crate) fn path_from(
    graph: &CompiledGraph,
    source: u32,
    target: u32,
    mask: Option<&[bool]>,
) -> Option<(Vec<usize>, f64)> {
    if source == target {
        return Some((Vec::new(), 0.0));
    }

    let mut dist = vec![f64::INFINITY; graph.vertex_count()];
    let mut prev_arc = vec![usize::MAX; graph.vertex_count()];
    dist[source as usize] = 0.0;

    let mut heap: BinaryHeap<Reverse<(Cost, u32)>> = BinaryHeap::new();
    heap.push(Reverse((Cost(0.0), source)));

    while let Some(Reverse((Cost(cost), vertex))) = heap.pop() {
        if vertex == target {
            return Some((reconstruct(graph, &prev_arc, target), cost));
        }
        if cost > dist[vertex as usize] {
            continue;
        }
        for arc in graph.out(vertex) {
            if mask.is_some_and(|m| !m[arc]) {
                continue;
            }
            let next = graph.head(arc);
            let next_cost = cost + graph.weight(arc);
            if next_cost < dist[next as usize] {
                dist[next as usize] = next_cost;
                prev_arc[next as usize] = arc;
                heap.push(Reverse((Cost(next_cost), next)));
            }
        }
    }

    None
}

fn reconstruct(graph: &CompiledGraph, prev_arc: &[usize], target: u32) -> Vec<usize> {
    let mut arcs = Vec::new();
    let mut vertex = target;
    loop {
        let arc = prev_arc[vertex as usize];
        if arc == usize::MAX {
            break;
        }
        arcs.push(arc);
        vertex = graph.tail(arc);
    }
    arcs.reverse();
    arcs
}
