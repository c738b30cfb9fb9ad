//! Spatial index trait and the default R-tree implementation.
//!
//! Both queries are batch-shaped: the index is bulk-loaded from the corpus
//! once per call and then probed for every query point.  Bulk loading an
//! R-tree is O(n log n) and much faster than n inserts.

use geo::{LineString, Point};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

// ── SpatialIndex ──────────────────────────────────────────────────────────────

/// Nearest-neighbour searches the point connector and hole closer need.
pub trait SpatialIndex: Send + Sync {
    /// For every query point, the `k` nearest corpus points as
    /// `(corpus index, distance)` pairs sorted by ascending distance.
    /// Fewer than `k` entries are returned when the corpus is smaller.
    fn k_nearest_points(
        &self,
        queries: &[Point],
        corpus: &[Point],
        k: usize,
    ) -> Vec<Vec<(usize, f64)>>;

    /// For every query point, the nearest line within `max_distance` as a
    /// `(line index, distance)` pair, or `None` when every line is further
    /// away.
    fn nearest_line(
        &self,
        queries: &[Point],
        corpus: &[LineString],
        max_distance: f64,
    ) -> Vec<Option<(usize, f64)>>;
}

// ── R-tree entries ────────────────────────────────────────────────────────────

/// Entry stored in the point R-tree: a 2-D position with its corpus index.
#[derive(Clone)]
struct PointEntry {
    pos: [f64; 2],
    idx: usize,
}

impl RTreeObject for PointEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pos)
    }
}

impl PointDistance for PointEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.pos[0] - point[0];
        let dy = self.pos[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Entry stored in the line R-tree: one segment of a line, tagged with the
/// index of the line it came from.  Indexing segments instead of whole lines
/// keeps envelopes tight for long winding geometries.
#[derive(Clone)]
struct SegmentEntry {
    a: [f64; 2],
    b: [f64; 2],
    line: usize,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.a, self.b)
    }
}

impl PointDistance for SegmentEntry {
    /// Squared distance from `point` to the segment.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.b[0] - self.a[0];
        let dy = self.b[1] - self.a[1];
        let len2 = dx * dx + dy * dy;
        let t = if len2 > 0.0 {
            (((point[0] - self.a[0]) * dx + (point[1] - self.a[1]) * dy) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let cx = self.a[0] + t * dx;
        let cy = self.a[1] + t * dy;
        let ex = point[0] - cx;
        let ey = point[1] - cy;
        ex * ex + ey * ey
    }
}

// ── RTreeIndex ────────────────────────────────────────────────────────────────

/// Default [`SpatialIndex`] backed by `rstar` R-trees.
#[derive(Copy, Clone, Debug, Default)]
pub struct RTreeIndex;

impl SpatialIndex for RTreeIndex {
    fn k_nearest_points(
        &self,
        queries: &[Point],
        corpus: &[Point],
        k: usize,
    ) -> Vec<Vec<(usize, f64)>> {
        let entries: Vec<PointEntry> = corpus
            .iter()
            .enumerate()
            .map(|(idx, p)| PointEntry {
                pos: [p.x(), p.y()],
                idx,
            })
            .collect();
        let tree = RTree::bulk_load(entries);

        queries
            .iter()
            .map(|q| {
                tree.nearest_neighbor_iter_with_distance_2(&[q.x(), q.y()])
                    .take(k)
                    .map(|(entry, dist2)| (entry.idx, dist2.sqrt()))
                    .collect()
            })
            .collect()
    }

    fn nearest_line(
        &self,
        queries: &[Point],
        corpus: &[LineString],
        max_distance: f64,
    ) -> Vec<Option<(usize, f64)>> {
        let mut entries = Vec::new();
        for (line_idx, line) in corpus.iter().enumerate() {
            for seg in line.lines() {
                entries.push(SegmentEntry {
                    a: [seg.start.x, seg.start.y],
                    b: [seg.end.x, seg.end.y],
                    line: line_idx,
                });
            }
        }
        let tree = RTree::bulk_load(entries);

        queries
            .iter()
            .map(|q| {
                tree.nearest_neighbor_iter_with_distance_2(&[q.x(), q.y()])
                    .next()
                    .map(|(entry, dist2)| (entry.line, dist2.sqrt()))
                    .filter(|&(_, dist)| dist <= max_distance)
            })
            .collect()
    }
}
