//! Geometry kernel trait and the default planar implementation.

use geo::{
    BoundingRect, Coord, EuclideanDistance, EuclideanLength, LineInterpolatePoint,
    LineLocatePoint, LineString, MultiLineString, Point, Rect,
};

// ── GeometryKernel ────────────────────────────────────────────────────────────

/// The geometric operations the network and engine crates need.
///
/// Implementations must be `Send + Sync` so queries can fan out across
/// origins on a thread pool.
pub trait GeometryKernel: Send + Sync {
    /// First and last coordinate of `line`, or `None` for a degenerate line
    /// with fewer than two coordinates.
    fn endpoints(&self, line: &LineString) -> Option<(Point, Point)>;

    /// Length of `line` in coordinate units.
    fn length(&self, line: &LineString) -> f64;

    /// Closest location on `line` to `point`, together with the fraction of
    /// the line's length at which it sits (in `[0, 1]`).
    fn project(&self, point: Point, line: &LineString) -> (Point, f64);

    /// Cut `line` at the given length fraction.  The cut coordinate is the
    /// last of the first piece and the first of the second.  A fraction at
    /// (or clamped to) the ends yields one zero-length two-coordinate piece.
    fn split(&self, line: &LineString, fraction: f64) -> (LineString, LineString);

    /// The straight two-point line from `from` to `to`.
    fn line_between(&self, from: Point, to: Point) -> LineString;

    /// Axis-aligned bounding rectangle, or `None` for an empty line.
    fn bounds(&self, line: &LineString) -> Option<Rect>;

    /// Collect `lines` into one multi-part geometry (the dissolve step of
    /// result assembly).
    fn union(&self, lines: &[LineString]) -> MultiLineString;

    /// Whether `a` and `b` coincide within `tolerance` on both axes.
    fn equals_2d(&self, a: Point, b: Point, tolerance: f64) -> bool;

    /// Direction of the vector `from → to` in degrees, in `(-180, 180]`,
    /// measured counter-clockwise from the positive x axis.
    fn angle_degrees(&self, from: Point, to: Point) -> f64;
}

// ── EuclideanKernel ───────────────────────────────────────────────────────────

/// Planar kernel backed by the `geo` crate's Euclidean algorithms.
#[derive(Copy, Clone, Debug, Default)]
pub struct EuclideanKernel;

impl GeometryKernel for EuclideanKernel {
    fn endpoints(&self, line: &LineString) -> Option<(Point, Point)> {
        let first = *line.coords().next()?;
        let last = *line.coords().last()?;
        Some((Point::from(first), Point::from(last)))
    }

    fn length(&self, line: &LineString) -> f64 {
        line.euclidean_length()
    }

    fn project(&self, point: Point, line: &LineString) -> (Point, f64) {
        let fraction = line.line_locate_point(&point).unwrap_or(0.0);
        let fallback = line.0.first().copied().unwrap_or(Coord { x: 0.0, y: 0.0 });
        let projected = line
            .line_interpolate_point(fraction)
            .unwrap_or_else(|| Point::from(fallback));
        (projected, fraction)
    }

    fn split(&self, line: &LineString, fraction: f64) -> (LineString, LineString) {
        let coords = &line.0;
        if coords.is_empty() {
            return (LineString::new(Vec::new()), LineString::new(Vec::new()));
        }
        let total = self.length(line);
        let target = fraction.clamp(0.0, 1.0) * total;

        let mut first: Vec<Coord> = vec![coords[0]];
        let mut walked = 0.0;

        for (i, pair) in coords.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let seg = Point::from(a).euclidean_distance(&Point::from(b));

            if walked + seg < target && i + 2 < coords.len() {
                first.push(b);
                walked += seg;
                continue;
            }

            // The cut falls on this segment.
            let t = if seg > 0.0 {
                ((target - walked) / seg).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let cut = Coord {
                x: a.x + t * (b.x - a.x),
                y: a.y + t * (b.y - a.y),
            };
            if first.last() != Some(&cut) {
                first.push(cut);
            }
            let mut second: Vec<Coord> = vec![cut];
            if cut != b {
                second.push(b);
            }
            second.extend_from_slice(&coords[i + 2..]);

            if first.len() < 2 {
                first.push(cut);
            }
            if second.len() < 2 {
                second.push(cut);
            }
            return (LineString::new(first), LineString::new(second));
        }

        // Single-coordinate or empty input; both pieces degenerate.
        let c = coords[0];
        (
            LineString::new(vec![c, c]),
            LineString::new(vec![c, c]),
        )
    }

    fn line_between(&self, from: Point, to: Point) -> LineString {
        LineString::new(vec![Coord::from(from), Coord::from(to)])
    }

    fn bounds(&self, line: &LineString) -> Option<Rect> {
        line.bounding_rect()
    }

    fn union(&self, lines: &[LineString]) -> MultiLineString {
        MultiLineString::new(lines.to_vec())
    }

    fn equals_2d(&self, a: Point, b: Point, tolerance: f64) -> bool {
        (a.x() - b.x()).abs() <= tolerance && (a.y() - b.y()).abs() <= tolerance
    }

    fn angle_degrees(&self, from: Point, to: Point) -> f64 {
        let degrees = (to.y() - from.y()).atan2(to.x() - from.x()).to_degrees();
        // atan2 can return exactly -180 for the negative x axis.
        if degrees <= -180.0 { degrees + 360.0 } else { degrees }
    }
}
