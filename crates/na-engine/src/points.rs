//! Query points: origins and destinations with optional caller ids.

use geo::Point;
use na_core::PointLabel;

/// One origin or destination.
#[derive(Clone, Debug)]
pub struct PointRecord {
    pub point: Point,
    /// Caller id shown in result rows instead of the temporary vertex id.
    pub id: Option<PointLabel>,
}

impl PointRecord {
    pub fn new(point: Point) -> PointRecord {
        PointRecord { point, id: None }
    }

    pub fn with_id(point: Point, id: impl Into<PointLabel>) -> PointRecord {
        PointRecord {
            point,
            id: Some(id.into()),
        }
    }
}

impl From<Point> for PointRecord {
    fn from(point: Point) -> Self {
        PointRecord::new(point)
    }
}

impl From<(f64, f64)> for PointRecord {
    fn from((x, y): (f64, f64)) -> Self {
        PointRecord::new(Point::new(x, y))
    }
}

/// Result-row label for the point at `index`: the caller id when one was
/// given, the temporary vertex id otherwise.
pub(crate) fn label_for(records: &[PointRecord], temp_offset: u32, index: usize) -> PointLabel {
    records[index]
        .id
        .clone()
        .unwrap_or(PointLabel::Temp(temp_offset + index as u32))
}
