//! The input line table: one geometry plus named attribute values per row.

use geo::{Geometry, LineString, MultiLineString};
use rustc_hash::FxHashMap;

// ── AttrValue ─────────────────────────────────────────────────────────────────

/// A cell in the line table.
///
/// Weight columns are expected to be numeric, but real road data arrives
/// with text columns too (one-way codes such as `"FT"`, or numbers stored as
/// strings).  The weight validator coerces text where it can and fails with
/// a type error where it cannot.
#[derive(Clone, PartialEq, Debug)]
pub enum AttrValue {
    Num(f64),
    Text(String),
}

impl AttrValue {
    /// The numeric value, if this is a finite number.  NaN and text both
    /// count as missing here; use [`AttrValue::coerce_num`] for text
    /// coercion.
    pub fn as_num(&self) -> Option<f64> {
        match *self {
            AttrValue::Num(v) if v.is_finite() => Some(v),
            _ => None,
        }
    }

    /// The numeric value, coercing numeric-looking text.  `Err` means the
    /// value is text that does not parse; `Ok(None)` means missing (NaN).
    pub fn coerce_num(&self) -> Result<Option<f64>, &str> {
        match self {
            AttrValue::Num(v) if v.is_finite() => Ok(Some(*v)),
            AttrValue::Num(_) => Ok(None),
            AttrValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Some(v)),
                Ok(_) => Ok(None),
                Err(_) => Err(s),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Num(_) => None,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Num(v)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

// ── LineRecord ────────────────────────────────────────────────────────────────

/// One row of the input line table.
///
/// The geometry may be a `LineString` or a `MultiLineString`; anything else
/// fails network preparation.  Attributes are free-form named values; the
/// analysis rules decide which of them matter.
#[derive(Clone, Debug)]
pub struct LineRecord {
    pub geometry: Geometry,
    pub data: FxHashMap<String, AttrValue>,
}

impl LineRecord {
    pub fn new(line: LineString) -> LineRecord {
        LineRecord {
            geometry: Geometry::LineString(line),
            data: FxHashMap::default(),
        }
    }

    pub fn multi(lines: MultiLineString) -> LineRecord {
        LineRecord {
            geometry: Geometry::MultiLineString(lines),
            data: FxHashMap::default(),
        }
    }

    pub fn from_geometry(geometry: Geometry) -> LineRecord {
        LineRecord {
            geometry,
            data: FxHashMap::default(),
        }
    }

    /// Attach an attribute value, builder style.
    pub fn with(mut self, column: &str, value: impl Into<AttrValue>) -> LineRecord {
        self.data.insert(column.to_owned(), value.into());
        self
    }
}

impl From<LineString> for LineRecord {
    fn from(line: LineString) -> Self {
        LineRecord::new(line)
    }
}
