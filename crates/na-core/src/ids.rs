//! Integer id newtypes for the framework's tables.
//!
//! `NodeId` points into a network's node table and `RowId` into the line
//! table the network was built from; wrapping the raw `u32` keeps the two
//! id spaces apart at compile time while staying `Copy`, orderable, and
//! cheap to hash.  The inner value is `pub` so hot loops can index SoA
//! `Vec`s with `id.0 as usize` directly; everywhere else `.index()` reads
//! better.

use std::fmt;

/// Define a `u32` id newtype with an invalid marker and index access.
macro_rules! id_type {
    ($(#[$doc:meta])* $vis:vis $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub u32);

        impl $name {
            /// Marker for "points at nothing": all bits set, never a valid
            /// table position.
            pub const INVALID: $name = $name(u32::MAX);

            /// Widen to `usize` for indexing the table this id points into.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

id_type! {
    /// Position in the node table.  Ids are assigned in (x, y) order of the
    /// unique line endpoints and are only stable within one network
    /// revision.
    pub NodeId
}

id_type! {
    /// Position in the input line table.  Synthetic edges added by the hole
    /// closer carry `RowId::INVALID`.
    pub RowId
}

// ── PointLabel ────────────────────────────────────────────────────────────────

/// How an origin or destination is named in query results.
///
/// Every query point gets a temporary vertex id in a range above the network
/// nodes; results default to labelling rows with that id.  When the caller
/// supplied ids alongside the point geometries, the temporary id is replaced
/// by the caller's id — an integer or a string — in the output rows.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointLabel {
    /// Temporary vertex id assigned during query preparation.
    Temp(u32),
    /// Caller-supplied integer id.
    Int(i64),
    /// Caller-supplied string id.
    Text(String),
}

impl fmt::Display for PointLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointLabel::Temp(id) => write!(f, "{id}"),
            PointLabel::Int(id) => write!(f, "{id}"),
            PointLabel::Text(id) => write!(f, "{id}"),
        }
    }
}

impl From<i64> for PointLabel {
    fn from(id: i64) -> Self {
        PointLabel::Int(id)
    }
}

impl From<&str> for PointLabel {
    fn from(id: &str) -> Self {
        PointLabel::Text(id.to_owned())
    }
}

impl From<String> for PointLabel {
    fn from(id: String) -> Self {
        PointLabel::Text(id)
    }
}
