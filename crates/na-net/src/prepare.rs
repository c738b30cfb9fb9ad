//! Network preparation: from raw line rows to clean single-part edges.
//!
//! Node ids are derived from line endpoints, so every edge must be a single
//! `LineString` with two distinct ends: multi-part rows are merged where
//! their pieces touch and exploded otherwise, and closed rings (which have
//! no endpoints) are dropped.

use geo::{Coord, Geometry, LineString};
use log::info;
use na_core::RowId;
use rustc_hash::FxHashMap;

use crate::error::{NetError, NetResult};
use crate::line::{AttrValue, LineRecord};

/// A cleaned single-part line, still without node ids.
pub(crate) struct PreparedLine {
    pub row: RowId,
    pub geometry: LineString,
    pub data: FxHashMap<String, AttrValue>,
}

/// Clean the input rows: drop empties, merge multi-part rows end-to-end,
/// drop rings, explode what remains into single parts.
///
/// `row` on each output line is the index of the input row it came from, so
/// attributes of exploded parts can be traced back.
pub(crate) fn prepare_lines(
    records: Vec<LineRecord>,
    merge_lines: bool,
) -> NetResult<Vec<PreparedLine>> {
    let n_input = records.len();
    let mut out: Vec<PreparedLine> = Vec::with_capacity(n_input);

    let mut n_empty = 0usize;
    let mut n_rings = 0usize;
    let mut n_exploded = 0usize;

    for (idx, record) in records.into_iter().enumerate() {
        let parts: Vec<LineString> = match record.geometry {
            Geometry::LineString(line) => vec![line],
            Geometry::MultiLineString(multi) => {
                let mut parts: Vec<LineString> = Vec::with_capacity(multi.0.len());
                for part in multi.0 {
                    if part.0.is_empty() {
                        n_empty += 1;
                    } else {
                        parts.push(part);
                    }
                }
                if merge_lines { merge_parts(parts) } else { parts }
            }
            other => {
                return Err(NetError::InvalidGeometry(format!(
                    "mixed geometry types: expected lines, row {idx} is {}",
                    geometry_name(&other)
                )));
            }
        };

        let mut kept = 0usize;
        for part in parts {
            if part.0.len() < 2 {
                n_empty += 1;
                continue;
            }
            if part.0.first() == part.0.last() {
                n_rings += 1;
                continue;
            }
            out.push(PreparedLine {
                row: RowId(idx as u32),
                geometry: part,
                data: record.data.clone(),
            });
            kept += 1;
        }
        n_exploded += kept.saturating_sub(1);
    }

    if n_empty > 0 {
        info!("{n_empty} empty geometries were removed from the network");
    }
    if n_rings > 0 {
        info!("{n_rings} closed rings were removed from the network");
    }
    if n_exploded > 0 {
        info!("{n_exploded} extra rows were created by splitting multi-part geometries");
    }

    if out.is_empty() {
        if n_rings > 0 && n_rings + n_empty >= n_input {
            return Err(NetError::InvalidGeometry(
                "network contains only rings".to_owned(),
            ));
        }
        return Err(NetError::EmptyNetwork);
    }

    Ok(out)
}

fn geometry_name(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "a point",
        Geometry::MultiPoint(_) => "a multi-point",
        Geometry::Polygon(_) => "a polygon",
        Geometry::MultiPolygon(_) => "a multi-polygon",
        Geometry::GeometryCollection(_) => "a geometry collection",
        Geometry::Rect(_) => "a rectangle",
        Geometry::Triangle(_) => "a triangle",
        Geometry::Line(_) => "a line segment",
        Geometry::LineString(_) | Geometry::MultiLineString(_) => "a line",
    }
}

/// Row-wise line merge: chain parts whose endpoints coincide exactly, in
/// either orientation.  Parts that connect nowhere stay separate and are
/// exploded by the caller.
fn merge_parts(parts: Vec<LineString>) -> Vec<LineString> {
    let mut pool: Vec<Vec<Coord>> = parts.into_iter().map(|l| l.0).collect();
    let mut merged: Vec<LineString> = Vec::new();

    while let Some(mut chain) = pool.pop() {
        loop {
            let mut extended = false;
            let mut i = 0;
            while i < pool.len() {
                let part = &pool[i];
                let (chain_start, chain_end) = (chain[0], chain[chain.len() - 1]);
                let (part_start, part_end) = (part[0], part[part.len() - 1]);

                if part_start == chain_end {
                    let part = pool.swap_remove(i);
                    chain.extend_from_slice(&part[1..]);
                    extended = true;
                } else if part_end == chain_end {
                    let mut part = pool.swap_remove(i);
                    part.reverse();
                    chain.extend_from_slice(&part[1..]);
                    extended = true;
                } else if part_end == chain_start {
                    let part = pool.swap_remove(i);
                    let mut joined = part;
                    joined.extend_from_slice(&chain[1..]);
                    chain = joined;
                    extended = true;
                } else if part_start == chain_start {
                    let mut part = pool.swap_remove(i);
                    part.reverse();
                    part.extend_from_slice(&chain[1..]);
                    chain = part;
                    extended = true;
                } else {
                    i += 1;
                }
            }
            if !extended {
                break;
            }
        }
        merged.push(LineString::new(chain));
    }

    // Popping from the back reverses the row-internal part order; restore it
    // so output is deterministic in the input order.
    merged.reverse();
    merged
}
