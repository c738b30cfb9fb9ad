//! Direction builder: from an undirected line table to a directed edge list.
//!
//! Road data commonly stores one geometry per street with a direction code
//! and separate forward/backward travel times.  [`direct`] turns each such
//! row into one or two directed edges and writes the directed weight into a
//! single target column (`minutes` by default), which is what the
//! `minutes` weight spec reads at query time.

use log::warn;

use crate::line::AttrValue;
use crate::network::{NetEdge, Network};

// ── DirectionPolicy ───────────────────────────────────────────────────────────

/// How per-row metadata encodes directedness.
///
/// Defaults follow the most common encoding: a `oneway` column holding
/// `"B"` (both ways), `"FT"` (digitised direction only) or `"TF"` (against
/// the digitised direction), and the directed weight written to `minutes`.
#[derive(Clone, Debug)]
pub struct DirectionPolicy {
    /// Column holding the direction code.
    pub direction_col: String,
    /// Code meaning both directions.
    pub both: String,
    /// Code meaning forward only.
    pub forward: String,
    /// Code meaning backward only.
    pub backward: String,
    /// Column holding the forward weight.
    pub forward_col: String,
    /// Column holding the backward weight.
    pub backward_col: String,
    /// Column the directed weight is written to.
    pub target_col: String,
}

impl DirectionPolicy {
    pub fn new(forward_col: &str, backward_col: &str) -> DirectionPolicy {
        DirectionPolicy {
            direction_col: "oneway".to_owned(),
            both: "B".to_owned(),
            forward: "FT".to_owned(),
            backward: "TF".to_owned(),
            forward_col: forward_col.to_owned(),
            backward_col: backward_col.to_owned(),
            target_col: "minutes".to_owned(),
        }
    }

    pub fn with_direction_col(mut self, column: &str) -> DirectionPolicy {
        self.direction_col = column.to_owned();
        self
    }

    pub fn with_codes(mut self, both: &str, forward: &str, backward: &str) -> DirectionPolicy {
        self.both = both.to_owned();
        self.forward = forward.to_owned();
        self.backward = backward.to_owned();
        self
    }

    pub fn with_target_col(mut self, column: &str) -> DirectionPolicy {
        self.target_col = column.to_owned();
        self
    }
}

enum OneWay {
    Both,
    Forward,
    Backward,
}

// ── direct ────────────────────────────────────────────────────────────────────

/// Direct a network according to `policy`, returning a new directed network.
///
/// Per input row:
/// - both directions → a forward edge with the forward weight and a
///   backward edge (source/target swapped) with the backward weight;
/// - one-way → a single edge in the open direction;
/// - a direction whose weight is missing emits nothing, so a row with both
///   weights missing is dropped entirely;
/// - any negative weight drops the whole row.
///
/// Unrecognised or absent direction codes count as both ways.  Drop and
/// fallback counts are logged once per call.
pub fn direct(network: &Network, policy: &DirectionPolicy) -> Network {
    let mut edges: Vec<NetEdge> = Vec::with_capacity(network.edge_count() * 2);

    let mut n_negative = 0usize;
    let mut n_unweighted = 0usize;
    let mut n_uncoded = 0usize;

    for edge in network.edges() {
        let oneway = match edge.value(&policy.direction_col).and_then(AttrValue::as_text) {
            Some(code) if code == policy.both => OneWay::Both,
            Some(code) if code == policy.forward => OneWay::Forward,
            Some(code) if code == policy.backward => OneWay::Backward,
            _ => {
                n_uncoded += 1;
                OneWay::Both
            }
        };

        let forward_weight = edge.value(&policy.forward_col).and_then(AttrValue::as_num);
        let backward_weight = edge.value(&policy.backward_col).and_then(AttrValue::as_num);

        if forward_weight.is_some_and(|w| w < 0.0) || backward_weight.is_some_and(|w| w < 0.0) {
            n_negative += 1;
            continue;
        }

        let before = edges.len();
        match oneway {
            OneWay::Both => {
                if let Some(w) = forward_weight {
                    edges.push(directed_copy(edge, false, &policy.target_col, w));
                }
                if let Some(w) = backward_weight {
                    edges.push(directed_copy(edge, true, &policy.target_col, w));
                }
            }
            OneWay::Forward => {
                if let Some(w) = forward_weight {
                    edges.push(directed_copy(edge, false, &policy.target_col, w));
                }
            }
            OneWay::Backward => {
                if let Some(w) = backward_weight {
                    edges.push(directed_copy(edge, true, &policy.target_col, w));
                }
            }
        }
        if edges.len() == before {
            n_unweighted += 1;
        }
    }

    if n_negative > 0 {
        warn!("{n_negative} rows with negative direction weights were dropped");
    }
    if n_unweighted > 0 {
        warn!("{n_unweighted} rows without direction weights were dropped");
    }
    if n_uncoded > 0 {
        warn!("{n_uncoded} rows without a recognised direction code were treated as bidirectional");
    }

    Network::from_directed_edges(edges, network.revision() + 1)
}

fn directed_copy(edge: &NetEdge, reverse: bool, target_col: &str, weight: f64) -> NetEdge {
    let mut copy = edge.clone();
    if reverse {
        copy.geometry.0.reverse();
    }
    copy.data.insert(target_col.to_owned(), AttrValue::Num(weight));
    copy
}
