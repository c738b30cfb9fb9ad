//! Analysis rules: how edge cost is derived and how query points attach to
//! the network.
//!
//! A [`RuleSet`] is a plain value.  The engine hashes it
//! ([`RuleSet::fingerprint`]) together with the network revision and the
//! query point coordinates to decide whether the compiled graph can be
//! reused; there is no stored "last seen" copy to compare against.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

// ── WeightSpec ────────────────────────────────────────────────────────────────

/// How the cost of a network edge is derived.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightSpec {
    /// Geometric length of the edge, in coordinate-system units.
    Length,
    /// The `minutes` column, as written by the direction builder.
    Minutes,
    /// A named numeric column on the line table.
    Column(String),
}

impl WeightSpec {
    /// Normalise a user-supplied weight name.
    ///
    /// `"length"`, `"meters"` and `"metres"` map to [`WeightSpec::Length`];
    /// `"min"` and anything starting with `"minut"` map to
    /// [`WeightSpec::Minutes`]; everything else is taken as a column name.
    pub fn parse(name: &str) -> WeightSpec {
        let lower = name.trim().to_ascii_lowercase();
        if lower == "length" || lower.contains("meter") || lower.contains("metre") {
            WeightSpec::Length
        } else if lower == "min" || lower.starts_with("minut") {
            WeightSpec::Minutes
        } else {
            WeightSpec::Column(name.trim().to_owned())
        }
    }

    /// The column this spec reads from, if any.
    pub fn column_name(&self) -> Option<&str> {
        match self {
            WeightSpec::Length => None,
            WeightSpec::Minutes => Some("minutes"),
            WeightSpec::Column(name) => Some(name),
        }
    }
}

impl fmt::Display for WeightSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightSpec::Length => write!(f, "length"),
            WeightSpec::Minutes => write!(f, "minutes"),
            WeightSpec::Column(name) => write!(f, "{name}"),
        }
    }
}

// ── ConnectorWeight ───────────────────────────────────────────────────────────

/// How the edges between query points and the network nodes they attach to
/// are weighted.
///
/// The default is [`ConnectorWeight::Zero`]: the hop from a point onto the
/// network is free.  With a large search tolerance that makes faraway points
/// unrealistically cheap to reach, so the two other variants price the hop
/// by its straight-line distance.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectorWeight {
    /// Connector edges cost nothing.
    #[default]
    Zero,
    /// Connector cost = distance / (kmh · 1000 / 60), i.e. minutes spent
    /// covering the distance at the given speed.  Only valid when the weight
    /// is [`WeightSpec::Minutes`].
    SpeedKmh(f64),
    /// Connector cost = distance · multiplier.  Only valid when the weight
    /// is [`WeightSpec::Length`].
    LengthMultiplier(f64),
}

impl ConnectorWeight {
    /// Cost of a connector edge spanning `distance` coordinate units.
    pub fn cost(&self, distance: f64) -> f64 {
        match *self {
            ConnectorWeight::Zero => 0.0,
            ConnectorWeight::SpeedKmh(kmh) => distance / (kmh * 1000.0 / 60.0),
            ConnectorWeight::LengthMultiplier(m) => distance * m,
        }
    }
}

// ── RuleSet ───────────────────────────────────────────────────────────────────

/// Tunable parameters of one analysis run.
///
/// The fields can be changed freely between queries; the engine notices via
/// [`RuleSet::fingerprint`] and rebuilds the compiled graph when needed.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleSet {
    /// How edge cost is derived.
    pub weight: WeightSpec,
    /// Maximum distance from a query point to the nearest network node (or
    /// line, with `split_lines`) for the point to be connectable at all.
    pub search_tolerance: f64,
    /// Non-negative slack `f` widening the attachment window: a point may
    /// attach to every node within `d* · (1 + f/100) + f`, where `d*` is the
    /// distance to its nearest node.  Both a percentage and an absolute
    /// number of units.
    pub search_factor: f64,
    /// When true, each point attaches to the projection point on its nearest
    /// line, splitting the line in two for the duration of the query.
    pub split_lines: bool,
    /// Weighting of the point-to-network connector edges.
    pub connector_weight: ConnectorWeight,
}

impl RuleSet {
    /// A rule set with the defaults: tolerance 250, factor 0, no line
    /// splitting, free connectors.
    pub fn new(weight: WeightSpec) -> RuleSet {
        RuleSet {
            weight,
            search_tolerance: 250.0,
            search_factor: 0.0,
            split_lines: false,
            connector_weight: ConnectorWeight::Zero,
        }
    }

    pub fn with_search_tolerance(mut self, tolerance: f64) -> RuleSet {
        self.search_tolerance = tolerance;
        self
    }

    pub fn with_search_factor(mut self, factor: f64) -> RuleSet {
        self.search_factor = factor;
        self
    }

    pub fn with_split_lines(mut self, split: bool) -> RuleSet {
        self.split_lines = split;
        self
    }

    pub fn with_connector_weight(mut self, connector: ConnectorWeight) -> RuleSet {
        self.connector_weight = connector;
        self
    }

    /// Content hash over every rule field.
    ///
    /// Equal rule sets produce equal fingerprints; any field change produces
    /// a different one (up to hash collisions, which only cost a skipped
    /// rebuild check, not correctness of results).
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        match &self.weight {
            WeightSpec::Length => 0u8.hash(&mut hasher),
            WeightSpec::Minutes => 1u8.hash(&mut hasher),
            WeightSpec::Column(name) => {
                2u8.hash(&mut hasher);
                name.hash(&mut hasher);
            }
        }
        self.search_tolerance.to_bits().hash(&mut hasher);
        self.search_factor.to_bits().hash(&mut hasher);
        self.split_lines.hash(&mut hasher);
        match self.connector_weight {
            ConnectorWeight::Zero => 0u8.hash(&mut hasher),
            ConnectorWeight::SpeedKmh(kmh) => {
                1u8.hash(&mut hasher);
                kmh.to_bits().hash(&mut hasher);
            }
            ConnectorWeight::LengthMultiplier(m) => {
                2u8.hash(&mut hasher);
                m.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}
