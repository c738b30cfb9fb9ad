//! Rule validation and weight-column resolution.
//!
//! Resolution yields one optional cost per network edge, aligned with the
//! edge table.  `None` marks a row excluded from the graph (missing or
//! negative value); configuration problems fail the whole call instead.

use log::warn;
use na_core::{ConnectorWeight, RuleSet, WeightSpec};
use na_geom::GeometryKernel;
use na_net::Network;

use crate::error::{EngineError, EngineResult};

/// Reject rule combinations that cannot be priced consistently.
pub(crate) fn validate_rules(rules: &RuleSet) -> EngineResult<()> {
    match (&rules.weight, rules.connector_weight) {
        (WeightSpec::Length, ConnectorWeight::SpeedKmh(_)) => Err(EngineError::RuleConflict(
            "cannot use a speed-based connector weight when the weight is length".to_owned(),
        )),
        (weight, ConnectorWeight::LengthMultiplier(_)) if *weight != WeightSpec::Length => {
            Err(EngineError::RuleConflict(
                "cannot use a length-multiplier connector weight when the weight is not length"
                    .to_owned(),
            ))
        }
        _ => Ok(()),
    }
}

/// Resolve the weight of every network edge according to `rules.weight`.
///
/// - [`WeightSpec::Length`]: geometric length; synthetic edges get their
///   straight-line length like any other edge.
/// - [`WeightSpec::Minutes`] / [`WeightSpec::Column`]: the named column.
///   Missing and NaN values drop the row with a warning, as do negative
///   values; numeric-looking text is coerced; other text fails the call.
pub(crate) fn resolve_weights(
    network: &Network,
    rules: &RuleSet,
    kernel: &impl GeometryKernel,
) -> EngineResult<Vec<Option<f64>>> {
    let column = match &rules.weight {
        WeightSpec::Length => {
            let weights = network
                .edges()
                .iter()
                .map(|e| Some(kernel.length(&e.geometry)))
                .collect();
            return Ok(weights);
        }
        WeightSpec::Minutes => "minutes",
        WeightSpec::Column(name) => name.as_str(),
    };

    if !network.edges().iter().any(|e| e.value(column).is_some()) {
        return Err(EngineError::WeightColumnMissing(column.to_owned()));
    }

    let mut weights: Vec<Option<f64>> = Vec::with_capacity(network.edge_count());
    let mut n_missing = 0usize;
    let mut n_negative = 0usize;

    for edge in network.edges() {
        let value = match edge.value(column) {
            Some(value) => value.coerce_num().map_err(|text| {
                EngineError::WeightType(column.to_owned(), text.to_owned())
            })?,
            None => None,
        };
        match value {
            Some(v) if v < 0.0 => {
                n_negative += 1;
                weights.push(None);
            }
            Some(v) => weights.push(Some(v)),
            None => {
                n_missing += 1;
                weights.push(None);
            }
        }
    }

    if weights.iter().all(Option::is_none) {
        return Err(EngineError::InvalidWeight(format!(
            "all values in the {column:?} column are missing"
        )));
    }
    if n_missing > 0 {
        warn!("{n_missing} rows with missing values in the {column:?} column were removed");
    }
    if n_negative > 0 {
        warn!("{n_negative} rows with negative values in the {column:?} column were removed");
    }

    Ok(weights)
}
