//! The engine's query log: one record per query call, with the rule
//! snapshot and aggregate result statistics.
//!
//! This is analysis bookkeeping, not diagnostics — tuning the search
//! tolerance or factor is usually done by scanning `percent_missing` and
//! `cost_mean` across a handful of runs.  Diagnostic events go through the
//! `log` crate facade instead.

use std::time::SystemTime;

use na_core::{ConnectorWeight, RuleSet};

/// Aggregate record of one query call.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LogRecord {
    /// Engine method name, e.g. `"od_cost_matrix"`.
    pub method: &'static str,
    // Rule snapshot at call time.
    pub weight: String,
    pub search_tolerance: f64,
    pub search_factor: f64,
    pub split_lines: bool,
    pub connector_weight: ConnectorWeight,
    // Inputs and outcome.
    pub n_origins: usize,
    pub n_destinations: usize,
    /// Mean cost over the produced rows; `None` when nothing was produced
    /// or the query has no cost column.
    pub cost_mean: Option<f64>,
    /// Percentage of requested result cells that came back missing.
    pub percent_missing: f64,
    pub timestamp: SystemTime,
}

impl LogRecord {
    pub(crate) fn new(
        method: &'static str,
        rules: &RuleSet,
        n_origins: usize,
        n_destinations: usize,
        cost_mean: Option<f64>,
        percent_missing: f64,
    ) -> LogRecord {
        LogRecord {
            method,
            weight: rules.weight.to_string(),
            search_tolerance: rules.search_tolerance,
            search_factor: rules.search_factor,
            split_lines: rules.split_lines,
            connector_weight: rules.connector_weight,
            n_origins,
            n_destinations,
            cost_mean,
            percent_missing,
            timestamp: SystemTime::now(),
        }
    }
}

/// Append-only view of every query the engine has run.
#[derive(Default, Debug)]
pub struct QueryLog {
    records: Vec<LogRecord>,
}

impl QueryLog {
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&LogRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn push(&mut self, record: LogRecord) {
        self.records.push(record);
    }
}

impl<'a> IntoIterator for &'a QueryLog {
    type Item = &'a LogRecord;
    type IntoIter = std::slice::Iter<'a, LogRecord>;
    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
