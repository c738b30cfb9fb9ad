//! Query-engine error type.
//!
//! Configuration errors fail the call.  Per-pair routing failures are not
//! errors: unreachable pairs become missing rows plus one aggregate warning
//! at the end of the query.

use na_net::NetError;
use thiserror::Error;

/// Errors produced while validating rules or compiling the graph.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Net(#[from] NetError),

    #[error("weight column {0:?} not found in the network")]
    WeightColumnMissing(String),

    #[error("weight column {0:?} must be numeric; got {1:?}")]
    WeightType(String, String),

    #[error("invalid weight: {0}")]
    InvalidWeight(String),

    #[error("rule conflict: {0}")]
    RuleConflict(String),

    #[error("argument out of range: {0}")]
    ArgumentRange(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
