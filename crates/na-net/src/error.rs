//! Network-construction error type.

use thiserror::Error;

/// Errors produced while building or mutating a [`crate::Network`].
#[derive(Debug, Error)]
pub enum NetError {
    #[error("network is empty after cleaning")]
    EmptyNetwork,

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

pub type NetResult<T> = Result<T, NetError>;
