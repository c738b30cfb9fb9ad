//! `na-core` — foundational types for the `rust_na` network analysis
//! framework.
//!
//! This crate is a dependency of every other `na-*` crate.  It intentionally
//! has no `na-*` dependencies and minimal external ones (only `rustc-hash`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                                  |
//! |-----------|-----------------------------------------------------------|
//! | [`ids`]   | `NodeId`, `RowId`, `PointLabel`                           |
//! | [`rules`] | `RuleSet`, `WeightSpec`, `ConnectorWeight`                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.         |

pub mod ids;
pub mod rules;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use ids::{NodeId, PointLabel, RowId};
pub use rules::{ConnectorWeight, RuleSet, WeightSpec};
