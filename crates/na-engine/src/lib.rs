//! `na-engine` — the routing query engine of the `rust_na` framework.
//!
//! Four query families over one compiled graph: origin–destination cost
//! matrices, shortest-route geometries (plain and k alternatives), route
//! frequencies, and service areas.  Query points attach to the network per
//! the rule set — to nearby node endpoints, or by splitting their nearest
//! line at the projection point — and the compiled graph is cached under a
//! content fingerprint of (network revision, rules, point coordinates).
//!
//! # Crate layout
//!
//! | Module           | Contents                                            |
//! |------------------|-----------------------------------------------------|
//! | [`engine`]       | `Engine` facade, cache, preparation                 |
//! | [`points`]       | `PointRecord` — origins and destinations            |
//! | [`od_matrix`]    | `OdRow`, `OdOptions`                                |
//! | [`route`]        | `RouteRow`, `FrequencyRow`                          |
//! | [`service_area`] | `ServiceAreaRow`                                    |
//! | [`query_log`]    | `QueryLog`, `LogRecord`                             |
//! | [`error`]        | `EngineError`, `EngineResult<T>`                    |
//!
//! Graph compilation (`graph`, `connect`), Dijkstra (`dijkstra`), weight
//! resolution (`validate`), and result assembly (`assemble`) are internal.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `parallel` | Fans queries out across origins via Rayon.               |
//! | `serde`    | Derives `Serialize` on result rows and log records.      |

pub mod engine;
pub mod error;
pub mod od_matrix;
pub mod points;
pub mod query_log;
pub mod route;
pub mod service_area;

mod assemble;
mod connect;
mod dijkstra;
mod graph;
mod validate;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use od_matrix::{OdOptions, OdRow};
pub use points::PointRecord;
pub use query_log::{LogRecord, QueryLog};
pub use route::{FrequencyRow, RouteRow};
pub use service_area::ServiceAreaRow;
