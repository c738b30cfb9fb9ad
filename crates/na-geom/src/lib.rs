//! `na-geom` — planar geometry kernel and spatial indexing.
//!
//! The rest of the framework consumes geometry through two small traits so
//! that the concrete backends (`geo` for computation, `rstar` for nearest
//! neighbour search) stay swappable:
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`kernel`] | `GeometryKernel` trait, `EuclideanKernel`                 |
//! | [`index`]  | `SpatialIndex` trait, `RTreeIndex`                        |
//!
//! All coordinates are planar `f64` pairs in whatever projected CRS the
//! caller's data is in (typically metres).  Nothing in this crate is
//! geodesic.

pub mod index;
pub mod kernel;


pub use index::{RTreeIndex, SpatialIndex};
pub use kernel::{EuclideanKernel, GeometryKernel};
