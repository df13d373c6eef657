#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Linear algebra utilities.
pub mod linalg;

/// Operations on rigid poses and point sets.
pub mod ops;

/// Rigid pose value type.
pub mod pose;

/// Rotation construction and comparison helpers.
pub mod transforms;

/// Conversions between primitive arrays and nalgebra types.
pub mod utils;

pub use pose::RigidTransform;
