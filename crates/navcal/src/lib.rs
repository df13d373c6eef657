#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use navcal_3d as n3d;

#[doc(inline)]
pub use navcal_landmark as landmark;

#[doc(inline)]
pub use navcal_pivot as pivot;
