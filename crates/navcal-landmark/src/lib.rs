#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod registration;
pub use registration::{
    register_landmarks, RegistrationError, SimilarityTransform, MIN_LANDMARK_PAIRS,
};
