#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image basic operations module.
pub mod core;

/// error types of the detection pipeline.
pub mod error;

/// feature detection module.
pub mod features;

/// image filtering module.
pub mod filter;

/// operations to normalize images.
pub mod normalize;

/// border extension policies for filtering.
pub mod padding;

/// module containing parallization utilities.
pub mod parallel;

/// operations to threshold images.
pub mod threshold;

pub use error::FoerstnerError;
