//! Feature detection and keypoint extraction.
//!
//! # Available Detectors
//!
//! - **Förstner**: structure tensor corner detection scored by weight and isotropy

mod foerstner;
pub use foerstner::*;

mod nms;
pub use nms::*;
