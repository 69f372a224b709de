#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use foerstner_image as image;

#[doc(inline)]
pub use foerstner_imgproc as imgproc;
