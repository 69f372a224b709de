use foerstner_image::ImageError;

/// An error type for the interest point detection pipeline.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FoerstnerError {
    /// A detector or kernel parameter is out of its valid range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The input image cannot be processed, e.g. it is too small to have interior pixels.
    #[error("Invalid input: image of {0}x{1} pixels, expected at least {2}x{2}")]
    InvalidInput(usize, usize, usize),

    /// Error raised by an image operation.
    #[error(transparent)]
    Image(#[from] ImageError),
}
