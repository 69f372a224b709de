//! Förstner interest point detection.
//!
//! The detector scores every pixel with the structure tensor built from first derivative of
//! gaussian gradients and keeps the pixels that are strict local maxima of both the
//! corner weight and the isotropy of the tensor.
//!
//! # Algorithm
//!
//! 1. Correlate the image with a derivative of gaussian kernel and its transpose: `Gx`, `Gy`.
//! 2. Form `Gxx = Gx * Gx`, `Gyy = Gy * Gy` and `Gxy = Gx * Gy`, smoothing only `Gxy` with a
//!    3x3 gaussian of sigma one.
//! 3. `trace = Gxx + Gyy` and `det = Gxx * Gyy - Gxy * Gxy`, pixel by pixel.
//! 4. `weight = det / trace` and `isotropy = 4 det / trace^2`, zero where the trace is zero.
//! 5. Suppress non-maxima of both fields in the 4-neighborhood.
//! 6. Zero the weight at or below half of its (suppressed) mean and the isotropy at or below 0.5.
//! 7. Every interior pixel with a non-zero weight and a non-zero isotropy is a keypoint.
//!
//! # References
//!
//! - Förstner, W., & Gülch, E. (1987). A fast operator for detection and precise location of
//!   distinct points, corners and centres of circular features.
use serde::{Deserialize, Serialize};

use foerstner_image::{Image, ImageError};

use super::nms::non_max_suppression_4;
use crate::core::mean;
use crate::error::FoerstnerError;
use crate::filter::kernels::{gaussian_derivative_kernel_2d, Kernel2d, KernelOrigin};
use crate::filter::{filter2d, gaussian_blur};
use crate::padding::PaddingMode;
use crate::parallel;
use crate::threshold::threshold_to_zero;

/// Smallest image side that leaves interior pixels after excluding the one pixel border.
pub const MIN_IMAGE_SIDE: usize = 3;

/// Side length of the gaussian window smoothing the mixed gradient product.
const MIXED_PRODUCT_WINDOW: usize = 3;

/// Sigma of the gaussian window smoothing the mixed gradient product.
const MIXED_PRODUCT_SIGMA: f32 = 1.0;

/// A detected interest point.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    /// The column of the keypoint.
    pub x: u32,
    /// The row of the keypoint.
    pub y: u32,
    /// The diameter of the keypoint neighborhood.
    pub scale: f32,
}

impl KeyPoint {
    /// Creates a new keypoint at the given column and row.
    pub fn new(x: u32, y: u32, scale: f32) -> Self {
        KeyPoint { x, y, scale }
    }
}

/// Parameters of the [`FoerstnerDetector`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoerstnerConfig {
    /// Standard deviation of the derivative of gaussian kernel.
    pub sigma: f32,
    /// Origin row of the derivative term of the kernel.
    pub kernel_origin: KernelOrigin,
    /// Border extension used by every filter.
    pub padding: PaddingMode,
    /// The weight cutoff is this factor times the mean of the suppressed weight.
    pub weight_mean_factor: f32,
    /// The isotropy cutoff.
    pub isotropy_threshold: f32,
    /// Scale assigned to every keypoint.
    pub keypoint_scale: f32,
}

impl Default for FoerstnerConfig {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            kernel_origin: KernelOrigin::RowOne,
            padding: PaddingMode::Reflect101,
            weight_mean_factor: 0.5,
            isotropy_threshold: 0.5,
            keypoint_scale: 3.0,
        }
    }
}

impl FoerstnerConfig {
    /// Create a default configuration with the given sigma.
    pub fn with_sigma(sigma: f32) -> Self {
        Self {
            sigma,
            ..Default::default()
        }
    }

    /// Check that every parameter is in its valid range.
    pub fn validate(&self) -> Result<(), FoerstnerError> {
        // sigma is checked when building the kernel
        gaussian_derivative_kernel_2d(self.sigma, self.kernel_origin)?;

        if !self.weight_mean_factor.is_finite() || self.weight_mean_factor < 0.0 {
            return Err(FoerstnerError::InvalidParameter(format!(
                "weight_mean_factor must be a non-negative finite number, got {}",
                self.weight_mean_factor
            )));
        }
        if !self.isotropy_threshold.is_finite() {
            return Err(FoerstnerError::InvalidParameter(format!(
                "isotropy_threshold must be finite, got {}",
                self.isotropy_threshold
            )));
        }
        if !self.keypoint_scale.is_finite() || self.keypoint_scale <= 0.0 {
            return Err(FoerstnerError::InvalidParameter(format!(
                "keypoint_scale must be a positive finite number, got {}",
                self.keypoint_scale
            )));
        }
        Ok(())
    }
}

/// The per-pixel structure tensor as three scalar fields.
#[derive(Clone, Debug)]
pub struct StructureTensor {
    /// Squared row-kernel gradient.
    pub gxx: Image<f32, 1>,
    /// Squared column-kernel gradient.
    pub gyy: Image<f32, 1>,
    /// Smoothed product of both gradients.
    pub gxy: Image<f32, 1>,
}

impl StructureTensor {
    /// Build the structure tensor from the two directional gradients.
    ///
    /// Only the mixed product is smoothed, with a 3x3 gaussian window of sigma one.
    pub fn from_gradients(
        gx: &Image<f32, 1>,
        gy: &Image<f32, 1>,
        padding: PaddingMode,
    ) -> Result<Self, ImageError> {
        if gx.size() != gy.size() {
            return Err(ImageError::InvalidImageSize(
                gx.cols(),
                gx.rows(),
                gy.cols(),
                gy.rows(),
            ));
        }

        let mut gxx = Image::from_size_val(gx.size(), 0.0)?;
        parallel::par_iter_rows_val(gx, &mut gxx, |&g, dst| *dst = g * g);

        let mut gyy = Image::from_size_val(gy.size(), 0.0)?;
        parallel::par_iter_rows_val(gy, &mut gyy, |&g, dst| *dst = g * g);

        let mut gxy_raw = Image::from_size_val(gx.size(), 0.0)?;
        parallel::par_iter_rows_val_two(gx, gy, &mut gxy_raw, |&a, &b, dst| *dst = a * b);

        let mut gxy = Image::from_size_val(gx.size(), 0.0)?;
        gaussian_blur(
            &gxy_raw,
            &mut gxy,
            MIXED_PRODUCT_WINDOW,
            MIXED_PRODUCT_SIGMA,
            padding,
        )?;

        Ok(Self { gxx, gyy, gxy })
    }

    /// Compute `Gxx + Gyy` per pixel.
    pub fn trace(&self) -> Result<Image<f32, 1>, ImageError> {
        let mut trace = Image::from_size_val(self.gxx.size(), 0.0)?;
        parallel::par_iter_rows_val_two(&self.gxx, &self.gyy, &mut trace, |&a, &b, dst| {
            *dst = a + b
        });
        Ok(trace)
    }

    /// Compute `Gxx * Gyy - Gxy * Gxy` per pixel.
    pub fn determinant(&self) -> Result<Image<f32, 1>, ImageError> {
        let mut det = Image::from_size_val(self.gxx.size(), 0.0)?;
        parallel::par_iter_rows_val_two(&self.gxx, &self.gyy, &mut det, |&a, &b, dst| {
            *dst = a * b
        });

        let gxy = self.gxy.as_slice();
        det.as_slice_mut()
            .iter_mut()
            .zip(gxy.iter())
            .for_each(|(d, &c)| *d -= c * c);

        Ok(det)
    }
}

/// Correlate the image with the kernel and with its transpose.
///
/// # Returns
///
/// The gradients `(Gx, Gy)`, both with the size of `src`.
pub fn directional_gradients(
    src: &Image<f32, 1>,
    kernel: &Kernel2d,
    padding: PaddingMode,
) -> Result<(Image<f32, 1>, Image<f32, 1>), ImageError> {
    let mut gx = Image::from_size_val(src.size(), 0.0)?;
    filter2d(src, &mut gx, kernel, padding)?;

    let mut gy = Image::from_size_val(src.size(), 0.0)?;
    filter2d(src, &mut gy, &kernel.transpose(), padding)?;

    Ok((gx, gy))
}

// the quotient is defined as zero where the trace vanishes or overflows
#[inline]
fn safe_ratio(num: f32, den: f32) -> f32 {
    if den == 0.0 {
        return 0.0;
    }
    let ratio = num / den;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// Compute the corner weight `det / trace` per pixel.
///
/// The weight is zero where the trace is zero.
///
/// PRECONDITION: all images must have the same shape.
pub fn weight_response(
    determinant: &Image<f32, 1>,
    trace: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
) -> Result<(), ImageError> {
    if determinant.size() != trace.size() || trace.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            determinant.cols(),
            determinant.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows_val_two(determinant, trace, dst, |&det, &tr, dst| {
        *dst = safe_ratio(det, tr);
    });

    Ok(())
}

/// Compute the isotropy `4 det / trace^2` per pixel.
///
/// The isotropy is zero where the trace is zero.
///
/// PRECONDITION: all images must have the same shape.
pub fn isotropy_response(
    determinant: &Image<f32, 1>,
    trace: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
) -> Result<(), ImageError> {
    if determinant.size() != trace.size() || trace.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            determinant.cols(),
            determinant.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows_val_two(determinant, trace, dst, |&det, &tr, dst| {
        *dst = safe_ratio(4.0 * det, tr * tr);
    });

    Ok(())
}

/// Collect a keypoint at every interior pixel where both fields are non-zero.
///
/// The keypoints are returned in row-major scan order. The one pixel border is never scanned.
///
/// PRECONDITION: `weight` and `isotropy` must have the same shape.
pub fn extract_keypoints(
    weight: &Image<f32, 1>,
    isotropy: &Image<f32, 1>,
    scale: f32,
) -> Result<Vec<KeyPoint>, ImageError> {
    if weight.size() != isotropy.size() {
        return Err(ImageError::InvalidImageSize(
            weight.cols(),
            weight.rows(),
            isotropy.cols(),
            isotropy.rows(),
        ));
    }

    let (rows, cols) = (weight.rows(), weight.cols());
    let (weight, isotropy) = (weight.as_slice(), isotropy.as_slice());

    let mut keypoints = vec![];
    for y in 1..rows.saturating_sub(1) {
        for x in 1..cols.saturating_sub(1) {
            let idx = y * cols + x;
            if weight[idx] != 0.0 && isotropy[idx] != 0.0 {
                keypoints.push(KeyPoint::new(x as u32, y as u32, scale));
            }
        }
    }

    Ok(keypoints)
}

/// Every intermediate field of one detection, mostly useful for visualization.
#[derive(Clone, Debug)]
pub struct FoerstnerResponses {
    /// Gradient from the row-direction kernel.
    pub gx: Image<f32, 1>,
    /// Gradient from the column-direction kernel.
    pub gy: Image<f32, 1>,
    /// The structure tensor fields.
    pub tensor: StructureTensor,
    /// Trace of the structure tensor.
    pub trace: Image<f32, 1>,
    /// Determinant of the structure tensor.
    pub determinant: Image<f32, 1>,
    /// Weight before suppression and thresholding.
    pub weight_raw: Image<f32, 1>,
    /// Isotropy before suppression and thresholding.
    pub isotropy_raw: Image<f32, 1>,
    /// The cutoff applied to the suppressed weight.
    pub weight_threshold: f32,
    /// Weight after suppression and thresholding.
    pub weight: Image<f32, 1>,
    /// Isotropy after suppression and thresholding.
    pub isotropy: Image<f32, 1>,
}

/// Förstner interest point detector.
///
/// # Examples
///
/// ```
/// use foerstner_image::Image;
/// use foerstner_imgproc::features::{FoerstnerConfig, FoerstnerDetector};
///
/// let detector = FoerstnerDetector::new(FoerstnerConfig::with_sigma(0.5)).unwrap();
///
/// let image = Image::<f32, 1>::from_size_val([16, 16].into(), 0.0).unwrap();
/// let keypoints = detector.detect(&image).unwrap();
///
/// assert!(keypoints.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct FoerstnerDetector {
    config: FoerstnerConfig,
    kernel: Kernel2d,
}

impl FoerstnerDetector {
    /// Create a detector, validating the configuration and building its kernel.
    pub fn new(config: FoerstnerConfig) -> Result<Self, FoerstnerError> {
        config.validate()?;
        let kernel = gaussian_derivative_kernel_2d(config.sigma, config.kernel_origin)?;
        log::debug!(
            "foerstner detector: sigma {}, kernel {}x{}",
            config.sigma,
            kernel.size(),
            kernel.size()
        );
        Ok(Self { config, kernel })
    }

    /// The detector configuration.
    pub fn config(&self) -> &FoerstnerConfig {
        &self.config
    }

    /// The row-direction derivative kernel.
    pub fn kernel(&self) -> &Kernel2d {
        &self.kernel
    }

    /// Run the pipeline and return every intermediate field.
    ///
    /// # Errors
    ///
    /// If any side of `src` is smaller than [`MIN_IMAGE_SIDE`].
    pub fn compute_responses(
        &self,
        src: &Image<f32, 1>,
    ) -> Result<FoerstnerResponses, FoerstnerError> {
        if src.cols() < MIN_IMAGE_SIDE || src.rows() < MIN_IMAGE_SIDE {
            return Err(FoerstnerError::InvalidInput(
                src.cols(),
                src.rows(),
                MIN_IMAGE_SIDE,
            ));
        }

        let padding = self.config.padding;

        let (gx, gy) = directional_gradients(src, &self.kernel, padding)?;
        let tensor = StructureTensor::from_gradients(&gx, &gy, padding)?;
        let trace = tensor.trace()?;
        let determinant = tensor.determinant()?;

        let mut weight_raw = Image::from_size_val(src.size(), 0.0)?;
        weight_response(&determinant, &trace, &mut weight_raw)?;

        let mut isotropy_raw = Image::from_size_val(src.size(), 0.0)?;
        isotropy_response(&determinant, &trace, &mut isotropy_raw)?;

        let mut weight_nms = Image::from_size_val(src.size(), 0.0)?;
        non_max_suppression_4(&weight_raw, &mut weight_nms)?;

        let mut isotropy_nms = Image::from_size_val(src.size(), 0.0)?;
        non_max_suppression_4(&isotropy_raw, &mut isotropy_nms)?;

        // the mean is taken after suppression
        let weight_threshold = (self.config.weight_mean_factor as f64 * mean(&weight_nms)) as f32;
        log::debug!("foerstner weight threshold: {weight_threshold}");

        let mut weight = Image::from_size_val(src.size(), 0.0)?;
        threshold_to_zero(&weight_nms, &mut weight, weight_threshold)?;

        let mut isotropy = Image::from_size_val(src.size(), 0.0)?;
        threshold_to_zero(&isotropy_nms, &mut isotropy, self.config.isotropy_threshold)?;

        Ok(FoerstnerResponses {
            gx,
            gy,
            tensor,
            trace,
            determinant,
            weight_raw,
            isotropy_raw,
            weight_threshold,
            weight,
            isotropy,
        })
    }

    /// Detect the interest points of a grayscale image.
    ///
    /// # Returns
    ///
    /// The keypoints in row-major scan order, possibly empty.
    pub fn detect(&self, src: &Image<f32, 1>) -> Result<Vec<KeyPoint>, FoerstnerError> {
        let responses = self.compute_responses(src)?;
        let keypoints = extract_keypoints(
            &responses.weight,
            &responses.isotropy,
            self.config.keypoint_scale,
        )?;
        log::debug!(
            "foerstner detected {} keypoints on a {}x{} image",
            keypoints.len(),
            src.cols(),
            src.rows()
        );
        Ok(keypoints)
    }
}

/// Detect Förstner interest points with the default configuration and the given sigma.
pub fn foerstner_keypoints(
    src: &Image<f32, 1>,
    sigma: f32,
) -> Result<Vec<KeyPoint>, FoerstnerError> {
    FoerstnerDetector::new(FoerstnerConfig::with_sigma(sigma))?.detect(src)
}
