use serde::{Deserialize, Serialize};

use foerstner_image::ImageError;

use crate::error::FoerstnerError;

/// A square 2D convolution kernel with an odd side length, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel2d {
    size: usize,
    data: Vec<f32>,
}

impl Kernel2d {
    /// Create a kernel from its row-major coefficients.
    ///
    /// # Errors
    ///
    /// If `size` is even or zero, or `data` does not hold `size * size` coefficients.
    pub fn new(size: usize, data: Vec<f32>) -> Result<Self, ImageError> {
        if size % 2 == 0 || data.len() != size * size {
            return Err(ImageError::InvalidKernelLength(data.len(), size));
        }
        Ok(Self { size, data })
    }

    /// Side length of the kernel.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Distance from the kernel center to its border.
    pub fn half_size(&self) -> usize {
        self.size / 2
    }

    /// Row-major kernel coefficients.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Coefficient at the given kernel row and column.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.size || col >= self.size {
            return None;
        }
        Some(self.data[row * self.size + col])
    }

    /// Return the transposed kernel.
    pub fn transpose(&self) -> Self {
        let n = self.size;
        let data = (0..n * n)
            .map(|idx| {
                let (row, col) = (idx / n, idx % n);
                self.data[col * n + row]
            })
            .collect();
        Self { size: n, data }
    }

    /// Sum of all coefficients.
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }
}

/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A vector of the kernel, normalized to sum one.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = kernel_size.saturating_sub(1) as f32 / 2.0;
    let sigma_sq = sigma * sigma;

    // compute the kernel
    for i in 0..kernel_size {
        let x = i as f32 - mean;
        kernel.push((-(x * x) / (2.0 * sigma_sq)).exp());
    }

    // normalize the kernel
    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Create a square gaussian kernel as the outer product of two 1D gaussians.
pub fn gaussian_kernel_2d(kernel_size: usize, sigma: f32) -> Result<Kernel2d, ImageError> {
    let kernel_1d = gaussian_kernel_1d(kernel_size, sigma);
    let data = kernel_1d
        .iter()
        .flat_map(|&ki| kernel_1d.iter().map(move |&kj| ki * kj))
        .collect();
    Kernel2d::new(kernel_size, data)
}

/// Row that acts as the origin of the derivative term in [`gaussian_derivative_kernel_2d`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelOrigin {
    /// Row `i` is weighted by `-(i - 1) / sigma^2`.
    ///
    /// Only matches the kernel center for 3x3 kernels; larger kernels are off-center and
    /// respond to the local mean intensity as well as to its derivative.
    #[default]
    RowOne,

    /// Row `i` is weighted by `-(i - (k - 1) / 2) / sigma^2`, the textbook derivative of gaussian.
    Center,
}

impl KernelOrigin {
    fn row(&self, kernel_size: usize) -> f32 {
        match self {
            KernelOrigin::RowOne => 1.0,
            KernelOrigin::Center => ((kernel_size - 1) / 2) as f32,
        }
    }
}

/// Largest side length accepted for a derivative of gaussian kernel, reached at sigma 683.
pub const MAX_DERIVATIVE_KERNEL_SIZE: usize = 4097;

/// Side length of the derivative of gaussian kernel for the given sigma: `round(3 sigma) * 2 - 1`.
///
/// # Errors
///
/// If sigma is not a positive finite number or the resulting side length is smaller than one
/// or larger than [`MAX_DERIVATIVE_KERNEL_SIZE`].
///
/// # Examples
///
/// ```
/// use foerstner_imgproc::filter::kernels::gaussian_derivative_kernel_size;
///
/// assert_eq!(gaussian_derivative_kernel_size(1.0).unwrap(), 5);
/// assert_eq!(gaussian_derivative_kernel_size(0.5).unwrap(), 3);
/// assert!(gaussian_derivative_kernel_size(0.1).is_err());
/// ```
pub fn gaussian_derivative_kernel_size(sigma: f32) -> Result<usize, FoerstnerError> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FoerstnerError::InvalidParameter(format!(
            "sigma must be a positive finite number, got {sigma}"
        )));
    }

    // the float to int cast saturates, so only the arithmetic below can overflow
    let kernel_size = ((sigma * 3.0).round() as i64)
        .checked_mul(2)
        .and_then(|side| side.checked_sub(1))
        .filter(|side| (1..=MAX_DERIVATIVE_KERNEL_SIZE as i64).contains(side))
        .ok_or_else(|| {
            FoerstnerError::InvalidParameter(format!(
                "sigma {sigma} yields a kernel side outside [1, {MAX_DERIVATIVE_KERNEL_SIZE}]"
            ))
        })?;

    Ok(kernel_size as usize)
}

/// Create a first derivative of gaussian kernel along the row direction.
///
/// A square gaussian of side [`gaussian_derivative_kernel_size`] is built as the outer product of
/// two normalized 1D gaussians, then every entry of row `i` is multiplied by
/// `-(i - origin) / sigma^2`, where the origin row is selected by `origin`.
/// The column-direction kernel is the transpose.
///
/// # Arguments
///
/// * `sigma` - The standard deviation of the gaussian.
/// * `origin` - The row used as origin of the derivative term.
pub fn gaussian_derivative_kernel_2d(
    sigma: f32,
    origin: KernelOrigin,
) -> Result<Kernel2d, FoerstnerError> {
    let kernel_size = gaussian_derivative_kernel_size(sigma)?;
    let gaussian = gaussian_kernel_1d(kernel_size, sigma);

    let sigma_sq = sigma * sigma;
    let origin_row = origin.row(kernel_size);

    let mut data = Vec::with_capacity(kernel_size * kernel_size);
    for (i, &gi) in gaussian.iter().enumerate() {
        let factor = -(i as f32 - origin_row) / sigma_sq;
        for &gj in gaussian.iter() {
            data.push(factor * (gi * gj));
        }
    }

    Ok(Kernel2d::new(kernel_size, data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_kernel_1d() {
        let kernel = gaussian_kernel_1d(5, 0.5);

        let expected = [
            0.00026386508,
            0.10645077,
            0.78657067,
            0.10645077,
            0.00026386508,
        ];

        for (&k, &e) in kernel.iter().zip(expected.iter()) {
            assert_relative_eq!(k, e, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_gaussian_kernel_2d() -> Result<(), ImageError> {
        let kernel = gaussian_kernel_2d(3, 1.0)?;
        assert_eq!(kernel.size(), 3);
        assert_relative_eq!(kernel.sum(), 1.0, epsilon = 1e-6);
        assert_eq!(kernel.get(0, 1), kernel.get(1, 0));
        assert!(kernel.get(1, 1) > kernel.get(0, 0));
        Ok(())
    }

    #[test]
    fn test_kernel2d_invalid() {
        assert_eq!(
            Kernel2d::new(2, vec![0.0; 4]),
            Err(ImageError::InvalidKernelLength(4, 2))
        );
        assert_eq!(
            Kernel2d::new(3, vec![0.0; 8]),
            Err(ImageError::InvalidKernelLength(8, 3))
        );
    }

    #[test]
    fn test_kernel2d_transpose() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let kernel = Kernel2d::new(3, vec![
            1.0, 2.0, 3.0,
            4.0, 5.0, 6.0,
            7.0, 8.0, 9.0,
        ])?;

        #[rustfmt::skip]
        assert_eq!(kernel.transpose().as_slice(), &[
            1.0, 4.0, 7.0,
            2.0, 5.0, 8.0,
            3.0, 6.0, 9.0,
        ]);
        assert_eq!(kernel.transpose().transpose(), kernel);
        Ok(())
    }

    #[test]
    fn test_derivative_kernel_size() -> Result<(), FoerstnerError> {
        for (sigma, expected) in [(0.2, 1), (0.5, 3), (1.0, 5), (1.5, 9), (2.0, 11), (3.3, 19)] {
            let size = gaussian_derivative_kernel_size(sigma)?;
            assert_eq!(size, expected, "sigma {sigma}");
            assert_eq!(size % 2, 1);

            let kernel = gaussian_derivative_kernel_2d(sigma, KernelOrigin::RowOne)?;
            assert_eq!(kernel.size(), expected);
            assert_eq!(kernel.as_slice().len(), expected * expected);
        }
        assert_eq!(
            gaussian_derivative_kernel_size(683.0)?,
            MAX_DERIVATIVE_KERNEL_SIZE
        );
        Ok(())
    }

    #[test]
    fn test_derivative_kernel_invalid_sigma() {
        for sigma in [0.0, -1.0, 0.1, f32::NAN, f32::INFINITY, 684.0, 1.0e9, 1.0e19, f32::MAX] {
            assert!(matches!(
                gaussian_derivative_kernel_2d(sigma, KernelOrigin::RowOne),
                Err(FoerstnerError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_derivative_kernel_3x3() -> Result<(), FoerstnerError> {
        // both origins agree when the kernel is 3x3
        let row_one = gaussian_derivative_kernel_2d(0.5, KernelOrigin::RowOne)?;
        let center = gaussian_derivative_kernel_2d(0.5, KernelOrigin::Center)?;
        assert_eq!(row_one, center);

        // middle row is zero, first and last rows are opposite
        for col in 0..3 {
            assert_eq!(row_one.get(1, col), Some(0.0));
            let top = row_one.get(0, col).unwrap_or_default();
            let bottom = row_one.get(2, col).unwrap_or_default();
            assert!(top > 0.0);
            assert_relative_eq!(top, -bottom);
        }
        assert_relative_eq!(row_one.sum(), 0.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_derivative_kernel_row_one_offset() -> Result<(), FoerstnerError> {
        let sigma = 1.0;
        let kernel = gaussian_derivative_kernel_2d(sigma, KernelOrigin::RowOne)?;
        let gaussian = gaussian_kernel_2d(5, sigma)?;

        // row 1 is zeroed, rows below it are negative
        for col in 0..5 {
            assert_eq!(kernel.get(1, col), Some(0.0));
            for row in 0..5 {
                let g = gaussian.get(row, col).unwrap_or_default();
                let k = kernel.get(row, col).unwrap_or_default();
                assert_relative_eq!(k, -(row as f32 - 1.0) * g, max_relative = 1e-6);
            }
        }

        // the off-center factor adds minus the gaussian mass to the sum
        assert_relative_eq!(kernel.sum(), -1.0, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn test_derivative_kernel_center() -> Result<(), FoerstnerError> {
        let kernel = gaussian_derivative_kernel_2d(1.0, KernelOrigin::Center)?;
        for col in 0..5 {
            assert_eq!(kernel.get(2, col), Some(0.0));
            let top = kernel.get(0, col).unwrap_or_default();
            let bottom = kernel.get(4, col).unwrap_or_default();
            assert_relative_eq!(top, -bottom);
        }
        assert_relative_eq!(kernel.sum(), 0.0, epsilon = 1e-6);
        Ok(())
    }
}
