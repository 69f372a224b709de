use foerstner_image::{Image, ImageError};

use super::kernels::{self, Kernel2d};
use crate::{padding::PaddingMode, parallel};

/// Filter a single channel image with a square kernel.
///
/// The operation is a correlation (the kernel is not flipped) with the anchor at the kernel
/// center. Pixels outside the image are read according to `padding`, so the output has the
/// same size as the input.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W).
/// * `dst` - The destination image with shape (H, W).
/// * `kernel` - The square kernel with an odd side length.
/// * `padding` - The border extension policy.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
///
/// # Examples
///
/// ```
/// use foerstner_image::Image;
/// use foerstner_imgproc::filter::{filter2d, kernels::Kernel2d};
/// use foerstner_imgproc::padding::PaddingMode;
///
/// let src = Image::<f32, 1>::from_size_slice([3, 1].into(), &[1.0, 2.0, 3.0]).unwrap();
/// let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0).unwrap();
///
/// // pick the right neighbor
/// let kernel = Kernel2d::new(3, vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]).unwrap();
/// filter2d(&src, &mut dst, &kernel, PaddingMode::Replicate).unwrap();
///
/// assert_eq!(dst.as_slice(), &[2.0, 3.0, 3.0]);
/// ```
pub fn filter2d(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    kernel: &Kernel2d,
    padding: PaddingMode,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let (rows, cols) = (src.rows(), src.cols());
    let src_data = src.as_slice();
    let kernel_size = kernel.size();
    let kernel_data = kernel.as_slice();
    let half = kernel.half_size() as isize;

    parallel::par_iter_rows_indexed(dst, |row, col, dst_pixel| {
        let mut sum = 0.0f32;
        for (ky, kernel_row) in kernel_data.chunks_exact(kernel_size).enumerate() {
            let y = padding.map_index(row as isize + ky as isize - half, rows);
            let src_row = &src_data[y * cols..(y + 1) * cols];
            for (kx, &k) in kernel_row.iter().enumerate() {
                let x = padding.map_index(col as isize + kx as isize - half, cols);
                sum += src_row[x] * k;
            }
        }
        dst_pixel[0] = sum;
    });

    Ok(())
}

/// Blur an image using a square gaussian blur filter
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W).
/// * `dst` - The destination image with shape (H, W).
/// * `kernel_size` - The odd side length of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
/// * `padding` - The border extension policy.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn gaussian_blur(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    kernel_size: usize,
    sigma: f32,
    padding: PaddingMode,
) -> Result<(), ImageError> {
    let kernel = kernels::gaussian_kernel_2d(kernel_size, sigma)?;
    filter2d(src, dst, &kernel, padding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_filter2d_identity() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::new(
            [4, 3].into(),
            (0..12).map(|v| v as f32).collect(),
        )?;
        let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;

        let kernel = Kernel2d::new(1, vec![1.0])?;
        filter2d(&src, &mut dst, &kernel, PaddingMode::Reflect101)?;
        assert_eq!(dst.as_slice(), src.as_slice());

        Ok(())
    }

    #[test]
    fn test_filter2d_correlation_not_convolution() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let src = Image::<f32, 1>::from_size_slice(
            [3, 3].into(),
            &[
                0.0, 0.0, 0.0,
                0.0, 1.0, 0.0,
                0.0, 0.0, 0.0,
            ],
        )?;
        let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;

        #[rustfmt::skip]
        let kernel = Kernel2d::new(3, vec![
            1.0, 2.0, 3.0,
            4.0, 5.0, 6.0,
            7.0, 8.0, 9.0,
        ])?;
        filter2d(&src, &mut dst, &kernel, PaddingMode::Replicate)?;

        // an impulse reproduces the kernel rotated by 180 degrees
        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                9.0, 8.0, 7.0,
                6.0, 5.0, 4.0,
                3.0, 2.0, 1.0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_filter2d_border_modes() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::from_size_slice([3, 1].into(), &[1.0, 2.0, 4.0])?;
        let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;

        // sum of the horizontal 3-neighborhood
        #[rustfmt::skip]
        let kernel = Kernel2d::new(3, vec![
            0.0, 0.0, 0.0,
            1.0, 1.0, 1.0,
            0.0, 0.0, 0.0,
        ])?;

        filter2d(&src, &mut dst, &kernel, PaddingMode::Replicate)?;
        assert_eq!(dst.as_slice(), &[4.0, 7.0, 10.0]);

        filter2d(&src, &mut dst, &kernel, PaddingMode::Reflect101)?;
        assert_eq!(dst.as_slice(), &[5.0, 7.0, 8.0]);

        Ok(())
    }

    #[test]
    fn test_filter2d_size_mismatch() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::from_size_val([3, 3].into(), 0.0)?;
        let mut dst = Image::<f32, 1>::from_size_val([4, 3].into(), 0.0)?;
        let kernel = Kernel2d::new(1, vec![1.0])?;
        assert_eq!(
            filter2d(&src, &mut dst, &kernel, PaddingMode::Reflect101),
            Err(ImageError::InvalidImageSize(3, 3, 4, 3))
        );
        Ok(())
    }

    #[test]
    fn test_gaussian_blur_constant() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::from_size_val([5, 4].into(), 2.0)?;
        let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
        gaussian_blur(&src, &mut dst, 3, 1.0, PaddingMode::Reflect101)?;
        for &v in dst.as_slice() {
            assert_relative_eq!(v, 2.0, epsilon = 1e-5);
        }
        Ok(())
    }
}
