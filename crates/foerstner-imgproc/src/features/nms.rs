use foerstner_image::{Image, ImageError};

use crate::parallel;

/// Suppress every interior pixel that is not a strict maximum of its 4-neighborhood.
///
/// A pixel is set to zero when any of its up, down, left or right neighbors in `src` is
/// greater than or equal to it, so ties are suppressed. Comparisons always read the
/// unmodified `src`. The outermost one pixel border is copied from `src` unchanged.
///
/// # Arguments
///
/// * `src` - The source response with shape (H, W).
/// * `dst` - The destination response with shape (H, W).
///
/// PRECONDITION: `src` and `dst` must have the same shape.
///
/// # Examples
///
/// ```
/// use foerstner_image::Image;
/// use foerstner_imgproc::features::non_max_suppression_4;
///
/// let src = Image::<f32, 1>::new(
///     [3, 3].into(),
///     vec![0.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 0.0],
/// )
/// .unwrap();
/// let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0).unwrap();
///
/// non_max_suppression_4(&src, &mut dst).unwrap();
/// assert_eq!(dst.as_slice(), src.as_slice());
/// ```
pub fn non_max_suppression_4(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
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

    parallel::par_iter_rows_indexed(dst, |row, col, dst_pixel| {
        let current_idx = row * cols + col;
        let value = src_data[current_idx];

        if row == 0 || row + 1 >= rows || col == 0 || col + 1 >= cols {
            // the border is passed through
            dst_pixel[0] = value;
            return;
        }

        let is_suppressed = src_data[current_idx - cols] >= value
            || src_data[current_idx - 1] >= value
            || src_data[current_idx + 1] >= value
            || src_data[current_idx + cols] >= value;

        dst_pixel[0] = if is_suppressed { 0.0 } else { value };
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nms_single_maximum() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let src = Image::<f32, 1>::from_size_slice(
            [5, 5].into(),
            &[
                9.0, 9.0, 9.0, 9.0, 9.0,
                9.0, 0.1, 0.2, 0.1, 9.0,
                9.0, 0.2, 0.7, 0.3, 9.0,
                9.0, 0.1, 0.4, 0.1, 9.0,
                9.0, 9.0, 9.0, 9.0, 9.0,
            ],
        )?;
        let mut dst = Image::<f32, 1>::from_size_val(src.size(), -1.0)?;

        non_max_suppression_4(&src, &mut dst)?;

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                9.0, 9.0, 9.0, 9.0, 9.0,
                9.0, 0.0, 0.0, 0.0, 9.0,
                9.0, 0.0, 0.7, 0.0, 9.0,
                9.0, 0.0, 0.0, 0.0, 9.0,
                9.0, 9.0, 9.0, 9.0, 9.0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_nms_ties_are_suppressed() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let src = Image::<f32, 1>::from_size_slice(
            [4, 3].into(),
            &[
                0.0, 0.0, 0.0, 0.0,
                0.0, 5.0, 5.0, 0.0,
                0.0, 0.0, 0.0, 0.0,
            ],
        )?;
        let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;

        non_max_suppression_4(&src, &mut dst)?;
        assert!(dst.as_slice().iter().all(|&v| v == 0.0));

        Ok(())
    }

    #[test]
    fn test_nms_reads_unmodified_source() -> Result<(), ImageError> {
        // a descending ramp: a pixel is only beaten by its left neighbor, so an in-place
        // pass would let the suppressed left neighbor expose the next pixel as a maximum
        #[rustfmt::skip]
        let src = Image::<f32, 1>::from_size_slice(
            [5, 3].into(),
            &[
                0.0, 0.0, 0.0, 0.0, 0.0,
                9.0, 8.0, 7.0, 6.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
            ],
        )?;
        let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;

        non_max_suppression_4(&src, &mut dst)?;

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                0.0, 0.0, 0.0, 0.0, 0.0,
                9.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_nms_border_passthrough() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::new([4, 4].into(), (0..16).map(|v| v as f32).collect())?;
        let mut dst = Image::<f32, 1>::from_size_val(src.size(), -1.0)?;

        non_max_suppression_4(&src, &mut dst)?;

        for row in 0..4 {
            for col in 0..4 {
                let on_border = row == 0 || row == 3 || col == 0 || col == 3;
                let expected = if on_border { src.get_pixel(col, row, 0)? } else { 0.0 };
                assert_eq!(dst.get_pixel(col, row, 0)?, expected);
            }
        }

        Ok(())
    }

    #[test]
    fn test_nms_size_mismatch() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::from_size_val([3, 3].into(), 0.0)?;
        let mut dst = Image::<f32, 1>::from_size_val([3, 4].into(), 0.0)?;
        assert!(non_max_suppression_4(&src, &mut dst).is_err());
        Ok(())
    }
}
