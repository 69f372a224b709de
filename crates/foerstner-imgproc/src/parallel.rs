use rayon::prelude::*;

use foerstner_image::Image;

/// Apply a function to each pixel value in the image in parallel by rows.
///
/// PRECONDITION: `src` and `dst` must have the same size.
pub fn par_iter_rows_val<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&T1, &mut T2) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    if src.cols() == 0 {
        return;
    }

    src.as_slice()
        .par_chunks_exact(C1 * src.cols())
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * src.cols()))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .iter()
                .zip(dst_chunk.iter_mut())
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each pair of pixel values of two images in parallel by rows.
///
/// PRECONDITION: `src1`, `src2` and `dst` must have the same size.
pub fn par_iter_rows_val_two<T1, const C1: usize, T2, const C2: usize, T3, const C3: usize>(
    src1: &Image<T1, C1>,
    src2: &Image<T2, C2>,
    dst: &mut Image<T3, C3>,
    f: impl Fn(&T1, &T2, &mut T3) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
    T3: Send + Sync,
{
    if src1.cols() == 0 {
        return;
    }

    src1.as_slice()
        .par_chunks_exact(C1 * src1.cols())
        .zip(src2.as_slice().par_chunks_exact(C2 * src1.cols()))
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C3 * src1.cols()))
        .for_each(|((src1_chunk, src2_chunk), dst_chunk)| {
            src1_chunk
                .iter()
                .zip(src2_chunk.iter())
                .zip(dst_chunk.iter_mut())
                .for_each(|((src1_pixel, src2_pixel), dst_pixel)| {
                    f(src1_pixel, src2_pixel, dst_pixel);
                });
        });
}

/// Fill each destination pixel in parallel by rows from its (row, col) position.
///
/// The closure must only read from data that is not `dst`, which makes neighborhood
/// operations safe to run out of order.
pub fn par_iter_rows_indexed<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, usize, &mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let cols = dst.cols();
    if cols == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .enumerate()
        .for_each(|(row, dst_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .enumerate()
                .for_each(|(col, dst_pixel)| {
                    f(row, col, dst_pixel);
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use foerstner_image::ImageError;

    #[test]
    fn test_par_iter_rows_val_two() -> Result<(), ImageError> {
        let a = Image::<f32, 1>::from_size_slice([3, 2].into(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        let b = Image::<f32, 1>::from_size_val([3, 2].into(), 2.0)?;
        let mut dst = Image::<f32, 1>::from_size_val([3, 2].into(), 0.0)?;

        par_iter_rows_val_two(&a, &b, &mut dst, |a, b, d| *d = a * b);
        assert_eq!(dst.as_slice(), &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);

        Ok(())
    }

    #[test]
    fn test_par_iter_rows_indexed() -> Result<(), ImageError> {
        let mut dst = Image::<usize, 1>::from_size_val([4, 3].into(), 0)?;
        par_iter_rows_indexed(&mut dst, |row, col, px| px[0] = row * 10 + col);

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                0, 1, 2, 3,
                10, 11, 12, 13,
                20, 21, 22, 23,
            ]
        );

        Ok(())
    }
}
