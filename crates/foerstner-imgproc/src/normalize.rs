use foerstner_image::{Image, ImageError};

use crate::parallel;

/// Find the minimum and maximum values in an image.
///
/// Non finite samples are ignored. An image without finite samples yields `(0.0, 0.0)`.
pub fn find_min_max<const C: usize>(image: &Image<f32, C>) -> (f32, f32) {
    let (min, max) = image
        .as_slice()
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        });

    if min > max {
        return (0.0, 0.0);
    }
    (min, max)
}

/// Normalize an image linearly so that its values span `[min, max]`.
///
/// A constant image maps to `min`. Non finite samples map to `min` as well.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `dst` - The output image.
/// * `min` - The value the minimum of `src` maps to.
/// * `max` - The value the maximum of `src` maps to.
///
/// # Examples
///
/// ```
/// use foerstner_image::Image;
/// use foerstner_imgproc::normalize::normalize_min_max;
///
/// let image = Image::<f32, 1>::new([3, 1].into(), vec![-1.0, 0.0, 3.0]).unwrap();
/// let mut normalized = Image::<f32, 1>::from_size_val(image.size(), 0.0).unwrap();
///
/// normalize_min_max(&image, &mut normalized, 0.0, 1.0).unwrap();
/// assert_eq!(normalized.as_slice(), &[0.0, 0.25, 1.0]);
/// ```
pub fn normalize_min_max<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    min: f32,
    max: f32,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let (min_val, max_val) = find_min_max(src);
    let range = max_val - min_val;

    parallel::par_iter_rows_val(src, dst, |&src_val, dst_val| {
        *dst_val = if range > 0.0 && src_val.is_finite() {
            (src_val - min_val) * (max - min) / range + min
        } else {
            min
        };
    });

    Ok(())
}

/// Stretch an image to the `[0, 255]` range and round it to 8 bits for display or export.
///
/// # Examples
///
/// ```
/// use foerstner_image::Image;
/// use foerstner_imgproc::normalize::normalize_min_max_u8;
///
/// let image = Image::<f32, 1>::new([3, 1].into(), vec![0.0, 0.5, 2.0]).unwrap();
/// let image_u8 = normalize_min_max_u8(&image).unwrap();
///
/// assert_eq!(image_u8.as_slice(), &[0, 64, 255]);
/// ```
pub fn normalize_min_max_u8<const C: usize>(
    src: &Image<f32, C>,
) -> Result<Image<u8, C>, ImageError> {
    let mut normalized = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    normalize_min_max(src, &mut normalized, 0.0, 255.0)?;

    let mut dst = Image::<u8, C>::from_size_val(src.size(), 0)?;
    parallel::par_iter_rows_val(&normalized, &mut dst, |&src_val, dst_val| {
        *dst_val = src_val.round().clamp(0.0, 255.0) as u8;
    });

    Ok(dst)
}
