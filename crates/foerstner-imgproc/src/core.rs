use foerstner_image::Image;

/// Compute the mean of all the samples of an image.
///
/// The samples are accumulated serially in double precision so the result does not depend
/// on the number of threads. An empty image has a mean of zero.
///
/// # Example
///
/// ```
/// use foerstner_image::Image;
/// use foerstner_imgproc::core::mean;
///
/// let image = Image::<f32, 1>::new([2, 2].into(), vec![0.0, 1.0, 2.0, 5.0]).unwrap();
///
/// assert_eq!(mean(&image), 2.0);
/// ```
pub fn mean<const C: usize>(image: &Image<f32, C>) -> f64 {
    let data = image.as_slice();
    if data.is_empty() {
        return 0.0;
    }
    let sum = data.iter().map(|&v| v as f64).sum::<f64>();
    sum / data.len() as f64
}
