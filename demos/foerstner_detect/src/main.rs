use argh::FromArgs;
use std::path::{Path, PathBuf};

use foerstner::{
    image::Image,
    imgproc::{
        features::{FoerstnerConfig, FoerstnerDetector, FoerstnerResponses},
        filter::kernels::KernelOrigin,
        normalize::normalize_min_max_u8,
    },
};

/// Detect Förstner interest points on an image.
#[derive(FromArgs)]
struct Args {
    /// path to the image to detect the interest points on
    #[argh(option)]
    image_path: PathBuf,

    /// path to a json file with the detector configuration
    #[argh(option)]
    config: Option<PathBuf>,

    /// standard deviation of the derivative of gaussian kernel, overrides the config file
    #[argh(option)]
    sigma: Option<f32>,

    /// center the derivative term of the kernel instead of anchoring it at row one
    #[argh(switch)]
    centered: bool,

    /// directory where the gradient, tensor, weight and isotropy responses are written as png files
    #[argh(option)]
    output_dir: Option<PathBuf>,
}

fn write_response(
    response: &Image<f32, 1>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let response_u8 = normalize_min_max_u8(response)?;
    let (width, height) = (response_u8.width() as u32, response_u8.height() as u32);
    let buffer = image::GrayImage::from_raw(width, height, response_u8.into_vec())
        .ok_or("response buffer does not match its size")?;
    buffer.save(path)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Named response fields written to the output directory.
fn response_outputs(responses: &FoerstnerResponses) -> [(&'static str, &Image<f32, 1>); 9] {
    [
        ("gradient_x", &responses.gx),
        ("gradient_y", &responses.gy),
        ("gradient_xy", &responses.tensor.gxy),
        ("structure_tensor", &responses.trace),
        ("determinant", &responses.determinant),
        ("weight_raw", &responses.weight_raw),
        ("isotropy_raw", &responses.isotropy_raw),
        // suppressed and thresholded
        ("weight", &responses.weight),
        ("isotropy", &responses.isotropy),
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => FoerstnerConfig::default(),
    };
    if let Some(sigma) = args.sigma {
        config.sigma = sigma;
    }
    if args.centered {
        config.kernel_origin = KernelOrigin::Center;
    }
    log::info!("detector config: {config:?}");

    // read the image as grayscale in [0, 1]
    let img_gray8 = image::open(&args.image_path)?.to_luma8();
    let (width, height) = img_gray8.dimensions();
    let img_gray8 = Image::<u8, 1>::new(
        [width as usize, height as usize].into(),
        img_gray8.into_raw(),
    )?;
    let img_gray_f32 = img_gray8.cast_and_scale::<f32>(1.0 / 255.0)?;

    let detector = FoerstnerDetector::new(config)?;
    let responses = detector.compute_responses(&img_gray_f32)?;
    let keypoints = foerstner::imgproc::features::extract_keypoints(
        &responses.weight,
        &responses.isotropy,
        detector.config().keypoint_scale,
    )?;

    println!("Found {} keypoints", keypoints.len());
    for keypoint in &keypoints {
        println!("{} {} {}", keypoint.x, keypoint.y, keypoint.scale);
    }

    if let Some(output_dir) = &args.output_dir {
        std::fs::create_dir_all(output_dir)?;
        for (name, response) in response_outputs(&responses) {
            write_response(response, &output_dir.join(format!("{name}.png")))?;
        }
    }

    Ok(())
}
