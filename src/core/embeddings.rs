use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::Array1;
use tch::{CModule, Device, Tensor};

use crate::error::{AppError, Result};

/// Side length of the square input the vision encoder expects.
const INPUT_SIZE: u32 = 224;

/// Per-channel normalization constants published with the CLIP preprocessor.
const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Produces a fixed-length, unit-normalized embedding for a decoded image.
///
/// This is the seam between the request pipeline and the pretrained model:
/// handlers only see the trait, so tests can substitute a stub encoder and
/// the real model stays an explicitly constructed, injected service.
pub trait ImageEncoder: Send + Sync {
    /// Embed a single image into a unit-length feature vector.
    fn embed(&self, image: &DynamicImage) -> Result<Array1<f32>>;
}

/// CLIP visual encoder loaded from a TorchScript export.
///
/// The module is loaded once at startup onto CUDA when available (CPU
/// otherwise) and shared read-only across requests. Inference runs in eval
/// mode with gradient tracking disabled.
pub struct ClipEncoder {
    module: CModule,
    device: Device,
}

impl ClipEncoder {
    /// Load the TorchScript visual encoder from `path`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is missing or is not a
    /// loadable TorchScript module.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let device = Device::cuda_if_available();

        let mut module = CModule::load_on_device(path, device).map_err(|e| {
            AppError::Config(format!(
                "failed to load vision model from {}: {}",
                path.display(),
                e
            ))
        })?;
        module.set_eval();

        log::info!("loaded vision model {} on {:?}", path.display(), device);
        Ok(Self { module, device })
    }
}

impl ImageEncoder for ClipEncoder {
    fn embed(&self, image: &DynamicImage) -> Result<Array1<f32>> {
        let input = preprocess(image).to_device(self.device);

        let features = tch::no_grad(|| self.module.forward_ts(&[&input]))?;
        let features = features.flatten(0, -1).to_device(Device::Cpu);
        let features = Vec::<f32>::try_from(&features)?;

        // The matching service assumes cosine-comparable unit vectors.
        Ok(l2_normalize(Array1::from(features)))
    }
}

/// Prepare an image for the encoder: shortest-side resize to 224, center
/// crop to 224x224, scale to [0, 1], then per-channel mean/std normalize.
/// Returns a `[1, 3, 224, 224]` float tensor on the CPU.
pub(crate) fn preprocess(image: &DynamicImage) -> Tensor {
    let (width, height) = image.dimensions();
    let scale = INPUT_SIZE as f32 / width.min(height).max(1) as f32;
    let scaled_w = ((width as f32 * scale).round() as u32).max(INPUT_SIZE);
    let scaled_h = ((height as f32 * scale).round() as u32).max(INPUT_SIZE);

    let resized = image.resize_exact(scaled_w, scaled_h, FilterType::CatmullRom);
    let left = (scaled_w - INPUT_SIZE) / 2;
    let top = (scaled_h - INPUT_SIZE) / 2;
    let cropped = resized.crop_imm(left, top, INPUT_SIZE, INPUT_SIZE).to_rgb8();

    let mut data = Vec::with_capacity((INPUT_SIZE * INPUT_SIZE * 3) as usize);
    for pixel in cropped.pixels() {
        data.push(pixel[0] as f32 / 255.0);
        data.push(pixel[1] as f32 / 255.0);
        data.push(pixel[2] as f32 / 255.0);
    }

    // HWC buffer, permuted to the CHW layout the model expects.
    let tensor = Tensor::of_slice(&data)
        .reshape(&[INPUT_SIZE as i64, INPUT_SIZE as i64, 3])
        .permute(&[2, 0, 1]);

    let mean = Tensor::of_slice(&CLIP_MEAN).view([3, 1, 1]);
    let std = Tensor::of_slice(&CLIP_STD).view([3, 1, 1]);

    ((tensor - mean) / std).unsqueeze(0)
}

/// Scale a vector to unit Euclidean length. A zero vector is returned
/// unchanged rather than dividing by zero.
pub fn l2_normalize(v: Array1<f32>) -> Array1<f32> {
    let norm = v.dot(&v).sqrt();
    if norm > 0.0 {
        v / norm
    } else {
        v
    }
}
