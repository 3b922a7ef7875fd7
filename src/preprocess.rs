use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;
use rayon::prelude::*;
use tracing::trace;

use crate::error::{Error, Result};

pub const DEFAULT_INPUT_SIZE: u32 = 224;

#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    /// Side of the square model input, in pixels.
    pub input_size: u32,
    pub mean: f32,
    pub std: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            mean: 128.0,
            std: 128.0,
        }
    }
}

impl PreprocessConfig {
    pub fn with_input_size(input_size: u32) -> Self {
        Self {
            input_size,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Processor {
    pub config: PreprocessConfig,
}

impl Processor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn input_size(&self) -> u32 {
        self.config.input_size
    }

    /// Squashes the image to `input_size` x `input_size` and normalizes it.
    ///
    /// Returns an NHWC tensor of shape `[1, N, N, 3]`; its flat order is
    /// red, green, blue for each pixel, row by row.
    pub fn preprocess(&self, image: &DynamicImage) -> Result<Array4<f32>> {
        let side = self.config.input_size as usize;
        let values = self.to_flat(image)?;
        Ok(Array4::from_shape_vec((1, side, side, 3), values)?)
    }

    /// Preprocesses every image in parallel and stacks them along the batch axis.
    pub fn preprocess_batch(&self, images: &[DynamicImage]) -> Result<Array4<f32>> {
        if images.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let side = self.config.input_size as usize;
        let per_image = images
            .par_iter()
            .map(|image| self.to_flat(image))
            .collect::<Result<Vec<_>>>()?;
        let values: Vec<f32> = per_image.into_iter().flatten().collect();
        Ok(Array4::from_shape_vec((images.len(), side, side, 3), values)?)
    }

    /// The flat `3 * N * N` buffer for a single image.
    pub fn to_flat(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let resized = self.resize(image)?;
        let (mean, std) = (self.config.mean, self.config.std);
        Ok(resized
            .buffer()
            .iter()
            .map(|&byte| (byte as f32 - mean) / std)
            .collect())
    }

    /// Exact resize with nearest-neighbour sampling; aspect ratio is not kept.
    fn resize(&self, image: &DynamicImage) -> Result<Image<'static>> {
        let side = self.config.input_size;
        let (width, height) = image.dimensions();
        if side == 0 || width == 0 || height == 0 {
            return Err(Error::Resize(format!(
                "cannot resize {width}x{height} image to {side}x{side}"
            )));
        }

        let t = std::time::Instant::now();
        let src = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut dst = Image::new(side, side, PixelType::U8x3);
        let options = ResizeOptions::new().resize_alg(ResizeAlg::Nearest);
        Resizer::new()
            .resize(&src, &mut dst, &options)
            .map_err(|e| Error::Resize(e.to_string()))?;
        trace!(width, height, side, elapsed = ?t.elapsed(), "resized");
        Ok(dst)
    }
}
