use crate::config::DEFAULT_PARSING_SCALES;
use crate::loader::{check_buffer, resize_rgb};
use common::span;
use fast_image_resize::Resizer;
use image::RgbImage;
use ndarray::{Array, IxDyn};

/// One level of the test-time pyramid: the image at `scale` and its mirror,
/// stacked as a `[2, 3, height, width]` batch (original first).
#[derive(Debug)]
pub struct ScaledBatch {
    pub scale: f32,
    pub width: u32,
    pub height: u32,
    pub batch: Array<f32, IxDyn>,
}

/// Builds the multi-scale, flip-augmented inputs of the human-parsing network.
pub struct ParsingPreProcessor {
    scales: Vec<f32>,
    resizer: Resizer,
}

impl ParsingPreProcessor {
    pub fn new(scales: Vec<f32>) -> anyhow::Result<Self> {
        if scales.is_empty() {
            anyhow::bail!("At least one inference scale is required");
        }
        if let Some(bad) = scales.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            anyhow::bail!("Inference scales must be positive, got {}", bad);
        }
        Ok(Self {
            scales,
            resizer: Resizer::new(),
        })
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    pub fn preprocess_image(&mut self, img: &RgbImage) -> anyhow::Result<Vec<ScaledBatch>> {
        self.preprocess(img.as_raw(), img.width(), img.height())
    }

    pub fn preprocess(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<Vec<ScaledBatch>> {
        let _s = span!("parsing_preprocess");
        check_buffer(pixels, width, height)?;

        let mut batches = Vec::with_capacity(self.scales.len());
        for &scale in &self.scales {
            let (new_width, new_height) = scaled_size(width, height, scale);
            if new_width == 0 || new_height == 0 {
                anyhow::bail!(
                    "Scale {} shrinks the {}x{} image to nothing",
                    scale,
                    width,
                    height
                );
            }

            let resized = resize_rgb(&mut self.resizer, pixels, width, height, new_width, new_height)?;
            let batch = flip_batch(&resized, new_width as usize, new_height as usize)?;

            tracing::trace!(scale, new_width, new_height, "Built pyramid level");
            batches.push(ScaledBatch {
                scale,
                width: new_width,
                height: new_height,
                batch,
            });
        }

        Ok(batches)
    }
}

impl Default for ParsingPreProcessor {
    fn default() -> Self {
        Self {
            scales: DEFAULT_PARSING_SCALES.to_vec(),
            resizer: Resizer::new(),
        }
    }
}

/// Truncating scale, the way PIL sizes are computed from `int(w * s)`.
pub fn scaled_size(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (
        (width as f32 * scale) as u32,
        (height as f32 * scale) as u32,
    )
}

/// Maps a byte to `[-1, 1]`.
#[inline]
fn normalize_signed(v: u8) -> f32 {
    v as f32 * 2.0 / 255.0 - 1.0
}

fn flip_batch(pixels: &[u8], width: usize, height: usize) -> anyhow::Result<Array<f32, IxDyn>> {
    let spatial = width * height;
    let plane = 3 * spatial;
    let mut output = vec![0.0f32; 2 * plane];

    for (i, px) in pixels.chunks_exact(3).enumerate() {
        let y = i / width;
        let x = i % width;
        let mirrored = y * width + (width - 1 - x);
        for c in 0..3 {
            let v = normalize_signed(px[c]);
            output[c * spatial + i] = v;
            output[plane + c * spatial + mirrored] = v;
        }
    }

    Ok(Array::from_shape_vec(IxDyn(&[2, 3, height, width]), output)?)
}
