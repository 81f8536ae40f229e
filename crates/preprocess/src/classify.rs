use crate::config::ClassifyTransform;
use crate::loader::{check_buffer, resize_rgb};
use common::span;
use fast_image_resize::Resizer;
use image::RgbImage;
use ndarray::{Array, IxDyn};

/// Turns an RGB image into the `[1, 3, crop, crop]` tensor an ImageNet
/// classifier expects.
pub struct ClassificationPreProcessor {
    pub transform: ClassifyTransform,
    resizer: Resizer,
}

impl ClassificationPreProcessor {
    pub fn new(transform: ClassifyTransform) -> Self {
        Self {
            transform,
            resizer: Resizer::new(),
        }
    }

    pub fn preprocess_image(&mut self, img: &RgbImage) -> anyhow::Result<Array<f32, IxDyn>> {
        self.preprocess(img.as_raw(), img.width(), img.height())
    }

    pub fn preprocess(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<Array<f32, IxDyn>> {
        let _s = span!("classify_preprocess");
        check_buffer(pixels, width, height)?;

        let (new_width, new_height) = shorter_side_size(width, height, self.transform.resize_size);
        let crop = self.transform.crop_size;
        if new_width < crop || new_height < crop {
            anyhow::bail!(
                "Resized image {}x{} is smaller than the {}x{} crop",
                new_width,
                new_height,
                crop,
                crop
            );
        }

        tracing::trace!(width, height, new_width, new_height, crop, "Resizing for classification");

        let resized = resize_rgb(&mut self.resizer, pixels, width, height, new_width, new_height)?;
        let (left, top) = center_crop_origin(new_width, new_height, crop);

        self.normalize_crop(&resized, new_width, left, top)
    }

    fn normalize_crop(
        &self,
        resized: &[u8],
        stride_px: u32,
        left: u32,
        top: u32,
    ) -> anyhow::Result<Array<f32, IxDyn>> {
        let crop = self.transform.crop_size as usize;
        let spatial = crop * crop;
        let ClassifyTransform { mean, std, .. } = self.transform;

        let mut output = vec![0.0f32; 3 * spatial];
        for y in 0..crop {
            let row_start = ((top as usize + y) * stride_px as usize + left as usize) * 3;
            let row = &resized[row_start..row_start + crop * 3];
            for (x, px) in row.chunks_exact(3).enumerate() {
                let i = y * crop + x;
                for c in 0..3 {
                    output[i + c * spatial] = (px[c] as f32 / 255.0 - mean[c]) / std[c];
                }
            }
        }

        Ok(Array::from_shape_vec(IxDyn(&[1, 3, crop, crop]), output)?)
    }
}

/// Output size when the shorter side is scaled to `size`, long side truncated.
pub fn shorter_side_size(width: u32, height: u32, size: u32) -> (u32, u32) {
    if width <= height {
        let long = (size as u64 * height as u64 / width as u64) as u32;
        (size, long)
    } else {
        let long = (size as u64 * width as u64 / height as u64) as u32;
        (long, size)
    }
}

// Half-pixel margins round to even.
fn center_crop_origin(width: u32, height: u32, crop: u32) -> (u32, u32) {
    let left = ((width - crop) as f32 / 2.0).round_ties_even() as u32;
    let top = ((height - crop) as f32 / 2.0).round_ties_even() as u32;
    (left, top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IMAGENET_MEAN, IMAGENET_STD};

    #[test]
    fn test_shorter_side_size_keeps_aspect() {
        assert_eq!(shorter_side_size(500, 375, 256), (341, 256));
        assert_eq!(shorter_side_size(375, 500, 256), (256, 341));
        assert_eq!(shorter_side_size(300, 300, 232), (232, 232));
    }

    #[test]
    fn test_center_crop_origin() {
        assert_eq!(center_crop_origin(341, 256, 224), (58, 16));
        assert_eq!(center_crop_origin(343, 256, 224), (60, 16));
        assert_eq!(center_crop_origin(224, 224, 224), (0, 0));
    }

    #[test]
    fn test_output_shape_matches_crop() {
        let mut pre = ClassificationPreProcessor::new(ClassifyTransform::imagenet(342, 299));
        let pixels = vec![90u8; 640 * 480 * 3];
        let out = pre.preprocess(&pixels, 640, 480).unwrap();
        assert_eq!(out.shape(), &[1, 3, 299, 299]);
    }

    #[test]
    fn test_imagenet_normalization() {
        let mut pre = ClassificationPreProcessor::new(ClassifyTransform::default());
        let pixels = vec![128u8; 300 * 300 * 3];
        let out = pre.preprocess(&pixels, 300, 300).unwrap();

        for c in 0..3 {
            let expected = (128.0 / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            let got = out[[0, c, 112, 112]];
            assert!(
                (got - expected).abs() < 0.02,
                "channel {c}: expected {expected}, got {got}"
            );
        }
    }

    #[test]
    fn test_channels_are_planar() {
        let mut pre = ClassificationPreProcessor::new(ClassifyTransform::imagenet(4, 4));
        let mut pixels = Vec::with_capacity(4 * 4 * 3);
        for _ in 0..16 {
            pixels.extend_from_slice(&[255, 0, 0]);
        }
        let out = pre.preprocess(&pixels, 4, 4).unwrap();

        let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let green = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        assert!((out[[0, 0, 2, 2]] - red).abs() < 1e-4);
        assert!((out[[0, 1, 2, 2]] - green).abs() < 1e-4);
    }

    #[test]
    fn test_buffer_size_mismatch_detection() {
        let mut pre = ClassificationPreProcessor::new(ClassifyTransform::default());
        let result = pre.preprocess(&[0u8; 200], 10, 10);
        assert!(result.unwrap_err().to_string().contains("mismatch"));
    }
}
