pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Scales of the human-parsing test-time pyramid. The first one is the
/// reference resolution every other scale is resized back to.
pub const DEFAULT_PARSING_SCALES: [f32; 6] = [1.0, 0.5, 0.75, 1.25, 1.5, 1.75];

/// Evaluation transform of an ImageNet classifier: resize the shorter side,
/// center crop, then per-channel normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifyTransform {
    pub resize_size: u32,
    pub crop_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl ClassifyTransform {
    pub const fn imagenet(resize_size: u32, crop_size: u32) -> Self {
        Self {
            resize_size,
            crop_size,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }
}

impl Default for ClassifyTransform {
    fn default() -> Self {
        Self::imagenet(256, 224)
    }
}
