pub mod classify;
pub mod config;
pub mod loader;
pub mod parsing;

pub use classify::ClassificationPreProcessor;
pub use config::{ClassifyTransform, DEFAULT_PARSING_SCALES, IMAGENET_MEAN, IMAGENET_STD};
pub use loader::load_rgb;
pub use parsing::{ParsingPreProcessor, ScaledBatch};
