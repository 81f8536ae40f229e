use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No model provided")]
    MissingModel,

    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("GPU requested but unavailable: {0}")]
    GpuUnavailable(String),

    #[error("Model '{0}' is not supported")]
    UnsupportedModel(String),

    #[error("Unexpected tensor shape: expected {expected}, got {actual:?}")]
    ShapeMismatch {
        expected: &'static str,
        actual: Vec<usize>,
    },

    #[error("Model has no {kind} tensor named '{name}', available: {available:?}")]
    UnknownTensor {
        kind: &'static str,
        name: String,
        available: Vec<String>,
    },

    #[error("Invalid image source: {0}")]
    InvalidSource(String),

    #[error("No class label in file name: {0}")]
    InvalidLabel(String),
}

impl PipelineError {
    pub(crate) fn shape(expected: &'static str, actual: &[usize]) -> Self {
        PipelineError::ShapeMismatch {
            expected,
            actual: actual.to_vec(),
        }
    }
}
