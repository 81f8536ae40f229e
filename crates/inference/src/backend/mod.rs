use crate::error::PipelineError;
use ndarray::{Array, ArrayD, IxDyn};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[cfg(feature = "ort-backend")]
pub mod ort;

/// Where the forward pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }

    /// Integer flag convention of the command line: any positive value means GPU.
    pub fn from_gpu_flag(use_gpu: i32) -> Self {
        if use_gpu > 0 { Device::Cuda } else { Device::Cpu }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda),
            other => Err(format!("unknown device `{other}`, expected `cpu` or `cuda`")),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a model is loaded and which tensors are fed and read back.
#[derive(Debug, Clone)]
pub struct BackendOptions {
    pub device: Device,
    pub input_name: String,
    pub output_name: String,
    pub intra_threads: usize,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            input_name: "input".to_string(),
            output_name: "output".to_string(),
            intra_threads: 4,
        }
    }
}

/// Fails unless `wanted` is one of the tensor names the model exposes.
pub(crate) fn check_tensor_name<'a>(
    kind: &'static str,
    wanted: &str,
    available: impl IntoIterator<Item = &'a str>,
) -> Result<(), PipelineError> {
    let available: Vec<String> = available.into_iter().map(str::to_string).collect();
    if available.iter().any(|name| name == wanted) {
        return Ok(());
    }
    Err(PipelineError::UnknownTensor {
        kind,
        name: wanted.to_string(),
        available,
    })
}

/// A pretrained network treated as a black box: one tensor in, one tensor out.
pub trait InferenceBackend {
    fn load_model(path: &Path, options: &BackendOptions) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run a forward pass. Inference only, no gradient state is kept.
    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>>;

    fn device(&self) -> Device;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_parsing() {
        assert_eq!("cpu".parse(), Ok(Device::Cpu));
        assert_eq!("CUDA".parse(), Ok(Device::Cuda));
        assert_eq!("gpu".parse(), Ok(Device::Cuda));
        assert!("tpu".parse::<Device>().is_err());
    }

    #[test]
    fn test_gpu_flag() {
        assert_eq!(Device::from_gpu_flag(1), Device::Cuda);
        assert_eq!(Device::from_gpu_flag(0), Device::Cpu);
        assert_eq!(Device::from_gpu_flag(-1), Device::Cpu);
    }

    #[test]
    fn test_tensor_name_check() {
        assert!(check_tensor_name("output", "logits", ["logits", "aux"]).is_ok());

        let err = check_tensor_name("output", "output", ["logits", "aux"]).unwrap_err();
        match err {
            PipelineError::UnknownTensor {
                kind,
                name,
                available,
            } => {
                assert_eq!(kind, "output");
                assert_eq!(name, "output");
                assert_eq!(available, vec!["logits", "aux"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(check_tensor_name("input", "input", std::iter::empty()).is_err());
    }
}
