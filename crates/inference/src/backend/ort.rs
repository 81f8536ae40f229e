use super::{BackendOptions, Device, InferenceBackend, check_tensor_name};
use crate::error::PipelineError;
use ndarray::{Array, ArrayD, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use std::path::Path;

/// ONNX Runtime session bound to one exported model file.
pub struct OrtBackend {
    session: Session,
    device: Device,
    input_name: String,
    output_name: String,
}

impl InferenceBackend for OrtBackend {
    fn load_model(path: &Path, options: &BackendOptions) -> anyhow::Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::ModelNotFound(path.to_path_buf()).into());
        }

        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(options.intra_threads)?;

        match options.device {
            Device::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                // Fail here rather than fall back to the CPU provider.
                builder = builder
                    .with_execution_providers([
                        ort::execution_providers::CUDAExecutionProvider::default()
                            .with_device_id(0)
                            .build()
                            .error_on_failure(),
                    ])
                    .map_err(|e| PipelineError::GpuUnavailable(e.to_string()))?;
            }
            Device::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder.commit_from_file(path)?;
        check_tensor_name(
            "input",
            &options.input_name,
            session.inputs().iter().map(|o| o.name()),
        )?;
        check_tensor_name(
            "output",
            &options.output_name,
            session.outputs().iter().map(|o| o.name()),
        )?;

        tracing::info!(path = %path.display(), device = %options.device, "Model loaded");
        Ok(Self {
            session,
            device: options.device,
            input_name: options.input_name.clone(),
            output_name: options.output_name.clone(),
        })
    }

    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>> {
        let outputs = self.session.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(input.view())?
        ])?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| PipelineError::UnknownTensor {
                kind: "output",
                name: self.output_name.clone(),
                available: Vec::new(),
            })?
            .try_extract_array::<f32>()?;
        Ok(output.into_owned())
    }

    fn device(&self) -> Device {
        self.device
    }
}

impl Drop for OrtBackend {
    fn drop(&mut self) {
        tracing::info!(device = %self.device, "Inference session and device memory released");
    }
}
