use crate::backend::{BackendOptions, Device};
use crate::error::PipelineError;
use crate::registry::DEFAULT_SELECTORS;
use crate::source::ImageSource;
use clap::Parser;
use preprocess::DEFAULT_PARSING_SCALES;
use std::path::{Path, PathBuf};

pub use common::Environment;

/// Human parsing over one image or a list of images.
#[derive(Debug, Clone, Parser)]
#[command(name = "parse", version, about)]
pub struct ParseConfig {
    /// Exported parsing network (.onnx)
    #[arg(long = "loadmodel", env = "PARSE_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Where parsed_<name>.png and label_<name>.png are written
    #[arg(long, alias = "output_dir", env = "PARSE_OUTPUT_DIR", default_value = "demo_imgs")]
    pub output_dir: PathBuf,

    /// 1 runs on CUDA (fatal if unavailable), 0 on CPU
    #[arg(long, alias = "use_gpu", env = "USE_GPU", default_value_t = 1)]
    pub use_gpu: i32,

    /// Single image, takes precedence over --img-list
    #[arg(long, alias = "img_path")]
    pub img_path: Option<PathBuf>,

    /// Text file with one image per line
    #[arg(long, alias = "img_list")]
    pub img_list: Option<PathBuf>,

    /// Directory the --img-list entries are relative to
    #[arg(long, alias = "data_root")]
    pub data_root: Option<PathBuf>,

    /// Test-time pyramid, first scale is the output resolution
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_PARSING_SCALES.to_vec())]
    pub scales: Vec<f32>,

    #[arg(long, default_value = "input")]
    pub input_name: String,

    #[arg(long, default_value = "output")]
    pub output_name: String,

    /// OTLP collector, e.g. http://localhost:4317
    #[arg(long, env = "OTEL_ENDPOINT")]
    pub otel_endpoint: Option<String>,

    #[arg(skip = Environment::from_env())]
    pub environment: Environment,
}

impl ParseConfig {
    pub fn device(&self) -> Device {
        Device::from_gpu_flag(self.use_gpu)
    }

    pub fn model_path(&self) -> Result<&Path, PipelineError> {
        self.model_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(PipelineError::MissingModel)
    }

    pub fn source(&self) -> Result<ImageSource, PipelineError> {
        ImageSource::from_flags(
            self.img_path.as_deref(),
            self.img_list.as_deref(),
            self.data_root.as_deref(),
        )
    }

    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            device: self.device(),
            input_name: self.input_name.clone(),
            output_name: self.output_name.clone(),
            ..BackendOptions::default()
        }
    }
}

/// Top-1 accuracy and latency of ImageNet classifiers over a labeled directory.
#[derive(Debug, Clone, Parser)]
#[command(name = "classify", version, about)]
pub struct ClassifyConfig {
    /// Comma separated selectors; unknown ones are skipped
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_SELECTORS.map(String::from).to_vec())]
    pub models: Vec<String>,

    /// Directory holding <selector>.onnx exports
    #[arg(long, env = "CLASSIFY_MODEL_DIR", default_value = "models")]
    pub model_dir: PathBuf,

    /// Images named <class>_<anything>.{JPEG,jpg,png}
    #[arg(long, env = "CLASSIFY_IMG_DIR", default_value = "imagenet_test_1000")]
    pub img_dir: PathBuf,

    #[arg(long, env = "CLASSIFY_DEVICE", default_value = "cuda")]
    pub device: Device,

    /// Where time_<model>_<device>.txt logs go
    #[arg(long, default_value = ".")]
    pub log_dir: PathBuf,

    /// Stop after this many images per model
    #[arg(long)]
    pub limit: Option<usize>,

    /// Classes logged per image at debug level
    #[arg(long, default_value_t = 5)]
    pub top_k: usize,

    #[arg(long, default_value = "input")]
    pub input_name: String,

    #[arg(long, default_value = "output")]
    pub output_name: String,

    #[arg(long, env = "OTEL_ENDPOINT")]
    pub otel_endpoint: Option<String>,

    #[arg(skip = Environment::from_env())]
    pub environment: Environment,
}

impl ClassifyConfig {
    pub fn source(&self) -> ImageSource {
        ImageSource::Directory {
            dir: self.img_dir.clone(),
            limit: self.limit,
        }
    }

    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            device: self.device,
            input_name: self.input_name.clone(),
            output_name: self.output_name.clone(),
            ..BackendOptions::default()
        }
    }

    pub fn time_log_path(&self, selector: &str) -> PathBuf {
        self.log_dir
            .join(format!("time_{}_{}.txt", selector, self.device.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let config = ParseConfig::try_parse_from(["parse", "--loadmodel", "net.onnx"]).unwrap();
        assert_eq!(config.model_path().unwrap(), Path::new("net.onnx"));
        assert_eq!(config.device(), Device::Cuda);
        assert_eq!(config.scales, DEFAULT_PARSING_SCALES.to_vec());
        assert_eq!(config.output_dir, PathBuf::from("demo_imgs"));
    }

    #[test]
    fn test_parse_accepts_underscore_flags() {
        let config = ParseConfig::try_parse_from([
            "parse",
            "--loadmodel",
            "net.onnx",
            "--use_gpu",
            "0",
            "--img_list",
            "/lists/val.txt",
            "--data_root",
            "/data",
            "--scales",
            "1,0.5",
        ])
        .unwrap();
        assert_eq!(config.device(), Device::Cpu);
        assert_eq!(config.scales, vec![1.0, 0.5]);
        assert_eq!(
            config.source().unwrap(),
            ImageSource::List {
                list: PathBuf::from("/lists/val.txt"),
                data_root: PathBuf::from("/data"),
            }
        );
        assert_eq!(config.backend_options().device, Device::Cpu);
    }

    #[test]
    fn test_missing_model_is_reported() {
        let mut config = ParseConfig::try_parse_from(["parse"]).unwrap();
        assert!(matches!(config.model_path(), Err(PipelineError::MissingModel)));

        config.model_path = Some(PathBuf::new());
        assert!(matches!(config.model_path(), Err(PipelineError::MissingModel)));
    }

    #[test]
    fn test_classify_defaults() {
        let config = ClassifyConfig::try_parse_from(["classify"]).unwrap();
        assert_eq!(config.models, DEFAULT_SELECTORS.map(String::from).to_vec());
        assert_eq!(config.device, Device::Cuda);
        assert_eq!(
            config.time_log_path("resnet18"),
            PathBuf::from("./time_resnet18_cuda.txt")
        );
    }

    #[test]
    fn test_classify_device_and_models() {
        let config = ClassifyConfig::try_parse_from([
            "classify",
            "--device",
            "cpu",
            "--models",
            "resnet18,inception_v3",
            "--limit",
            "10",
        ])
        .unwrap();
        assert_eq!(config.device, Device::Cpu);
        assert_eq!(config.models, vec!["resnet18", "inception_v3"]);
        assert_eq!(
            config.source(),
            ImageSource::Directory {
                dir: PathBuf::from("imagenet_test_1000"),
                limit: Some(10),
            }
        );
        assert!(ClassifyConfig::try_parse_from(["classify", "--device", "tpu"]).is_err());
    }
}
