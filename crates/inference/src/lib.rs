pub mod accuracy;
pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod processing;
pub mod registry;
pub mod service;
pub mod source;
pub mod timing;

// Re-export commonly used types for convenience
pub use backend::{BackendOptions, Device, InferenceBackend};
pub use config::{ClassifyConfig, ParseConfig};
pub use error::PipelineError;
pub use registry::ClassifierModel;
pub use service::{ClassificationService, ParsingService};
pub use source::ImageSource;
