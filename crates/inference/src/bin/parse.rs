use clap::Parser;
use inference::{
    ParseConfig, ParsingService,
    backend::{InferenceBackend, ort::OrtBackend},
    logging::setup_logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ParseConfig::parse();

    let _telemetry = setup_logging("parse", config.environment, config.otel_endpoint.as_deref())?;

    tracing::info!(config = ?config, "Loaded configuration");

    let model_path = config.model_path()?;
    let source = config.source()?;

    tracing::info!("Loading parsing model");
    let backend = OrtBackend::load_model(model_path, &config.backend_options())?;
    tracing::info!(model = %model_path.display(), "Model loaded successfully");

    let service = ParsingService::new(backend, config.scales.clone(), config.output_dir.clone())?;
    let summary = service.run(&source)?;

    tracing::info!(
        processed = summary.outputs.len(),
        failed = summary.failed,
        timing_log = %summary.timing_log.display(),
        "Parsing finished"
    );

    if summary.outputs.is_empty() && summary.failed > 0 {
        anyhow::bail!("None of the {} images could be parsed", summary.failed);
    }
    Ok(())
}
