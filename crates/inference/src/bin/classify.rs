use anyhow::Context;
use clap::Parser;
use inference::{
    ClassificationService, ClassifyConfig,
    backend::{InferenceBackend, ort::OrtBackend},
    logging::setup_logging,
    registry::resolve_selectors,
};
use std::fs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClassifyConfig::parse();

    let _telemetry =
        setup_logging("classify", config.environment, config.otel_endpoint.as_deref())?;

    tracing::info!(config = ?config, "Loaded configuration");

    let models = resolve_selectors(&config.models);
    if models.is_empty() {
        anyhow::bail!("None of the requested models is supported: {:?}", config.models);
    }

    let images = config.source().images()?;
    tracing::info!(images = images.len(), dir = %config.img_dir.display(), "Collected images");

    fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create {}", config.log_dir.display()))?;

    for model in models {
        let model_path = model.model_path(&config.model_dir);
        tracing::info!(model = %model, path = %model_path.display(), "Loading classifier");
        let backend = OrtBackend::load_model(&model_path, &config.backend_options())
            .with_context(|| format!("Failed to load {model}"))?;

        let service = ClassificationService::new(backend, model, config.top_k);
        let summary = service.run(&images, &config.time_log_path(model.selector()))?;
        summary.log();
    }

    Ok(())
}
