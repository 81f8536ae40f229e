use crate::{
    backend::InferenceBackend,
    metrics::RunMetrics,
    processing::{
        palette::{decode_labels, label_image},
        post::{MultiScaleAccumulator, argmax_labels, fuse_flipped},
    },
    source::{ImageSource, image_stem},
    timing::TimingLog,
};
use anyhow::Context;
use common::{span, span_debug};
use image::RgbImage;
use ndarray::Array2;
use preprocess::{ParsingPreProcessor, load_rgb};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Artifacts written for one input image.
#[derive(Debug, Clone)]
pub struct ParsedImage {
    pub parsed_path: PathBuf,
    pub label_path: PathBuf,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct ParsingSummary {
    pub outputs: Vec<ParsedImage>,
    pub failed: usize,
    pub total_elapsed: Duration,
    pub timing_log: PathBuf,
}

/// Multi-scale, flip-averaged human parsing over an image source.
pub struct ParsingService<B: InferenceBackend> {
    backend: B,
    preprocessor: ParsingPreProcessor,
    output_dir: PathBuf,
    metrics: RunMetrics,
}

impl<B: InferenceBackend> ParsingService<B> {
    pub fn new(backend: B, scales: Vec<f32>, output_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let preprocessor = ParsingPreProcessor::new(scales)?;
        let metrics = RunMetrics::new("parse", "human_parsing", backend.device().as_str());
        Ok(Self {
            backend,
            preprocessor,
            output_dir: output_dir.into(),
            metrics,
        })
    }

    /// Process every image of `source`. The backend is released when this
    /// returns, whether the run succeeded or not.
    pub fn run(mut self, source: &ImageSource) -> anyhow::Result<ParsingSummary> {
        let total_start = Instant::now();

        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;

        let images = source.images()?;
        tracing::info!(
            images = images.len(),
            scales = ?self.preprocessor.scales(),
            output_dir = %self.output_dir.display(),
            "Human parsing starting"
        );

        let mut timing = TimingLog::create(self.output_dir.join(format!(
            "time_parsing_{}.txt",
            self.backend.device().as_str()
        )))?;

        let mut outputs = Vec::with_capacity(images.len());
        let mut failed = 0usize;

        for path in &images {
            tracing::info!(image = %path.display(), "Processing image");
            match self.process_image(path) {
                Ok(parsed) => {
                    timing.record(&file_name(path), parsed.elapsed)?;
                    tracing::info!(
                        parsed = %parsed.parsed_path.display(),
                        label = %parsed.label_path.display(),
                        elapsed_s = parsed.elapsed.as_secs_f64(),
                        "Saved parsing result"
                    );
                    outputs.push(parsed);
                }
                Err(e) => {
                    failed += 1;
                    self.metrics.record_failure();
                    tracing::error!(image = %path.display(), error = %e, "Failed to parse image");
                }
            }
        }

        let timed = timing.entries();
        let timing_log = timing.finish()?;
        let total_elapsed = total_start.elapsed();
        tracing::info!(
            processed = outputs.len(),
            timed,
            failed,
            total_s = total_elapsed.as_secs_f64(),
            "Inference complete"
        );

        Ok(ParsingSummary {
            outputs,
            failed,
            total_elapsed,
            timing_log,
        })
    }

    fn process_image(&mut self, path: &Path) -> anyhow::Result<ParsedImage> {
        let start = Instant::now();
        let _s = span!("parse_image", image = %path.display());

        let img = load_rgb(path)?;
        let (labels, forward) = self.parse_image(&img)?;

        let stem = image_stem(path);
        let parsed_path = self.output_dir.join(format!("parsed_{stem}.png"));
        let label_path = self.output_dir.join(format!("label_{stem}.png"));

        decode_labels(&labels)
            .save(&parsed_path)
            .with_context(|| format!("Failed to save {}", parsed_path.display()))?;
        label_image(&labels)
            .save(&label_path)
            .with_context(|| format!("Failed to save {}", label_path.display()))?;

        self.metrics.record_success(forward.as_secs_f64());
        Ok(ParsedImage {
            parsed_path,
            label_path,
            elapsed: start.elapsed(),
        })
    }

    /// Label map of `img` at the resolution of the first pyramid scale,
    /// with the time spent in forward passes across all scales.
    pub fn parse_image(&mut self, img: &RgbImage) -> anyhow::Result<(Array2<u8>, Duration)> {
        let pyramid = self.preprocessor.preprocess_image(img)?;
        let reference = pyramid
            .first()
            .map(|level| (level.height as usize, level.width as usize))
            .context("Empty input pyramid")?;

        let mut accumulator = MultiScaleAccumulator::new(reference);
        let mut forward = Duration::ZERO;
        for level in &pyramid {
            let output = {
                let _s = span!("model_inference", scale = level.scale);
                let start = Instant::now();
                let output = self.backend.infer(&level.batch)?;
                forward += start.elapsed();
                output
            };

            let _s = span_debug!("fuse_scale");
            let fused = fuse_flipped(&output.view())?;
            accumulator.add(&fused.view())?;
        }

        tracing::debug!(
            scales = accumulator.scales_seen(),
            forward_ms = forward.as_secs_f64() * 1000.0,
            "Fused pyramid"
        );
        let logits = accumulator
            .finish()
            .context("No scale produced an output")?;
        Ok((argmax_labels(&logits.view()), forward))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
