use crate::{
    accuracy::{Accuracy, true_label_from_filename},
    backend::InferenceBackend,
    metrics::RunMetrics,
    processing::post::{softmax_top_k, top1},
    registry::ClassifierModel,
    timing::TimingLog,
};
use common::span;
use image::RgbImage;
use preprocess::{ClassificationPreProcessor, load_rgb};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// One image's prediction and the duration of its forward pass alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class: usize,
    pub forward: Duration,
}

#[derive(Debug)]
pub struct ClassificationSummary {
    pub model: ClassifierModel,
    pub accuracy: Accuracy,
    pub processed: usize,
    pub failed: usize,
    /// Timed images whose file name carries no class.
    pub unlabeled: usize,
    pub timing_log: PathBuf,
}

impl ClassificationSummary {
    pub fn log(&self) {
        match self.accuracy.percent() {
            Some(percent) => tracing::info!(
                "[{}] Accuracy on {} images: {:.2}%",
                self.model,
                self.accuracy.total,
                percent
            ),
            None => tracing::warn!("[{}] No labeled images, accuracy undefined", self.model),
        }
        tracing::info!(
            "[{}] Per-image inference times saved to {}",
            self.model,
            self.timing_log.display()
        );
        if self.failed > 0 || self.unlabeled > 0 {
            tracing::warn!(
                model = %self.model,
                failed = self.failed,
                unlabeled = self.unlabeled,
                "Some images were not counted"
            );
        }
    }
}

/// Times one classifier over a set of labeled images.
pub struct ClassificationService<B: InferenceBackend> {
    backend: B,
    model: ClassifierModel,
    preprocessor: ClassificationPreProcessor,
    top_k: usize,
    metrics: RunMetrics,
}

impl<B: InferenceBackend> ClassificationService<B> {
    pub fn new(backend: B, model: ClassifierModel, top_k: usize) -> Self {
        let metrics = RunMetrics::new("classify", model.selector(), backend.device().as_str());
        Self {
            backend,
            model,
            preprocessor: ClassificationPreProcessor::new(model.transform()),
            top_k,
            metrics,
        }
    }

    pub fn run(
        mut self,
        images: &[PathBuf],
        timing_log: &Path,
    ) -> anyhow::Result<ClassificationSummary> {
        let _s = span!("classify_model", model = %self.model);
        tracing::info!(
            model = %self.model,
            device = %self.backend.device(),
            images = images.len(),
            "Classification starting"
        );

        let mut timing = TimingLog::create(timing_log)?;
        let mut accuracy = Accuracy::default();
        let mut processed = 0usize;
        let mut failed = 0usize;
        let mut unlabeled = 0usize;

        for path in images {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let prediction = match load_rgb(path).and_then(|img| self.classify_image(&img)) {
                Ok(prediction) => prediction,
                Err(e) => {
                    failed += 1;
                    self.metrics.record_failure();
                    tracing::error!(image = %path.display(), error = %e, "Failed to classify image");
                    continue;
                }
            };

            processed += 1;
            timing.record(&name, prediction.forward)?;

            match true_label_from_filename(&name) {
                Ok(truth) => accuracy.record(prediction.class, truth),
                Err(e) => {
                    unlabeled += 1;
                    tracing::warn!(error = %e, "Excluded from accuracy");
                }
            }
        }

        tracing::debug!(model = %self.model, timed = timing.entries(), "Closing timing log");
        let summary = ClassificationSummary {
            model: self.model,
            accuracy,
            processed,
            failed,
            unlabeled,
            timing_log: timing.finish()?,
        };
        Ok(summary)
    }

    /// Preprocess, run the timed forward pass and take the top-1 class.
    pub fn classify_image(&mut self, img: &RgbImage) -> anyhow::Result<Prediction> {
        let input = self.preprocessor.preprocess_image(img)?;

        let start = Instant::now();
        let output = self.backend.infer(&input)?;
        let forward = start.elapsed();
        self.metrics.record_success(forward.as_secs_f64());

        let class = top1(&output.view())?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            let top = softmax_top_k(&output.view(), self.top_k)?;
            tracing::debug!(class, top = ?top, "Prediction");
        }

        Ok(Prediction { class, forward })
    }
}
