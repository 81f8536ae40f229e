use crate::error::PipelineError;

/// Ground-truth class encoded as the leading `<class>_` of a file name,
/// e.g. `281_n02123045_1955.JPEG` is class 281.
pub fn true_label_from_filename(name: &str) -> Result<usize, PipelineError> {
    name.split('_')
        .next()
        .and_then(|prefix| prefix.parse().ok())
        .ok_or_else(|| PipelineError::InvalidLabel(name.to_string()))
}

/// Top-1 hit counter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Accuracy {
    pub correct: usize,
    pub total: usize,
}

impl Accuracy {
    pub fn record(&mut self, predicted: usize, truth: usize) {
        if predicted == truth {
            self.correct += 1;
        }
        self.total += 1;
    }

    /// Percentage of correct predictions, `None` before anything was recorded.
    pub fn percent(&self) -> Option<f64> {
        (self.total > 0).then(|| 100.0 * self.correct as f64 / self.total as f64)
    }
}
