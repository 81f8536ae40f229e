use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};

/// Instruments shared by both runners. Without a meter provider installed
/// (no `--otel-endpoint`) every call is a no-op.
pub struct RunMetrics {
    pub inference_duration: Histogram<f64>,
    pub images: Counter<u64>,
    pub failures: Counter<u64>,
    attributes: Vec<KeyValue>,
}

impl RunMetrics {
    pub fn new(meter_name: &'static str, model: &str, device: &str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0,
        ];
        let inference_duration = meter
            .f64_histogram("inference_duration_seconds")
            .with_description("Time spent in the forward pass of a single image")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build();
        let images = meter
            .u64_counter("inference_images_total")
            .with_description("Images processed successfully")
            .build();
        let failures = meter
            .u64_counter("inference_image_failures_total")
            .with_description("Images that could not be processed")
            .build();

        Self {
            inference_duration,
            images,
            failures,
            attributes: vec![
                KeyValue::new("model", model.to_string()),
                KeyValue::new("device", device.to_string()),
            ],
        }
    }

    pub fn record_success(&self, forward_seconds: f64) {
        self.inference_duration
            .record(forward_seconds, &self.attributes);
        self.images.add(1, &self.attributes);
    }

    pub fn record_failure(&self) {
        self.failures.add(1, &self.attributes);
    }
}
