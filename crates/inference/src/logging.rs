use common::{Environment, TelemetryGuard};

/// Install the tracing subscriber of a runner.
///
/// With an OTLP endpoint the returned guard must be kept alive until the
/// run ends so the last spans and metrics get flushed.
pub fn setup_logging(
    service_name: &str,
    environment: Environment,
    otel_endpoint: Option<&str>,
) -> anyhow::Result<Option<TelemetryGuard>> {
    match otel_endpoint {
        Some(endpoint) => TelemetryGuard::init(service_name, endpoint, environment).map(Some),
        None => {
            common::setup_logging(environment);
            Ok(None)
        }
    }
}
