use crate::config::Environment;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter from `RUST_LOG`, `info` when unset or invalid.
pub(crate) fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber without any exporter.
///
/// Development gets pretty, colored output; production gets one JSON object
/// per event so logs of long batch runs can be shipped as-is.
///
/// Use [`crate::TelemetryGuard::init`] instead when an OTLP collector is
/// available, it installs its own subscriber.
pub fn setup_logging(environment: Environment) {
    let registry = tracing_subscriber::registry().with(env_filter());

    match environment {
        Environment::Production => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_level(true))
                .init();
        }
        Environment::Development => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
                .init();
        }
    }
}

/// Creates an info-level span and enters it.
#[macro_export]
macro_rules! span {
    ($name:literal) => {
        tracing::info_span!($name).entered()
    };
    ($name:literal, $($field:tt)+) => {
        tracing::info_span!($name, $($field)+).entered()
    };
}

/// Creates a debug-level span and enters it.
#[macro_export]
macro_rules! span_debug {
    ($name:literal) => {
        tracing::debug_span!($name).entered()
    };
}
