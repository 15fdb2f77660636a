//! Subscriber setup.
//!
//! Wires `tracing` macros through `tracing-opentelemetry` into the file
//! exporter, with an optional human-readable stderr layer.

use super::file_writer::RotationPolicy;
use super::tracer;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::resource::Resource;
use std::path::PathBuf;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Service name reported in every exported span.
pub const SERVICE_NAME: &str = "aptdesk";

/// File name of the trace log inside the data directory.
pub const TRACE_FILE_NAME: &str = "aptdesk-otlp.json";

/// Resolves the filter directive.
///
/// `RUST_LOG` wins when set and valid; otherwise `config.trace_level`, then `info`.
fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.trace_level.as_deref().unwrap_or("info");
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Location of the trace file for `config`.
pub fn trace_file_path(config: &Config) -> PathBuf {
    config
        .data_dir
        .clone()
        .unwrap_or_else(crate::infrastructure::paths::get_data_dir)
        .join(TRACE_FILE_NAME)
}

/// Initializes the global tracing subscriber.
///
/// Observability is optional: if the data directory cannot be created, or a
/// subscriber is already installed, this returns without doing anything.
///
/// # Example
///
/// ```rust,no_run
/// use aptdesk::observability::init_tracing;
/// use aptdesk::Config;
///
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     ..Default::default()
/// };
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    let trace_file = trace_file_path(config);
    if let Some(parent) = trace_file.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let resource = Resource::new(vec![opentelemetry::KeyValue::new(
        "service.name",
        SERVICE_NAME,
    )]);
    let provider =
        tracer::create_tracer_provider(trace_file, resource, RotationPolicy::default());
    let otel_layer = OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME));

    let stderr_layer = config.log_to_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(otel_layer)
        .with(stderr_layer)
        .try_init();
}
