//! OpenTelemetry metrics for the courier relay
//!
//! Exports publish-path metrics via OTLP to an OpenTelemetry Collector, which
//! can expose them in Prometheus format for scraping.
//!
//! # Usage
//!
//! ```rust,no_run
//! use courier_metrics::{MetricsConfig, init_metrics};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MetricsConfig {
//!     enabled: true,
//!     endpoint: "http://localhost:4318/v1/metrics".to_string(),
//! };
//!
//! init_metrics(&config)?;
//!
//! if let Some(metrics) = courier_metrics::try_metrics() {
//!     metrics.publish.record_attempt("delivered", "outbound");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod exporter;
mod publish;

pub use config::MetricsConfig;
pub use error::MetricsError;
use once_cell::sync::OnceCell;
pub use publish::PublishMetrics;

/// Global metrics instance
static METRICS_INSTANCE: OnceCell<Metrics> = OnceCell::new();

/// Root metrics container
#[derive(Debug)]
pub struct Metrics {
    pub publish: PublishMetrics,
}

/// Initialize the metrics system
///
/// Must be called once at startup before any metrics are recorded. If metrics
/// are disabled in the config, this is a no-op and `try_metrics()` keeps
/// returning `None`.
///
/// # Errors
///
/// Returns an error if metrics initialization fails or if called multiple times.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        tracing::info!("Metrics collection is disabled");
        return Ok(());
    }

    tracing::info!(
        endpoint = %config.endpoint,
        "Initializing OpenTelemetry metrics with OTLP exporter"
    );

    let provider = exporter::init_otlp_exporter(&config.endpoint)?;

    // Install the provider as the global meter provider
    opentelemetry::global::set_meter_provider(provider);

    let metrics = Metrics {
        publish: PublishMetrics::new()?,
    };

    METRICS_INSTANCE
        .set(metrics)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    tracing::info!("Metrics collection initialized successfully");

    Ok(())
}

/// Get a reference to the global metrics instance, if initialized
#[must_use]
pub fn try_metrics() -> Option<&'static Metrics> {
    METRICS_INSTANCE.get()
}

/// Check if metrics are enabled
#[must_use]
pub fn is_enabled() -> bool {
    METRICS_INSTANCE.get().is_some()
}
