use std::{path::Path, sync::Arc};

use anyhow::Context;
use courier::{config::Config, dispatch::Trigger, service::RelayService};
use courier_common::Signal;
use courier_ingest::MemoryRecordSource;
use courier_publish::{BatchPublisher, CircuitBreaker, LoopbackTransport};
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    courier_common::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let trigger = Trigger::parse(&args).context("parsing trigger arguments")?;

    let config_path =
        std::env::var("COURIER_CONFIG").unwrap_or_else(|_| "courier.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        Config::load(Path::new(&config_path))?
    } else {
        tracing::warn!(path = %config_path, "Configuration file not found, using defaults");
        Config::default()
    };

    courier_common::audit::init(config.audit_log.clone());
    if let Err(error) = courier_metrics::init_metrics(&config.metrics) {
        tracing::warn!(error = %error, "Metrics initialization failed, continuing without metrics");
    }

    let audit = config.audit_store.build().await?;
    let breaker = Arc::new(CircuitBreaker::new(config.publisher.breaker.clone()));
    let publisher = BatchPublisher::new(
        config.publisher,
        Arc::new(LoopbackTransport::new()),
        breaker,
        audit,
    )?;
    let service = RelayService::new(Arc::new(MemoryRecordSource::new()), publisher);

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel(8);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(Signal::Shutdown);
        }
    });

    let report = service.run(trigger, &mut shutdown_rx).await?;
    if report.is_success() {
        tracing::info!(delivered = report.delivered, "Relay completed successfully");
        Ok(())
    } else {
        anyhow::bail!(
            "Relay completed with {} invalid and {} failed records",
            report.invalid,
            report.failed
        )
    }
}
