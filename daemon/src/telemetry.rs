// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::errors::DaemonError;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: the binary, the daemon library and
/// the core crate.
pub const DEFAULT_LOG_FILTER: &str = "romswitchd=debug,romswitch_daemon=debug,romswitch=debug";

/// Initialize logging from `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Install the Prometheus recorder and its scrape listener.
///
/// Must run inside the tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), DaemonError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| DaemonError::Metrics(e.to_string()))?;

    metrics::describe_counter!("romswitch_requests_total", "Requests received, by kind");
    metrics::describe_counter!("romswitch_switch_rom_total", "ROM switches, by result");
    metrics::describe_counter!("romswitch_open_file_total", "Privileged opens, by outcome");
    metrics::describe_counter!("romswitch_set_kernel_total", "Kernel captures, by outcome");
    metrics::gauge!("romswitchd_up", 1.0);

    tracing::info!("Serving metrics on {}", addr);
    Ok(())
}
