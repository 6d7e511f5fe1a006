// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use clap::Parser;
use romswitch_daemon::config::DaemonConfig;
use romswitch_daemon::errors::DaemonError;
use romswitch_daemon::server::{bind, serve, Daemon};
use romswitch_daemon::telemetry;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "romswitchd")]
#[command(about = "Privileged ROM switching daemon", long_about = None)]
struct Args {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Socket path, overrides the config file
    #[arg(short, long)]
    socket: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    if let Err(e) = run(Args::parse()).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), DaemonError> {
    let mut cfg = match &args.config {
        Some(path) => DaemonConfig::load(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(socket) = args.socket {
        cfg.socket_path = socket;
    }

    tracing::info!("Initializing romswitchd with config: {:?}", cfg);

    if let Some(addr) = cfg.metrics_addr {
        telemetry::init_metrics(addr)?;
    }

    let daemon = Arc::new(Daemon::from_config(&cfg));
    let listener = bind(&cfg.socket_path, cfg.socket_mode)?;
    tracing::info!("Listening on {:?}", cfg.socket_path);

    tokio::select! {
        _ = serve(listener, daemon) => {}
        res = tokio::signal::ctrl_c() => match res {
            Ok(()) => tracing::info!("Shutting down"),
            Err(e) => tracing::error!("Failed to wait for shutdown signal: {}", e),
        },
    }

    if let Err(e) = std::fs::remove_file(&cfg.socket_path) {
        tracing::warn!("Failed to remove socket {:?}: {}", cfg.socket_path, e);
    }
    Ok(())
}
