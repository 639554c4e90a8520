//! Aegis Gateway binary entry point.

use aegis_gateway::config::ConfigLoader;
use aegis_gateway::modules::admission::AdmissionControl;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// How often idle rate-limit keys are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Entry point for Aegis Gateway.
///
/// Loads and validates configuration, assembles the admission layer, and
/// keeps the background sweep running. The listener that feeds requests
/// into [`AdmissionControl`] is provided by the embedding deployment.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match ConfigLoader::new().from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration, refusing to start");
            std::process::exit(1);
        },
    };

    let admission = match AdmissionControl::from_config(&config) {
        Ok(admission) => Arc::new(admission),
        Err(err) => {
            error!(error = %err, "failed to assemble admission control");
            std::process::exit(1);
        },
    };

    if let Some(store) = admission.store() {
        let store = Arc::clone(store);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                store.sweep();
            }
        });
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "aegis gateway admission layer ready"
    );

    // Hold the process open for the embedding listener.
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to wait for shutdown signal");
    }
    info!(stats = ?admission.stats(), "shutting down");
}
