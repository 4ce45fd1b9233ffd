use anyhow::Result;
use registrar_core::RegistryAdapter;
use registrar_etcd::Factory;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod events;
mod http;
mod metrics;

use config::RegistrarConfig;
use metrics::RegistrarMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting vulcand-registrar...");

    let config = RegistrarConfig::from_env()?;
    info!("Registry: {}", config.registry_uri);
    info!("Service domain: {:?}", config.service_domain);

    let adapter = Factory::new(config.store_timeout)
        .create(&config.registry_uri, &config.service_domain)?;
    let adapter: Arc<dyn RegistryAdapter> = Arc::new(adapter);

    match adapter.probe().await {
        Ok(()) => info!("Store is reachable"),
        Err(e) => warn!("Store probe failed, continuing: {}", e),
    }

    let metrics = RegistrarMetrics::new()?;

    let listener = TcpListener::bind(config.listen).await?;
    info!("Health and metrics listening on {}", config.listen);
    {
        let adapter = adapter.clone();
        let metrics = metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = http::serve(listener, adapter, metrics).await {
                error!("Health server stopped: {}", e);
            }
        });
    }

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = events::run_events(stdin, adapter, metrics) => {
            let count = result?;
            info!("Processed {} events, exiting...", count);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, exiting...");
        }
    }

    Ok(())
}
