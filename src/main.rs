//! `wms-bridge` service entry point.

use anyhow::Context;
use keyed_actor::tracing::setup_tracing;
use std::sync::Arc;
use tracing::{info, warn};
use wms_bridge::config::AdapterConfig;
use wms_bridge::lifecycle::{AdapterSystem, ComponentStatus};
use wms_bridge::publish::LogBus;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AdapterConfig::from_env().context("Failed to load configuration")?;
    setup_tracing(&config.log_level);

    info!(?config, "Starting WMS bridge");
    let system = AdapterSystem::start(&config, Arc::new(LogBus))
        .await
        .context("Failed to start adapter system")?;

    let health = system.health().await;
    if health.overall_status == ComponentStatus::Up {
        info!(?health, "WMS reachable");
    } else {
        warn!(?health, "WMS not reachable yet, orders will be retried");
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    system.shutdown().await.context("Shutdown failed")?;
    Ok(())
}
