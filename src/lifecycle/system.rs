use super::HealthReport;
use crate::config::AdapterConfig;
use crate::intake::{AckKind, Delivery, OrderIntake, WorkerPool};
use crate::legacy::{LegacyClient, LegacyGateway};
use crate::orchestrator::TrackingOrchestrator;
use crate::publish::{EventPublisher, MessageBus};
use crate::simulator::{LegacySimulator, SimulatorHandle};
use crate::store::ShardedStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Pause before a `Nak`ed message is delivered again.
const REDELIVERY_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Failed to start simulator: {0}")]
    Simulator(#[source] std::io::Error),

    #[error("Intake is closed")]
    IntakeClosed,

    #[error("Task failed: {0}")]
    Task(#[from] JoinError),
}

/// The running service: store shards, optional simulator, legacy client, orchestrator and
/// intake, wired together.
///
/// ```ignore
/// let system = AdapterSystem::start(&config, Arc::new(LogBus)).await?;
/// system.submit_order(br#"{"order_id":"O1","tracking_id":"T1"}"#.to_vec()).await?;
/// system.shutdown().await?;
/// ```
pub struct AdapterSystem {
    orchestrator: TrackingOrchestrator,
    gateway: Arc<LegacyClient>,
    publisher: EventPublisher,
    simulator: Option<SimulatorHandle>,
    orders: mpsc::Sender<Delivery>,
    cancellations: mpsc::Sender<Delivery>,
    pool: WorkerPool,
    shutdown: CancellationToken,
    intake: JoinHandle<()>,
    store_handles: Vec<JoinHandle<()>>,
}

impl AdapterSystem {
    pub async fn start(config: &AdapterConfig, bus: Arc<dyn MessageBus>) -> Result<Self, SystemError> {
        // 1. Store shards
        let (shard_actors, store) = ShardedStore::new(config.store_shards, config.channel_buffer);
        let store_handles: Vec<_> = shard_actors
            .into_iter()
            .map(|actor| tokio::spawn(actor.run(())))
            .collect();

        // 2. Simulator, which the client then targets
        let mut legacy = config.legacy_settings();
        let simulator = if config.simulator_enabled {
            let handle = LegacySimulator::start(config.simulator_settings())
                .await
                .map_err(SystemError::Simulator)?;
            legacy.host = handle.local_addr().ip().to_string();
            legacy.port = handle.local_addr().port();
            Some(handle)
        } else {
            None
        };

        // 3. Client, publisher, orchestrator
        let gateway = Arc::new(LegacyClient::new(legacy, config.retry_policy()));
        let publisher = EventPublisher::new(bus, config.topics());
        let orchestrator =
            TrackingOrchestrator::new(Arc::new(store), gateway.clone(), publisher.clone());

        // 4. Intake
        let pool = WorkerPool::new(config.worker_pool_size);
        let (orders, order_rx) = mpsc::channel(config.channel_buffer);
        let (cancellations, cancel_rx) = mpsc::channel(config.channel_buffer);
        let shutdown = CancellationToken::new();
        let intake = OrderIntake::new(
            orchestrator.clone(),
            pool.clone(),
            config.intake_max_deliveries,
        );
        let intake = tokio::spawn(intake.run(order_rx, cancel_rx, shutdown.clone()));

        info!(
            wms = %gateway.settings().address(),
            simulator = simulator.is_some(),
            "Adapter system started"
        );

        Ok(Self {
            orchestrator,
            gateway,
            publisher,
            simulator,
            orders,
            cancellations,
            pool,
            shutdown,
            intake,
            store_handles,
        })
    }

    pub fn orchestrator(&self) -> &TrackingOrchestrator {
        &self.orchestrator
    }

    pub fn simulator(&self) -> Option<&SimulatorHandle> {
        self.simulator.as_ref()
    }

    /// Delivers an order payload, redelivering on `Nak`, until it is settled.
    /// Returns the number of deliveries it took.
    pub async fn submit_order(&self, payload: Vec<u8>) -> Result<u32, SystemError> {
        deliver(&self.orders, payload).await
    }

    /// Same as [`Self::submit_order`] for `trackingId:reason` cancellation text.
    pub async fn submit_cancellation(&self, text: &str) -> Result<u32, SystemError> {
        deliver(&self.cancellations, text.as_bytes().to_vec()).await
    }

    pub async fn health(&self) -> HealthReport {
        let connected = self.gateway.ping().await;
        let simulator = match &self.simulator {
            Some(handle) => Some((handle.is_running(), handle.package_count().await)),
            None => None,
        };
        HealthReport::new(connected, simulator)
    }

    /// Stops intake, lets running work finish, then stops the simulator and the store.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down adapter system...");

        self.shutdown.cancel();
        drop(self.orders);
        drop(self.cancellations);
        self.intake.await?;

        self.pool.drain().await;
        self.publisher.flush().await;

        if let Some(simulator) = self.simulator {
            simulator.shutdown().await?;
        }

        // Store actors exit once the last client is gone.
        drop(self.orchestrator);
        drop(self.gateway);
        for handle in self.store_handles {
            if let Err(e) = handle.await {
                error!("Store shard failed: {:?}", e);
                return Err(e.into());
            }
        }

        info!("Adapter system shutdown complete.");
        Ok(())
    }
}

async fn deliver(sender: &mpsc::Sender<Delivery>, payload: Vec<u8>) -> Result<u32, SystemError> {
    let mut attempt = 1;
    loop {
        let (delivery, settled) = Delivery::new(payload.clone(), attempt);
        sender
            .send(delivery)
            .await
            .map_err(|_| SystemError::IntakeClosed)?;

        match settled.await {
            Ok(AckKind::Ack) => return Ok(attempt),
            Ok(AckKind::Nak) => {
                warn!(attempt, "Delivery rejected, redelivering");
                tokio::time::sleep(REDELIVERY_DELAY).await;
                attempt += 1;
            }
            Err(_) => return Err(SystemError::IntakeClosed),
        }
    }
}
