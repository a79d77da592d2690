//! # Order Intake
//!
//! Consumes the order and cancellation topics. Each delivery is processed on the
//! [`WorkerPool`] and settled only once processing is over:
//!
//! | Result | Settlement |
//! |--------|------------|
//! | success, or a failure retrying cannot fix | `Ack` |
//! | retryable failure, deliveries left | `Nak` |
//! | retryable failure, last delivery | dead letter, then `Ack` |

pub mod delivery;
pub mod pool;

pub use delivery::{AckKind, Delivery};
pub use pool::{PoolError, WorkerPool};

use crate::model::{CancellationRequest, EventType, OrderMessage, WarehouseEventMessage};
use crate::orchestrator::{OrchestratorError, OrderOutcome, TrackingOrchestrator};
use crate::publish::DeadLetter;
use std::future::Future;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct OrderIntake {
    orchestrator: TrackingOrchestrator,
    pool: WorkerPool,
    max_deliveries: u32,
}

impl OrderIntake {
    pub fn new(orchestrator: TrackingOrchestrator, pool: WorkerPool, max_deliveries: u32) -> Self {
        Self {
            orchestrator,
            pool,
            max_deliveries: max_deliveries.max(1),
        }
    }

    /// Consumes both channels until `shutdown` fires or both senders are gone.
    ///
    /// Deliveries still queued when the loop stops are dropped unsettled, which the sender
    /// sees as a closed channel.
    pub async fn run(
        self,
        mut orders: mpsc::Receiver<Delivery>,
        mut cancellations: mpsc::Receiver<Delivery>,
        shutdown: CancellationToken,
    ) {
        info!(pool_size = self.pool.size(), max_deliveries = self.max_deliveries, "Order intake started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(delivery) = orders.recv() => {
                    self.dispatch(self.clone().handle_order(delivery)).await;
                }
                Some(delivery) = cancellations.recv() => {
                    self.dispatch(self.clone().handle_cancellation(delivery)).await;
                }
                else => break,
            }
        }
        info!("Order intake stopped");
    }

    /// Leaves the delivery unsettled if the pool is already shut down.
    async fn dispatch<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Err(e) = self.pool.submit(job).await {
            warn!(error = %e, "Could not schedule delivery");
        }
    }

    async fn handle_order(self, delivery: Delivery) {
        let order: OrderMessage = match serde_json::from_slice(&delivery.payload) {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, attempt = delivery.attempt, "Malformed order payload");
                self.orchestrator
                    .publisher()
                    .publish_event(&WarehouseEventMessage::detached(
                        EventType::ErrorOccurred,
                        None,
                        None,
                        format!("Malformed order payload: {e}"),
                    ));
                delivery.ack();
                return;
            }
        };

        match self.orchestrator.process_new_order(&order).await {
            Ok(outcome) => {
                let package = outcome.package();
                let result = match &outcome {
                    OrderOutcome::Accepted(_) => "accepted",
                    OrderOutcome::Rejected(_) => "rejected",
                    OrderOutcome::Failed(_) => "failed",
                    OrderOutcome::Duplicate(_) => "duplicate",
                };
                info!(tracking_id = %package.tracking_id, status = %package.status, result, "Order processed");
                delivery.ack();
            }
            Err(e) => {
                let key = order
                    .tracking_id
                    .clone()
                    .or(order.order_id.clone())
                    .unwrap_or_default();
                let topic = self.orchestrator.publisher().topics().orders.clone();
                self.settle_failure(delivery, &topic, &key, e);
            }
        }
    }

    async fn handle_cancellation(self, delivery: Delivery) {
        let text = delivery.text().into_owned();
        let Some(request) = CancellationRequest::parse(&text) else {
            warn!(payload = %text, "Cancellation without tracking ID");
            delivery.ack();
            return;
        };

        match self
            .orchestrator
            .cancel_order(&request.tracking_id, &request.reason)
            .await
        {
            Ok(package) => {
                info!(tracking_id = %package.tracking_id, "Cancellation processed");
                delivery.ack();
            }
            Err(e) => {
                let topic = self.orchestrator.publisher().topics().cancellations.clone();
                self.settle_failure(delivery, &topic, &request.tracking_id, e);
            }
        }
    }

    fn settle_failure(&self, delivery: Delivery, topic: &str, key: &str, error: OrchestratorError) {
        if !error.is_retryable() {
            warn!(key, error = %error, "Dropping message after non-retryable failure");
            delivery.ack();
            return;
        }
        if delivery.attempt < self.max_deliveries {
            warn!(key, attempt = delivery.attempt, error = %error, "Processing failed, requesting redelivery");
            delivery.nak();
            return;
        }

        error!(key, attempt = delivery.attempt, error = %error, "Delivery budget exhausted, dead-lettering");
        let letter = DeadLetter::new(topic, &delivery.payload, error.to_string(), delivery.attempt);
        self.orchestrator.publisher().publish_dead_letter(key, &letter);
        debug!(key, "Dead letter published");
        delivery.ack();
    }
}
