//! # Tracking Orchestrator
//!
//! Drives packages through their lifecycle: takes orders and cancellations, talks to the
//! legacy system, records every transition with its event, and announces the result.
//!
//! ```text
//! order ──> store.insert(RECEIVED + ORDER_CREATED)
//!       ──> legacy ORDER/CREATE ──ACK──> PROCESSING
//!                               └─ERROR / failure──> FAILED + ERROR_OCCURRED
//! ```
//!
//! Store writes happen first; publication follows on background tasks.

pub mod error;

pub use error::OrchestratorError;

use crate::codec::kind;
use crate::legacy::{order_data, LegacyGateway};
use crate::model::{
    EventType, OrderMessage, Package, PackageStatus, PackageStatusMessage, WarehouseEvent,
    WarehouseEventMessage,
};
use crate::publish::EventPublisher;
use crate::store::{PackageStore, StoreError, Transition, Transitioned};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// How an inbound order ended.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    /// The legacy system acknowledged the order; the package is `PROCESSING`.
    Accepted(Package),
    /// The legacy system refused the order; the package is `FAILED`.
    Rejected(Package),
    /// The legacy system could not be reached; the package is `FAILED`.
    Failed(Package),
    /// The order was already handled by an earlier delivery.
    Duplicate(Package),
}

impl OrderOutcome {
    pub fn package(&self) -> &Package {
        match self {
            OrderOutcome::Accepted(p)
            | OrderOutcome::Rejected(p)
            | OrderOutcome::Failed(p)
            | OrderOutcome::Duplicate(p) => p,
        }
    }
}

const NOT_CANCELLABLE: [PackageStatus; 2] = [PackageStatus::Shipped, PackageStatus::Delivered];

#[derive(Clone)]
pub struct TrackingOrchestrator {
    store: Arc<dyn PackageStore>,
    gateway: Arc<dyn LegacyGateway>,
    publisher: EventPublisher,
}

impl TrackingOrchestrator {
    pub fn new(
        store: Arc<dyn PackageStore>,
        gateway: Arc<dyn LegacyGateway>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            store,
            gateway,
            publisher,
        }
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Takes in a new order and hands it to the legacy system.
    ///
    /// Orders without an order ID or tracking ID fail with `Validation` after an
    /// `ERROR_OCCURRED` event is published. Legacy rejections and communication failures
    /// are not errors here: they leave the package `FAILED` and are reported through the
    /// outcome.
    #[instrument(skip(self, order), fields(order_id = ?order.order_id, tracking_id = ?order.tracking_id))]
    pub async fn process_new_order(
        &self,
        order: &OrderMessage,
    ) -> Result<OrderOutcome, OrchestratorError> {
        debug!(?order, "process_new_order called");
        let (tracking_id, order_id) = self.validate(order)?;

        let package = Package::received(tracking_id, order_id, order);
        let created = WarehouseEvent::new(
            EventType::OrderCreated,
            &package,
            "Order created and received for processing",
        )
        .with_transition(None, Some(PackageStatus::Received));

        match self.store.insert(package, created.clone()).await {
            Ok(()) => {
                info!("Package created");
                self.publisher.publish_event(&WarehouseEventMessage::from(&created));
            }
            Err(StoreError::AlreadyExists(_)) => {
                let existing = self.require(tracking_id).await?;
                if existing.status != PackageStatus::Received {
                    info!(status = %existing.status, "Order already processed");
                    return Ok(OrderOutcome::Duplicate(existing));
                }
                info!("Resuming order left in RECEIVED");
            }
            Err(e) => return Err(e.into()),
        }

        let data = order_data(order);
        let response = self
            .gateway
            .create_order(tracking_id, order_id, order.origin.as_deref(), Some(&data))
            .await;

        match response {
            Ok(reply) if reply.is_type(kind::ACK) => {
                let transition = Transition::new(
                    PackageStatus::Processing,
                    EventType::PackageStatusChanged,
                    "Order accepted by WMS",
                )
                .expecting(PackageStatus::Received);
                match self.store.transition(tracking_id, transition).await {
                    Ok(done) => {
                        info!("Order accepted by WMS");
                        self.announce(&done, Some("Order accepted by WMS".to_string()));
                        Ok(OrderOutcome::Accepted(done.package))
                    }
                    Err(StoreError::InvalidState { .. }) => {
                        Ok(OrderOutcome::Duplicate(self.require(tracking_id).await?))
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Ok(reply) => {
                let detail = if reply.is_type(kind::ERROR) {
                    reply.data.unwrap_or_else(|| "no detail".to_string())
                } else {
                    format!(
                        "unexpected {} response",
                        reply.message_type.as_deref().unwrap_or("empty")
                    )
                };
                warn!(%detail, "Order rejected by WMS");
                let package = self
                    .fail_order(tracking_id, format!("Order rejected by WMS: {detail}"))
                    .await?;
                Ok(OrderOutcome::Rejected(package))
            }
            Err(e) => {
                error!(error = %e, "Error processing order");
                let package = self
                    .fail_order(tracking_id, format!("Error processing order: {e}"))
                    .await?;
                Ok(OrderOutcome::Failed(package))
            }
        }
    }

    /// Moves a package to `new_status`, recording and announcing the change.
    #[instrument(skip(self, location, notes))]
    pub async fn update_package_status(
        &self,
        tracking_id: &str,
        new_status: PackageStatus,
        location: Option<String>,
        notes: Option<String>,
    ) -> Result<Package, OrchestratorError> {
        let done = self
            .apply_status(
                tracking_id,
                new_status,
                location,
                notes.clone(),
                format!("Package status updated to {new_status}"),
            )
            .await?;
        self.announce(&done, notes);
        Ok(done.package)
    }

    /// Current state of a package, refreshed from the legacy system when it answers.
    ///
    /// Communication problems are logged and the last recorded package is returned.
    #[instrument(skip(self))]
    pub async fn query_package_status(&self, tracking_id: &str) -> Result<Package, OrchestratorError> {
        let local = self.require(tracking_id).await?;

        let reply = match self.gateway.query_status(tracking_id).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "WMS query failed, returning last known state");
                return Ok(local);
            }
        };
        if !reply.is_type(kind::STATUS) {
            debug!(response_type = ?reply.message_type, data = ?reply.data, "No live status from WMS");
            return Ok(local);
        }
        let Some(live) = reply.status.as_deref().map(PackageStatus::from_wire) else {
            return Ok(local);
        };
        if live == local.status {
            return Ok(local);
        }

        info!(local = %local.status, %live, "Refreshing status from WMS");
        let description = "Status updated from WMS query";
        match self
            .apply_status(tracking_id, live, reply.location, None, description.to_string())
            .await
        {
            Ok(done) => {
                self.announce(&done, Some(description.to_string()));
                Ok(done.package)
            }
            Err(e) => {
                warn!(error = %e, "Could not record live status, returning last known state");
                Ok(local)
            }
        }
    }

    /// Cancels a package that has not shipped yet.
    ///
    /// The legacy system is told first; if it cannot be reached the package is left
    /// unchanged and the communication failure is returned.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, tracking_id: &str, reason: &str) -> Result<Package, OrchestratorError> {
        let package = self.require(tracking_id).await?;
        if !package.status.is_cancellable() {
            return Err(OrchestratorError::InvalidState {
                tracking_id: tracking_id.to_string(),
                status: package.status,
                reason: format!("cannot cancel a package that is {}", package.status),
            });
        }

        let reply = self.gateway.cancel_order(tracking_id, &package.order_id).await?;
        if !reply.is_type(kind::ACK) {
            warn!(response_type = ?reply.message_type, data = ?reply.data, "WMS did not acknowledge cancellation");
        }

        let transition = Transition::new(
            PackageStatus::Failed,
            EventType::OrderCancelled,
            format!("Order cancelled: {reason}"),
        )
        .with_notes(Some(reason.to_string()))
        .forbidding(&NOT_CANCELLABLE);
        let done = self.store.transition(tracking_id, transition).await?;
        info!(%reason, "Order cancelled");
        self.announce(&done, Some(reason.to_string()));
        Ok(done.package)
    }

    /// All events for a package, most recent first.
    pub async fn package_history(&self, tracking_id: &str) -> Result<Vec<WarehouseEvent>, OrchestratorError> {
        Ok(self.store.events(tracking_id).await?)
    }

    pub async fn find_package(&self, tracking_id: &str) -> Result<Option<Package>, OrchestratorError> {
        Ok(self.store.find(tracking_id).await?)
    }

    pub async fn packages_by_status(&self, status: PackageStatus) -> Result<Vec<Package>, OrchestratorError> {
        Ok(self.store.find_by_status(status).await?)
    }

    pub async fn packages_by_customer(&self, customer_id: &str) -> Result<Vec<Package>, OrchestratorError> {
        Ok(self.store.find_by_customer(customer_id).await?)
    }

    pub async fn status_counts(&self) -> Result<HashMap<PackageStatus, usize>, OrchestratorError> {
        Ok(self.store.count_by_status().await?)
    }

    fn validate<'a>(&self, order: &'a OrderMessage) -> Result<(&'a str, &'a str), OrchestratorError> {
        let present = |value: &'a Option<String>| {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        };
        let tracking_id = present(&order.tracking_id);
        let order_id = present(&order.order_id);

        match (tracking_id, order_id) {
            (Some(tracking_id), Some(order_id)) => Ok((tracking_id, order_id)),
            _ => {
                let missing = match (tracking_id, order_id) {
                    (None, None) => "order_id and tracking_id are required",
                    (None, _) => "tracking_id is required",
                    _ => "order_id is required",
                };
                warn!(missing, "Dropping invalid order");
                self.publisher.publish_event(&WarehouseEventMessage::detached(
                    EventType::ErrorOccurred,
                    tracking_id.map(str::to_string),
                    order_id.map(str::to_string),
                    format!("Invalid order: {missing}"),
                ));
                Err(OrchestratorError::Validation(missing.to_string()))
            }
        }
    }

    async fn require(&self, tracking_id: &str) -> Result<Package, OrchestratorError> {
        self.store
            .find(tracking_id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(tracking_id.to_string()))
    }

    async fn apply_status(
        &self,
        tracking_id: &str,
        new_status: PackageStatus,
        location: Option<String>,
        notes: Option<String>,
        description: String,
    ) -> Result<Transitioned, OrchestratorError> {
        let transition = Transition::new(new_status, EventType::PackageStatusChanged, description)
            .with_location(location)
            .with_notes(notes);
        let done = self.store.transition(tracking_id, transition).await?;
        info!(previous = %done.previous, %new_status, "Package status updated");
        Ok(done)
    }

    /// `FAILED` transition plus an `ERROR_OCCURRED` record for an order the legacy system
    /// did not take. Both events commit in one store write.
    async fn fail_order(&self, tracking_id: &str, detail: String) -> Result<Package, OrchestratorError> {
        let transition = Transition::new(
            PackageStatus::Failed,
            EventType::PackageStatusChanged,
            detail.clone(),
        )
        .expecting(PackageStatus::Received)
        .with_follow_up(EventType::ErrorOccurred, detail.clone());
        let done = match self.store.transition(tracking_id, transition).await {
            Ok(done) => done,
            Err(StoreError::InvalidState { .. }) => return self.require(tracking_id).await,
            Err(e) => return Err(e.into()),
        };
        self.announce(&done, Some(detail));
        Ok(done.package)
    }

    fn announce(&self, done: &Transitioned, notes: Option<String>) {
        self.publisher.publish_status(&PackageStatusMessage::for_transition(
            &done.package,
            done.previous,
            notes,
        ));
        self.publisher.publish_event(&WarehouseEventMessage::from(&done.event));
        if let Some(follow_up) = &done.follow_up {
            self.publisher.publish_event(&WarehouseEventMessage::from(follow_up));
        }
    }
}
