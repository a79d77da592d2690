//! # Legacy System Access
//!
//! [`LegacyGateway`] is the seam between the orchestrator and the legacy warehouse system.
//! [`LegacyClient`] implements it over TCP; tests plug in scripted gateways.

pub mod client;
pub mod error;
pub mod retry;

pub use client::{LegacyClient, LegacySettings};
pub use error::LegacyError;
pub use retry::RetryPolicy;

use crate::codec::{kind, operation, WireMessage, DELIMITER};
use crate::model::OrderMessage;
use async_trait::async_trait;
use tracing::warn;

#[async_trait]
pub trait LegacyGateway: Send + Sync {
    /// Sends one request and returns the legacy system's reply.
    async fn send(&self, message: WireMessage) -> Result<WireMessage, LegacyError>;

    async fn create_order(
        &self,
        tracking_id: &str,
        order_id: &str,
        location: Option<&str>,
        data: Option<&str>,
    ) -> Result<WireMessage, LegacyError> {
        let mut message = WireMessage::new(kind::ORDER)
            .with_tracking_id(tracking_id)
            .with_order_id(order_id)
            .with_operation(operation::CREATE);
        message.location = location.map(str::to_string);
        message.data = data.map(str::to_string);
        self.send(message).await
    }

    async fn cancel_order(
        &self,
        tracking_id: &str,
        order_id: &str,
    ) -> Result<WireMessage, LegacyError> {
        let message = WireMessage::new(kind::ORDER)
            .with_tracking_id(tracking_id)
            .with_order_id(order_id)
            .with_operation(operation::CANCEL);
        self.send(message).await
    }

    async fn query_status(&self, tracking_id: &str) -> Result<WireMessage, LegacyError> {
        let message = WireMessage::new(kind::QUERY)
            .with_tracking_id(tracking_id)
            .with_operation(operation::STATUS);
        self.send(message).await
    }

    /// True when the legacy system answers `PONG` or `ACK`.
    async fn ping(&self) -> bool {
        let message = WireMessage::new(kind::PING).with_operation(operation::TEST);
        match self.send(message).await {
            Ok(reply) => reply.is_type(kind::PONG) || reply.is_type(kind::ACK),
            Err(e) => {
                warn!(error = %e, "WMS ping failed");
                false
            }
        }
    }
}

/// The `data` field of an `ORDER/CREATE` request.
///
/// Normally the order as JSON. Free text in the order can contain the field delimiter, so
/// in that case a compact `order:..;customer:..;destination:..` summary with delimiters
/// removed is sent instead.
pub fn order_data(order: &OrderMessage) -> String {
    match serde_json::to_string(order) {
        Ok(json) if !json.contains(DELIMITER) => json,
        _ => {
            let clean = |value: &Option<String>| {
                value
                    .as_deref()
                    .unwrap_or_default()
                    .replace(DELIMITER, "")
            };
            format!(
                "order:{};customer:{};destination:{}",
                clean(&order.order_id),
                clean(&order.customer_id),
                clean(&order.destination)
            )
        }
    }
}
