//! Bus payloads. Field names are snake_case on the wire.

use super::{now, EventType, Package, PackageStatus, WarehouseEvent, SOURCE};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One inbound order from the `orders` topic.
///
/// Every field is optional at the serde level; `order_id` and `tracking_id` are checked
/// by the orchestrator so that a malformed order is rejected with an audit entry instead
/// of a decode error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderMessage {
    pub order_id: Option<String>,
    pub tracking_id: Option<String>,
    pub customer_id: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    pub priority: Option<String>,
    pub service_type: Option<String>,
    pub expected_delivery_date: Option<NaiveDateTime>,
    pub special_instructions: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub metadata: Option<serde_json::Value>,
}

/// A request on the `order-cancellations` topic, sent as `trackingId:reason` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationRequest {
    pub tracking_id: String,
    pub reason: String,
}

impl CancellationRequest {
    pub const DEFAULT_REASON: &'static str = "Order cancelled";

    /// Parses `trackingId[:reason]`. Returns `None` when there is no tracking ID.
    pub fn parse(text: &str) -> Option<Self> {
        let (tracking_id, reason) = match text.split_once(':') {
            Some((id, reason)) => (id, reason.trim()),
            None => (text, ""),
        };
        let tracking_id = tracking_id.trim();
        if tracking_id.is_empty() {
            return None;
        }

        let reason = if reason.is_empty() {
            Self::DEFAULT_REASON
        } else {
            reason
        };
        Some(Self {
            tracking_id: tracking_id.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// Published to `package-status` for every status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageStatusMessage {
    pub tracking_id: String,
    pub order_id: String,
    pub status: PackageStatus,
    pub previous_status: Option<PackageStatus>,
    pub location: Option<String>,
    pub carrier_id: Option<String>,
    pub estimated_delivery: Option<NaiveDateTime>,
    pub actual_delivery: Option<NaiveDateTime>,
    pub timestamp: NaiveDateTime,
    pub notes: Option<String>,
    pub source: String,
}

impl PackageStatusMessage {
    pub fn for_transition(
        package: &Package,
        previous: PackageStatus,
        notes: Option<String>,
    ) -> Self {
        Self {
            tracking_id: package.tracking_id.clone(),
            order_id: package.order_id.clone(),
            status: package.status,
            previous_status: Some(previous),
            location: package.current_location.clone(),
            carrier_id: package.carrier_id.clone(),
            estimated_delivery: package.expected_delivery_date,
            actual_delivery: package.actual_delivery_date,
            timestamp: now(),
            notes,
            source: SOURCE.to_string(),
        }
    }
}

/// Published to `warehouse-events` for every recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseEventMessage {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub tracking_id: Option<String>,
    pub order_id: Option<String>,
    pub location: Option<String>,
    pub description: String,
    pub timestamp: NaiveDateTime,
    pub source: String,
    pub metadata: Option<serde_json::Value>,
}

impl WarehouseEventMessage {
    /// An event that exists only on the bus, e.g. for an order that never became a package.
    pub fn detached(
        event_type: EventType,
        tracking_id: Option<String>,
        order_id: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            tracking_id,
            order_id,
            location: None,
            description: description.into(),
            timestamp: now(),
            source: SOURCE.to_string(),
            metadata: None,
        }
    }

    /// Partition key: tracking ID, falling back to the order ID.
    pub fn key(&self) -> &str {
        self.tracking_id
            .as_deref()
            .or(self.order_id.as_deref())
            .unwrap_or_default()
    }
}

impl From<&WarehouseEvent> for WarehouseEventMessage {
    fn from(event: &WarehouseEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event.event_type,
            tracking_id: Some(event.tracking_id.clone()),
            order_id: Some(event.order_id.clone()),
            location: event.location.clone(),
            description: event.description.clone(),
            timestamp: event.event_timestamp,
            source: event.source.clone(),
            metadata: None,
        }
    }
}
