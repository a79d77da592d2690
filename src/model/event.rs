use super::{now, Package, PackageStatus, SOURCE};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    OrderCreated,
    OrderUpdated,
    OrderCancelled,
    PackageStatusChanged,
    PackageAssigned,
    LocationUpdated,
    ErrorOccurred,
    OperationCompleted,
    InventoryUpdated,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::OrderCreated => "ORDER_CREATED",
            EventType::OrderUpdated => "ORDER_UPDATED",
            EventType::OrderCancelled => "ORDER_CANCELLED",
            EventType::PackageStatusChanged => "PACKAGE_STATUS_CHANGED",
            EventType::PackageAssigned => "PACKAGE_ASSIGNED",
            EventType::LocationUpdated => "LOCATION_UPDATED",
            EventType::ErrorOccurred => "ERROR_OCCURRED",
            EventType::OperationCompleted => "OPERATION_COMPLETED",
            EventType::InventoryUpdated => "INVENTORY_UPDATED",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit record of one transition or notable occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseEvent {
    pub event_type: EventType,
    pub tracking_id: String,
    pub order_id: String,
    pub previous_status: Option<PackageStatus>,
    pub new_status: Option<PackageStatus>,
    pub location: Option<String>,
    pub description: String,
    pub source: String,
    pub event_timestamp: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl WarehouseEvent {
    pub fn new(event_type: EventType, package: &Package, description: impl Into<String>) -> Self {
        let at = now();
        Self {
            event_type,
            tracking_id: package.tracking_id.clone(),
            order_id: package.order_id.clone(),
            previous_status: None,
            new_status: None,
            location: package.current_location.clone(),
            description: description.into(),
            source: SOURCE.to_string(),
            event_timestamp: at,
            created_at: at,
        }
    }

    pub fn with_transition(
        mut self,
        previous: Option<PackageStatus>,
        new: Option<PackageStatus>,
    ) -> Self {
        self.previous_status = previous;
        self.new_status = new;
        self
    }
}
