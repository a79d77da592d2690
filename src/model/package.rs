use super::{now, OrderMessage, PackageStatus};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A tracked shipment, keyed by its externally assigned tracking ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub tracking_id: String,
    pub order_id: String,
    pub status: PackageStatus,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub current_location: Option<String>,
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    pub customer_id: Option<String>,
    pub carrier_id: Option<String>,
    pub expected_delivery_date: Option<NaiveDateTime>,
    pub actual_delivery_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Package {
    /// A freshly received package built from an inbound order.
    ///
    /// The package starts at its origin; special instructions become the initial notes.
    pub fn received(tracking_id: &str, order_id: &str, order: &OrderMessage) -> Self {
        let created = now();
        Self {
            tracking_id: tracking_id.to_string(),
            order_id: order_id.to_string(),
            status: PackageStatus::Received,
            origin: order.origin.clone(),
            destination: order.destination.clone(),
            current_location: order.origin.clone(),
            weight: order.weight,
            dimensions: order.dimensions.clone(),
            customer_id: order.customer_id.clone(),
            carrier_id: None,
            expected_delivery_date: order.expected_delivery_date,
            actual_delivery_date: None,
            notes: order.special_instructions.clone(),
            created_at: created,
            updated_at: created,
        }
    }

    /// Moves the package to `status` at time `at`.
    ///
    /// Location and notes are only overwritten when given. `actual_delivery_date` is set
    /// exactly when the new status is `DELIVERED`, and `updated_at` always moves forward.
    pub fn apply_status(
        &mut self,
        status: PackageStatus,
        location: Option<String>,
        notes: Option<String>,
        at: NaiveDateTime,
    ) {
        self.status = status;
        if location.is_some() {
            self.current_location = location;
        }
        if notes.is_some() {
            self.notes = notes;
        }
        self.actual_delivery_date = (status == PackageStatus::Delivered).then_some(at);
        self.touch(at);
    }

    fn touch(&mut self, at: NaiveDateTime) {
        let floor = self.updated_at + Duration::microseconds(1);
        self.updated_at = at.max(floor);
    }
}
