//! [`ActorEntity`] implementation for [`SimulatedPackage`].

use super::LedgerError;
use crate::model::now;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use keyed_actor::ActorEntity;
use std::fmt;

/// Statuses the simulated legacy system reports on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerStatus {
    Processing,
    Picked,
    Packed,
    Shipped,
    Delivered,
    Cancelled,
}

impl LedgerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerStatus::Processing => "PROCESSING",
            LedgerStatus::Picked => "PICKED",
            LedgerStatus::Packed => "PACKED",
            LedgerStatus::Shipped => "SHIPPED",
            LedgerStatus::Delivered => "DELIVERED",
            LedgerStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The legacy system's own view of a package.
#[derive(Debug, Clone)]
pub struct SimulatedPackage {
    pub tracking_id: String,
    pub order_id: Option<String>,
    pub status: LedgerStatus,
    pub location: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug)]
pub struct LedgerEntry {
    pub order_id: Option<String>,
    pub location: Option<String>,
}

/// Moves a package to the next stage of its progression.
#[derive(Debug)]
pub struct LedgerAdvance {
    pub status: LedgerStatus,
}

#[derive(Debug)]
pub enum LedgerAction {
    Cancel,
}

#[async_trait]
impl ActorEntity for SimulatedPackage {
    type Id = String;
    type Create = LedgerEntry;
    type Update = LedgerAdvance;
    type Action = LedgerAction;
    type ActionResult = SimulatedPackage;
    type Context = ();
    type Error = LedgerError;

    fn from_create_params(id: String, params: LedgerEntry) -> Result<Self, Self::Error> {
        let created = now();
        Ok(Self {
            tracking_id: id,
            order_id: params.order_id,
            status: LedgerStatus::Processing,
            location: params.location,
            created_at: created,
            updated_at: created,
        })
    }

    /// Cancelled packages never progress further.
    async fn on_update(&mut self, update: LedgerAdvance, _ctx: &()) -> Result<(), Self::Error> {
        if self.status == LedgerStatus::Cancelled {
            return Err(LedgerError::Cancelled(self.tracking_id.clone()));
        }
        self.status = update.status;
        self.updated_at = now();
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: LedgerAction,
        _ctx: &(),
    ) -> Result<SimulatedPackage, Self::Error> {
        match action {
            LedgerAction::Cancel => {
                self.status = LedgerStatus::Cancelled;
                self.updated_at = now();
                Ok(self.clone())
            }
        }
    }
}
