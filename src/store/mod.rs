//! # Package Store
//!
//! Keyed storage of packages and their events. [`PackageStore`] is the seam the
//! orchestrator depends on; [`ShardedStore`] implements it with record actors.
//!
//! A package mutation and the event it produces are written by one call
//! ([`PackageStore::insert`], [`PackageStore::transition`]) and so commit together.

pub mod record;
pub mod sharded;

pub use record::{PackageRecord, RecordError, Transition, Transitioned};
pub use sharded::ShardedStore;

use crate::model::{Package, PackageStatus, WarehouseEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Package already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid state for {tracking_id}: {reason}")]
    InvalidState {
        tracking_id: String,
        status: PackageStatus,
        reason: String,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<RecordError> for StoreError {
    fn from(e: RecordError) -> Self {
        let reason = e.to_string();
        match e {
            RecordError::Forbidden {
                tracking_id,
                status,
                ..
            }
            | RecordError::Unexpected {
                tracking_id,
                actual: status,
                ..
            } => StoreError::InvalidState {
                tracking_id,
                status,
                reason,
            },
            RecordError::KeyMismatch { key, .. } => StoreError::Unavailable(format!("{key}: {reason}")),
        }
    }
}

#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Stores a new package with its creation event.
    async fn insert(&self, package: Package, event: WarehouseEvent) -> Result<(), StoreError>;

    async fn find(&self, tracking_id: &str) -> Result<Option<Package>, StoreError>;

    /// Applies a status change and records its event in one step.
    async fn transition(
        &self,
        tracking_id: &str,
        transition: Transition,
    ) -> Result<Transitioned, StoreError>;

    /// Records an event without changing the package.
    async fn append_event(&self, tracking_id: &str, event: WarehouseEvent) -> Result<(), StoreError>;

    /// Events for a package, most recent first.
    async fn events(&self, tracking_id: &str) -> Result<Vec<WarehouseEvent>, StoreError>;

    async fn all(&self) -> Result<Vec<Package>, StoreError>;

    async fn exists(&self, tracking_id: &str) -> Result<bool, StoreError> {
        Ok(self.find(tracking_id).await?.is_some())
    }

    async fn find_by_status(&self, status: PackageStatus) -> Result<Vec<Package>, StoreError> {
        Ok(select(self.all().await?, |p| p.status == status))
    }

    async fn find_by_customer(&self, customer_id: &str) -> Result<Vec<Package>, StoreError> {
        Ok(select(self.all().await?, |p| {
            p.customer_id.as_deref() == Some(customer_id)
        }))
    }

    async fn find_by_order(&self, order_id: &str) -> Result<Option<Package>, StoreError> {
        Ok(select(self.all().await?, |p| p.order_id == order_id)
            .into_iter()
            .next())
    }

    async fn count_by_status(&self) -> Result<HashMap<PackageStatus, usize>, StoreError> {
        let mut counts = HashMap::new();
        for package in self.all().await? {
            *counts.entry(package.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

/// Packages accepted by `keep`, oldest first.
fn select(packages: Vec<Package>, keep: impl Fn(&Package) -> bool) -> Vec<Package> {
    let mut selected: Vec<Package> = packages.into_iter().filter(|p| keep(p)).collect();
    selected.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    selected
}
