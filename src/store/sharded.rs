//! [`PackageStore`] backed by a fixed set of record actors.
//!
//! Tracking IDs are hashed onto shards. Requests for one package always reach the same
//! actor and are applied in order; different shards work in parallel.

use super::record::{EventAppend, NewRecord, PackageRecord, RecordAction, RecordError};
use super::{PackageStore, StoreError, Transition, Transitioned};
use crate::model::{Package, WarehouseEvent};
use async_trait::async_trait;
use keyed_actor::{FrameworkError, ResourceActor, ResourceClient};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct ShardedStore {
    shards: Vec<ResourceClient<PackageRecord>>,
}

impl ShardedStore {
    /// Creates `shards` record actors (at least one) and a store routing to them.
    /// The caller spawns the actors.
    pub fn new(shards: usize, buffer: usize) -> (Vec<ResourceActor<PackageRecord>>, Self) {
        let (actors, clients): (Vec<_>, Vec<_>) = (0..shards.max(1))
            .map(|_| super::record::new(buffer))
            .unzip();
        (actors, Self { shards: clients })
    }

    /// Routes to existing shard clients. Returns `None` if `shards` is empty.
    pub fn from_clients(shards: Vec<ResourceClient<PackageRecord>>) -> Option<Self> {
        (!shards.is_empty()).then_some(Self { shards })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_index(&self, tracking_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        tracking_id.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    fn shard(&self, tracking_id: &str) -> &ResourceClient<PackageRecord> {
        &self.shards[self.shard_index(tracking_id)]
    }

    async fn record(&self, tracking_id: &str) -> Result<PackageRecord, StoreError> {
        self.shard(tracking_id)
            .get(tracking_id.to_string())
            .await
            .map_err(map_error)?
            .ok_or_else(|| StoreError::NotFound(tracking_id.to_string()))
    }
}

fn map_error(e: FrameworkError) -> StoreError {
    if let Some(inner) = e.entity_error::<RecordError>() {
        return inner.clone().into();
    }
    match e {
        FrameworkError::NotFound(id) => StoreError::NotFound(id),
        FrameworkError::AlreadyExists(id) => StoreError::AlreadyExists(id),
        other => StoreError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl PackageStore for ShardedStore {
    #[instrument(skip(self, package, event), fields(tracking_id = %package.tracking_id))]
    async fn insert(&self, package: Package, event: WarehouseEvent) -> Result<(), StoreError> {
        let tracking_id = package.tracking_id.clone();
        self.shard(&tracking_id)
            .create(tracking_id.clone(), NewRecord { package, event })
            .await
            .map_err(map_error)?;
        debug!("Package stored");
        Ok(())
    }

    async fn find(&self, tracking_id: &str) -> Result<Option<Package>, StoreError> {
        let record = self
            .shard(tracking_id)
            .get(tracking_id.to_string())
            .await
            .map_err(map_error)?;
        Ok(record.map(|r| r.package))
    }

    #[instrument(skip(self, transition), fields(new_status = %transition.new_status))]
    async fn transition(
        &self,
        tracking_id: &str,
        transition: Transition,
    ) -> Result<Transitioned, StoreError> {
        self.shard(tracking_id)
            .perform_action(tracking_id.to_string(), RecordAction::Transition(transition))
            .await
            .map_err(map_error)
    }

    async fn append_event(&self, tracking_id: &str, event: WarehouseEvent) -> Result<(), StoreError> {
        self.shard(tracking_id)
            .update(tracking_id.to_string(), EventAppend(event))
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn events(&self, tracking_id: &str) -> Result<Vec<WarehouseEvent>, StoreError> {
        let mut events = self.record(tracking_id).await?.events;
        events.reverse();
        Ok(events)
    }

    async fn all(&self) -> Result<Vec<Package>, StoreError> {
        let mut packages = Vec::new();
        for shard in &self.shards {
            let records = shard.list().await.map_err(map_error)?;
            packages.extend(records.into_iter().map(|r| r.package));
        }
        Ok(packages)
    }
}
