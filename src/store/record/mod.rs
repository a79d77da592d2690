//! Package record actor: one package plus its audit trail.

pub mod entity;
pub mod error;

pub use entity::*;
pub use error::RecordError;

use keyed_actor::{ResourceActor, ResourceClient};

/// Creates one store shard and its client.
pub fn new(buffer: usize) -> (ResourceActor<PackageRecord>, ResourceClient<PackageRecord>) {
    ResourceActor::new(buffer)
}
