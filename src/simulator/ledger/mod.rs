//! In-memory ledger of the packages the simulated legacy system knows about.
//!
//! Owned by one actor for the simulator's lifetime, so per-package read-modify-write is
//! atomic while connections and progression tasks hit it concurrently.

pub mod client;
pub mod entity;
pub mod error;

pub use client::LedgerClient;
pub use entity::*;
pub use error::LedgerError;

use keyed_actor::ResourceActor;

/// Creates the ledger actor and its client.
pub fn new(buffer: usize) -> (ResourceActor<SimulatedPackage>, LedgerClient) {
    let (actor, client) = ResourceActor::new(buffer);
    (actor, LedgerClient::new(client))
}
