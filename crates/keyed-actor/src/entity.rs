//! # ActorEntity Trait
//!
//! The contract a record type implements to be owned by a [`ResourceActor`](crate::ResourceActor).
//! Associated types pin down the key, the payloads accepted for creation, updates and
//! custom actions, and the per-entity error type. The actor calls the hooks below while it
//! holds exclusive access to the record, so every hook body is an atomic read-modify-write
//! for that key.
//!
//! Keys are supplied by the caller on creation. Entities in this workspace are keyed by
//! identifiers assigned elsewhere (tracking IDs), so the actor never mints ids itself.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any record must implement to be managed by `ResourceActor`.
///
/// # Async & Context
/// Hooks are `async` so they may call other actors. The `Context` associated type is
/// injected into every hook by `ResourceActor::run`, which lets dependencies be bound after
/// the actor is constructed.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The externally assigned key of the record.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// Payload used to build a new record.
    type Create: Send + Sync + Debug;

    /// Payload used to mutate an existing record.
    type Update: Send + Sync + Debug;

    /// Record-specific operations that return something other than the record itself.
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// Runtime dependencies injected into the actor. Use `()` if none are needed.
    type Context: Send + Sync;

    /// One error enum per entity, shared by every hook.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build the record from its key and payload.
    /// Called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks (Async) ---

    /// Called after the record is built and before it is stored.
    /// Returning an error discards the record.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received for an existing record.
    async fn on_update(
        &mut self,
        update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    // --- Action Handler (Async) ---

    /// Handle a custom record-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
