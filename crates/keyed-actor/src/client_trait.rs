//! # ActorClient Trait
//!
//! Common surface for record-specific client wrappers: each wrapper exposes its inner
//! [`ResourceClient`] and a mapping into its own error type, and gets `get` and `count`
//! for free.
use crate::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for record-specific clients to inherit the standard reads.
///
/// ```rust
/// use keyed_actor::{ActorClient, ActorEntity, FrameworkError, ResourceClient};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Slot { taken: bool }
/// #[derive(Debug)] struct SlotCreate;
/// #[derive(Debug)] struct SlotUpdate;
/// #[derive(Debug)] enum SlotAction {}
/// #[derive(Debug, thiserror::Error)] #[error("slot error: {0}")] struct SlotError(String);
///
/// #[async_trait]
/// impl ActorEntity for Slot {
///     type Id = String; type Create = SlotCreate; type Update = SlotUpdate;
///     type Action = SlotAction; type ActionResult = (); type Context = (); type Error = SlotError;
///     fn from_create_params(_: String, _: SlotCreate) -> Result<Self, Self::Error> { Ok(Self { taken: false }) }
///     async fn on_update(&mut self, _: SlotUpdate, _: &()) -> Result<(), Self::Error> { Ok(()) }
///     async fn handle_action(&mut self, a: SlotAction, _: &()) -> Result<(), Self::Error> { match a {} }
/// }
///
/// struct SlotClient { inner: ResourceClient<Slot> }
///
/// #[async_trait]
/// impl ActorClient<Slot> for SlotClient {
///     type Error = SlotError;
///     fn inner(&self) -> &ResourceClient<Slot> { &self.inner }
///     fn map_error(e: FrameworkError) -> SlotError { SlotError(e.to_string()) }
/// }
///
/// async fn usage(client: SlotClient) {
///     let _ = client.get("a-1".to_string()).await;
///     let _ = client.count().await;
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The record-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the record-specific error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch a record by key.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Number of records held by the actor.
    async fn count(&self) -> Result<usize, Self::Error> {
        self.inner().len().await.map_err(Self::map_error)
    }
}
