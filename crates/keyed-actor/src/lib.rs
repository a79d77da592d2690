//! # Keyed Actor
//!
//! Building blocks for owning shared, keyed, mutable state with the actor model: one Tokio
//! task owns a `HashMap` of records and processes requests strictly one after another.
//! Callers talk to it through a cloneable [`ResourceClient`]. Two properties fall out of
//! this and the rest of the workspace leans on both:
//!
//! - **Single writer per key.** A read-modify-write inside an entity hook can never
//!   interleave with another request for the same record.
//! - **Independent shards.** Running several actors and routing keys by hash gives
//!   parallelism across keys without a global lock.
//!
//! ## Layers
//!
//! 1. **Entity** ([`ActorEntity`]): the record, its payload types and its hooks.
//! 2. **Runtime** ([`ResourceActor`]): the request loop.
//! 3. **Interface** ([`ResourceClient`], [`ActorClient`]): typed async calls.
//!
//! ## Example
//!
//! ```rust
//! use keyed_actor::{ActorEntity, FrameworkError, ResourceActor};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)]
//! struct Parcel { state: String }
//!
//! #[derive(Debug)] struct ParcelCreate;
//! #[derive(Debug)] struct ParcelUpdate { state: String }
//! #[derive(Debug)] enum ParcelAction {}
//! #[derive(Debug, thiserror::Error)] #[error("parcel error")] struct ParcelError;
//!
//! #[async_trait]
//! impl ActorEntity for Parcel {
//!     type Id = String;
//!     type Create = ParcelCreate;
//!     type Update = ParcelUpdate;
//!     type Action = ParcelAction;
//!     type ActionResult = ();
//!     type Context = ();
//!     type Error = ParcelError;
//!
//!     fn from_create_params(_id: String, _: ParcelCreate) -> Result<Self, Self::Error> {
//!         Ok(Self { state: "NEW".into() })
//!     }
//!
//!     async fn on_update(&mut self, update: ParcelUpdate, _: &()) -> Result<(), Self::Error> {
//!         self.state = update.state;
//!         Ok(())
//!     }
//!
//!     async fn handle_action(&mut self, action: ParcelAction, _: &()) -> Result<(), Self::Error> {
//!         match action {}
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = ResourceActor::<Parcel>::new(10);
//!     tokio::spawn(actor.run(()));
//!
//!     let id = client.create("TRK-1".into(), ParcelCreate).await.unwrap();
//!     let parcel = client.update(id.clone(), ParcelUpdate { state: "PICKED".into() }).await.unwrap();
//!     assert_eq!(parcel.state, "PICKED");
//!
//!     // Keys are caller-assigned and unique.
//!     let again = client.create(id, ParcelCreate).await;
//!     assert!(matches!(again, Err(FrameworkError::AlreadyExists(_))));
//! }
//! ```
//!
//! ## Failed hooks
//!
//! `Update` and `Action` hooks run against a copy of the record that only replaces the
//! stored one when the hook returns `Ok`. An entity can therefore validate late in a hook
//! and bail out without having to undo partial mutations.
//!
//! ## Testing
//!
//! See [`mock`] for an expectation-driven client that needs no running actor.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod tracing;

pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
