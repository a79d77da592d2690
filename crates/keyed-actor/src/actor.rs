//! # Generic Actor Server
//!
//! `ResourceActor` owns a keyed collection of records and processes requests one at a time.
//! Sequential processing is what gives callers single-writer-per-key semantics without any
//! `Mutex` around the store.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The generic actor that manages a collection of records.
///
/// # Usage Pattern
///
/// 1.  **Create**: `ResourceActor::new()` returns the actor (server) and a client.
/// 2.  **Wire**: pass dependencies into `actor.run(context)`.
/// 3.  **Run**: spawn the run loop in a background task.
///
/// ```rust
/// use keyed_actor::{ActorEntity, ResourceActor};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)] struct Counter { hits: u32 }
/// #[derive(Debug)] struct Start;
/// #[derive(Debug)] struct Hit;
/// #[derive(Debug)] enum CounterAction { Read }
/// #[derive(Debug, thiserror::Error)] #[error("counter error")] struct CounterError;
///
/// #[async_trait]
/// impl ActorEntity for Counter {
///     type Id = String;
///     type Create = Start;
///     type Update = Hit;
///     type Action = CounterAction;
///     type ActionResult = u32;
///     type Context = ();
///     type Error = CounterError;
///
///     fn from_create_params(_id: String, _: Start) -> Result<Self, Self::Error> { Ok(Self { hits: 0 }) }
///     async fn on_update(&mut self, _: Hit, _: &()) -> Result<(), Self::Error> { self.hits += 1; Ok(()) }
///     async fn handle_action(&mut self, _: CounterAction, _: &()) -> Result<u32, Self::Error> { Ok(self.hits) }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = ResourceActor::<Counter>::new(10);
///     tokio::spawn(actor.run(()));
///
///     let id = client.create("page-1".to_string(), Start).await.unwrap();
///     client.update(id.clone(), Hit).await.unwrap();
///     assert_eq!(client.perform_action(id, CounterAction::Read).await.unwrap(), 1);
/// }
/// ```
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    records: HashMap<T::Id, T>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `buffer_size` is the capacity of the request channel; callers wait for space when it
    /// is full.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            records: HashMap::new(),
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Runs the actor's event loop until every client has been dropped.
    ///
    /// The `context` argument is handed to every entity hook.
    pub async fn run(mut self, context: T::Context) {
        let kind = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or("Unknown");
        info!(kind, "Actor started");

        while let Some(request) = self.receiver.recv().await {
            match request {
                ResourceRequest::Create {
                    id,
                    params,
                    respond_to,
                } => {
                    let result = self.create(kind, id, params, &context).await;
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Get { id, respond_to } => {
                    let record = self.records.get(&id).cloned();
                    debug!(kind, %id, found = record.is_some(), "Get");
                    let _ = respond_to.send(Ok(record));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(kind, %id, ?update, "Update");
                    let result = match self.draft(kind, &id) {
                        Ok(mut draft) => {
                            let hooked = draft.on_update(update, &context).await;
                            self.settle(kind, &id, draft, hooked).map(|(record, ())| record)
                        }
                        Err(e) => Err(e),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(kind, %id, ?action, "Action");
                    let result = match self.draft(kind, &id) {
                        Ok(mut draft) => {
                            let hooked = draft.handle_action(action, &context).await;
                            self.settle(kind, &id, draft, hooked).map(|(_, outcome)| outcome)
                        }
                        Err(e) => Err(e),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Len { respond_to } => {
                    let _ = respond_to.send(Ok(self.records.len()));
                }
                ResourceRequest::List { respond_to } => {
                    debug!(kind, size = self.records.len(), "List");
                    let _ = respond_to.send(Ok(self.records.values().cloned().collect()));
                }
            }
        }

        info!(kind, size = self.records.len(), "Actor stopped");
    }

    async fn create(
        &mut self,
        kind: &str,
        id: T::Id,
        params: T::Create,
        context: &T::Context,
    ) -> Result<T::Id, FrameworkError> {
        debug!(kind, %id, ?params, "Create");
        if self.records.contains_key(&id) {
            warn!(kind, %id, "Already exists");
            return Err(FrameworkError::AlreadyExists(id.to_string()));
        }

        let mut record = T::from_create_params(id.clone(), params).map_err(|e| {
            warn!(kind, %id, error = %e, "Create rejected");
            FrameworkError::EntityError(Box::new(e))
        })?;
        if let Err(e) = record.on_create(context).await {
            warn!(kind, %id, error = %e, "on_create failed");
            return Err(FrameworkError::EntityError(Box::new(e)));
        }

        self.records.insert(id.clone(), record);
        info!(kind, %id, size = self.records.len(), "Created");
        Ok(id)
    }

    /// Hooks run against a copy so a failed hook leaves the stored record untouched.
    fn draft(&self, kind: &str, id: &T::Id) -> Result<T, FrameworkError> {
        self.records.get(id).cloned().ok_or_else(|| {
            warn!(kind, %id, "Not found");
            FrameworkError::NotFound(id.to_string())
        })
    }

    /// Stores the draft if its hook succeeded.
    fn settle<R>(
        &mut self,
        kind: &str,
        id: &T::Id,
        draft: T,
        hooked: Result<R, T::Error>,
    ) -> Result<(T, R), FrameworkError> {
        match hooked {
            Ok(outcome) => {
                self.records.insert(id.clone(), draft.clone());
                debug!(kind, %id, "Committed");
                Ok((draft, outcome))
            }
            Err(e) => {
                warn!(kind, %id, error = %e, "Hook failed, record unchanged");
                Err(FrameworkError::EntityError(Box::new(e)))
            }
        }
    }
}
