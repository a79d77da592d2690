//! # Generic Messages
//!
//! Request envelope exchanged between [`ResourceClient`](crate::ResourceClient) and
//! [`ResourceActor`](crate::ResourceActor). Every variant carries a oneshot sender the actor
//! uses to reply.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Requests understood by a `ResourceActor`.
///
/// - **Create**: insert a new record under a caller-supplied key. Fails if the key exists.
/// - **Get**: read a clone of the record.
/// - **Update**: apply an [`ActorEntity::Update`] payload and return the new state.
/// - **Action**: run an [`ActorEntity::Action`] and return its typed result.
/// - **Len** / **List**: whole-store reads used for counts and secondary queries.
///
/// There is no delete: records owned by these actors are retained for audit.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        id: T::Id,
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
    Len {
        respond_to: Response<usize>,
    },
    List {
        respond_to: Response<Vec<T>>,
    },
}
