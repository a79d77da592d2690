use super::{LedgerAction, LedgerAdvance, LedgerEntry, LedgerError, LedgerStatus, SimulatedPackage};
use async_trait::async_trait;
use keyed_actor::{ActorClient, FrameworkError, ResourceClient};
use tracing::{debug, instrument};

/// Typed handle to the simulator's ledger actor.
#[derive(Clone)]
pub struct LedgerClient {
    inner: ResourceClient<SimulatedPackage>,
}

impl LedgerClient {
    pub fn new(inner: ResourceClient<SimulatedPackage>) -> Self {
        Self { inner }
    }

    /// Adds a package. Returns `false` if the tracking ID was already known, in which case
    /// the existing record is left alone.
    #[instrument(skip(self, entry))]
    pub async fn register(&self, tracking_id: &str, entry: LedgerEntry) -> Result<bool, LedgerError> {
        match self.inner.create(tracking_id.to_string(), entry).await {
            Ok(_) => Ok(true),
            Err(FrameworkError::AlreadyExists(_)) => {
                debug!("Package already known");
                Ok(false)
            }
            Err(e) => Err(Self::map_error(e)),
        }
    }

    pub async fn advance(
        &self,
        tracking_id: &str,
        status: LedgerStatus,
    ) -> Result<SimulatedPackage, LedgerError> {
        self.inner
            .update(tracking_id.to_string(), LedgerAdvance { status })
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, tracking_id: &str) -> Result<SimulatedPackage, LedgerError> {
        self.inner
            .perform_action(tracking_id.to_string(), LedgerAction::Cancel)
            .await
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl ActorClient<SimulatedPackage> for LedgerClient {
    type Error = LedgerError;

    fn inner(&self) -> &ResourceClient<SimulatedPackage> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        if let Some(inner) = e.entity_error::<LedgerError>() {
            return inner.clone();
        }
        match e {
            FrameworkError::NotFound(id) => LedgerError::NotFound(id),
            other => LedgerError::Unavailable(other.to_string()),
        }
    }
}
