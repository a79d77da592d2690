//! Request dispatch for the simulated legacy system.

use super::ledger::{LedgerClient, LedgerEntry, LedgerError, LedgerStatus};
use super::ProgressionSchedule;
use crate::codec::{kind, operation, wire_timestamp, WireMessage};
use keyed_actor::ActorClient;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Answers protocol lines and starts background progressions for new packages.
#[derive(Clone)]
pub struct Dispatcher {
    ledger: LedgerClient,
    schedule: ProgressionSchedule,
    progressions: TaskTracker,
    shutdown: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        ledger: LedgerClient,
        schedule: ProgressionSchedule,
        progressions: TaskTracker,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            ledger,
            schedule,
            progressions,
            shutdown,
        }
    }

    /// Produces the reply to one raw line. Never fails: any problem becomes an `ERROR` reply.
    pub async fn handle_line(&self, line: &str) -> WireMessage {
        let request = match WireMessage::decode(line) {
            Ok(request) => request,
            Err(e) => {
                warn!(line, error = %e, "Undecodable request");
                return WireMessage::new(kind::ERROR)
                    .with_data(format!("Invalid message format: {e}"))
                    .with_timestamp(wire_timestamp());
            }
        };

        match self.dispatch(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(line, error = %e, "Error processing message");
                error_reply(&request, format!("Error processing message: {e}"))
            }
        }
    }

    async fn dispatch(&self, request: &WireMessage) -> Result<WireMessage, LedgerError> {
        let message_type = upper(&request.message_type);
        let op = upper(&request.operation);
        info!(%message_type, operation = %op, "Processing message");

        match message_type.as_str() {
            kind::ORDER => match op.as_str() {
                operation::CREATE => self.create(request).await,
                operation::CANCEL => self.cancel(request).await,
                _ => Ok(error_reply(
                    request,
                    format!("Unknown order operation: {}", display(&request.operation)),
                )),
            },
            kind::QUERY => self.query(request).await,
            kind::PING => Ok(WireMessage {
                message_type: Some(kind::PONG.to_string()),
                sequence_number: request.sequence_number.clone(),
                data: Some("Mock WMS Server is running".to_string()),
                timestamp: Some(wire_timestamp()),
                ..WireMessage::default()
            }),
            _ => Ok(error_reply(
                request,
                format!("Unknown message type: {}", display(&request.message_type)),
            )),
        }
    }

    async fn create(&self, request: &WireMessage) -> Result<WireMessage, LedgerError> {
        let Some(tracking_id) = request.tracking_id.as_deref() else {
            return Ok(error_reply(request, "Missing tracking ID"));
        };

        let entry = LedgerEntry {
            order_id: request.order_id.clone(),
            location: request.location.clone(),
        };
        if self.ledger.register(tracking_id, entry).await? {
            info!(tracking_id, order_id = ?request.order_id, "Created simulated package");
            self.start_progression(tracking_id.to_string());
        }

        Ok(WireMessage {
            message_type: Some(kind::ACK.to_string()),
            sequence_number: request.sequence_number.clone(),
            tracking_id: Some(tracking_id.to_string()),
            order_id: request.order_id.clone(),
            status: Some("ACCEPTED".to_string()),
            data: Some("Order created successfully".to_string()),
            timestamp: Some(wire_timestamp()),
            ..WireMessage::default()
        })
    }

    async fn cancel(&self, request: &WireMessage) -> Result<WireMessage, LedgerError> {
        let tracking_id = display(&request.tracking_id);
        match self.ledger.cancel(tracking_id).await {
            Ok(_) => {
                info!(tracking_id, "Cancelled simulated package");
                Ok(WireMessage {
                    message_type: Some(kind::ACK.to_string()),
                    sequence_number: request.sequence_number.clone(),
                    tracking_id: request.tracking_id.clone(),
                    order_id: request.order_id.clone(),
                    status: Some(LedgerStatus::Cancelled.to_string()),
                    data: Some("Order cancelled successfully".to_string()),
                    timestamp: Some(wire_timestamp()),
                    ..WireMessage::default()
                })
            }
            Err(LedgerError::NotFound(_)) => Ok(not_found(request)),
            Err(e) => Err(e),
        }
    }

    async fn query(&self, request: &WireMessage) -> Result<WireMessage, LedgerError> {
        let tracking_id = display(&request.tracking_id);
        let Some(record) = self.ledger.get(tracking_id.to_string()).await? else {
            return Ok(not_found(request));
        };

        Ok(WireMessage {
            message_type: Some(kind::STATUS.to_string()),
            sequence_number: request.sequence_number.clone(),
            tracking_id: Some(record.tracking_id),
            order_id: record.order_id,
            status: Some(record.status.to_string()),
            location: record.location,
            data: Some("Package status query".to_string()),
            timestamp: Some(wire_timestamp()),
            ..WireMessage::default()
        })
    }

    fn start_progression(&self, tracking_id: String) {
        let ledger = self.ledger.clone();
        let stages = self.schedule.stages.clone();
        let shutdown = self.shutdown.clone();

        self.progressions.spawn(async move {
            for (delay, status) in stages {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!(%tracking_id, "Progression abandoned");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                match ledger.advance(&tracking_id, status).await {
                    Ok(_) => info!(%tracking_id, %status, "Simulated status change"),
                    Err(e) => {
                        debug!(%tracking_id, error = %e, "Progression stopped");
                        return;
                    }
                }
            }
        });
    }
}

fn upper(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().to_ascii_uppercase()
}

fn display(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

fn not_found(request: &WireMessage) -> WireMessage {
    error_reply(
        request,
        format!("Package not found: {}", display(&request.tracking_id)),
    )
}

fn error_reply(request: &WireMessage, message: impl Into<String>) -> WireMessage {
    WireMessage {
        message_type: Some(kind::ERROR.to_string()),
        sequence_number: request.sequence_number.clone(),
        tracking_id: request.tracking_id.clone(),
        order_id: request.order_id.clone(),
        data: Some(message.into()),
        timestamp: Some(wire_timestamp()),
        ..WireMessage::default()
    }
}
