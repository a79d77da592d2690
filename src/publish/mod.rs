//! # Outbound Publication
//!
//! Status and event notifications leave the service through a [`MessageBus`]. The bus
//! transport itself lives elsewhere; [`InMemoryBus`] and [`LogBus`] stand in for it.
//!
//! [`EventPublisher`] publishes after the store has committed, on background lanes that
//! keep per-key order, and only logs failures: a lost notification never undoes a recorded
//! transition.

pub mod memory;

pub use memory::{InMemoryBus, LogBus, Published};

use crate::model::{now, PackageStatusMessage, WarehouseEventMessage};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Bus rejected message for {topic}: {reason}")]
    Rejected { topic: String, reason: String },
}

#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

/// Topic names used by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSettings {
    pub orders: String,
    pub cancellations: String,
    pub package_status: String,
    pub warehouse_events: String,
    pub dead_letter: String,
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            orders: "orders".to_string(),
            cancellations: "order-cancellations".to_string(),
            package_status: "package-status".to_string(),
            warehouse_events: "warehouse-events".to_string(),
            dead_letter: "wms-dead-letter".to_string(),
        }
    }
}

/// An inbound message that could not be processed within its delivery budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub source_topic: String,
    pub payload: String,
    pub error: String,
    pub attempts: u32,
    pub timestamp: NaiveDateTime,
}

impl DeadLetter {
    pub fn new(source_topic: &str, payload: &[u8], error: impl Into<String>, attempts: u32) -> Self {
        Self {
            source_topic: source_topic.to_string(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            error: error.into(),
            attempts,
            timestamp: now(),
        }
    }
}

/// Number of ordered publication lanes.
const LANES: usize = 8;

enum Outbound {
    Message {
        topic: String,
        key: String,
        payload: Vec<u8>,
    },
    Flush(oneshot::Sender<()>),
}

/// Publishes outbound messages in the background.
///
/// Keys are hashed onto a fixed set of lanes, each drained by one task, so messages sharing a
/// key reach the bus in the order they were published. Lane tasks exit once every clone of
/// the publisher is dropped.
#[derive(Clone)]
pub struct EventPublisher {
    lanes: Arc<Vec<mpsc::UnboundedSender<Outbound>>>,
    topics: Arc<TopicSettings>,
}

impl EventPublisher {
    /// Spawns the lane tasks; must be called inside a Tokio runtime.
    pub fn new(bus: Arc<dyn MessageBus>, topics: TopicSettings) -> Self {
        let lanes = (0..LANES)
            .map(|lane| {
                let (sender, receiver) = mpsc::unbounded_channel();
                tokio::spawn(drain_lane(lane, bus.clone(), receiver));
                sender
            })
            .collect();
        Self {
            lanes: Arc::new(lanes),
            topics: Arc::new(topics),
        }
    }

    pub fn topics(&self) -> &TopicSettings {
        &self.topics
    }

    pub fn publish_status(&self, message: &PackageStatusMessage) {
        self.dispatch(&self.topics.package_status, &message.tracking_id, message);
    }

    pub fn publish_event(&self, message: &WarehouseEventMessage) {
        self.dispatch(&self.topics.warehouse_events, message.key(), message);
    }

    pub fn publish_dead_letter(&self, key: &str, letter: &DeadLetter) {
        self.dispatch(&self.topics.dead_letter, key, letter);
    }

    /// Waits until every message published so far has been handed to the bus.
    pub async fn flush(&self) {
        for lane in self.lanes.iter() {
            let (done, flushed) = oneshot::channel();
            if lane.send(Outbound::Flush(done)).is_ok() {
                let _ = flushed.await;
            }
        }
    }

    fn lane(&self, key: &str) -> &mpsc::UnboundedSender<Outbound> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.lanes[(hasher.finish() % self.lanes.len() as u64) as usize]
    }

    fn dispatch<T: Serialize>(&self, topic: &str, key: &str, message: &T) {
        let payload = match serde_json::to_vec(message) {
            Ok(payload) => payload,
            Err(e) => {
                error!(topic, key, error = %e, "Failed to serialize outbound message");
                return;
            }
        };

        let outbound = Outbound::Message {
            topic: topic.to_string(),
            key: key.to_string(),
            payload,
        };
        if self.lane(key).send(outbound).is_err() {
            error!(topic, key, "Publication lane closed, message dropped");
        }
    }
}

async fn drain_lane(
    lane: usize,
    bus: Arc<dyn MessageBus>,
    mut receiver: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(outbound) = receiver.recv().await {
        match outbound {
            Outbound::Message {
                topic,
                key,
                payload,
            } => match bus.publish(&topic, &key, payload).await {
                Ok(()) => debug!(lane, %topic, %key, "Published"),
                Err(e) => error!(lane, %topic, %key, error = %e, "Failed to publish"),
            },
            Outbound::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!(lane, "Publication lane stopped");
}
