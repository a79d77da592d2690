//! Bus implementations that do not leave the process.

use super::{MessageBus, PublishError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

impl Published {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Records every message. Topics can be made to fail for error-path tests.
#[derive(Default)]
pub struct InMemoryBus {
    published: Mutex<Vec<Published>>,
    failing: Mutex<HashSet<String>>,
    notify: Notify,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later publish to `topic` fails.
    pub fn fail_topic(&self, topic: &str) {
        lock(&self.failing).insert(topic.to_string());
    }

    pub fn messages(&self, topic: &str) -> Vec<Published> {
        lock(&self.published)
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Published> {
        lock(&self.published).clone()
    }

    /// Waits until `topic` holds at least `count` messages or `timeout` passes, then returns
    /// what it holds.
    pub async fn wait_for(&self, topic: &str, count: usize, timeout: Duration) -> Vec<Published> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            let messages = self.messages(topic);
            if messages.len() >= count {
                return messages;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.messages(topic);
            }
        }
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        if lock(&self.failing).contains(topic) {
            return Err(PublishError::Rejected {
                topic: topic.to_string(),
                reason: "topic unavailable".to_string(),
            });
        }
        lock(&self.published).push(Published {
            topic: topic.to_string(),
            key: key.to_string(),
            payload,
        });
        self.notify.notify_waiters();
        Ok(())
    }
}

/// Logs each message instead of sending it.
pub struct LogBus;

#[async_trait]
impl MessageBus for LogBus {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        info!(topic, key, payload = %String::from_utf8_lossy(&payload), "Outbound message");
        Ok(())
    }
}
