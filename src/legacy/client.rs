//! TCP client for the legacy line protocol: one connection per request.

use super::{LegacyError, LegacyGateway, RetryPolicy};
use crate::codec::{wire_timestamp, WireMessage};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySettings {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for LegacySettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9000,
            connect_timeout: Duration::from_millis(5000),
            read_timeout: Duration::from_millis(10_000),
        }
    }
}

impl LegacySettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Talks to the legacy system over short-lived TCP connections.
///
/// The sequence counter belongs to the client and is shared by every concurrent call made
/// through it. Each logical request gets its sequence number and timestamp once; retries
/// resend the identical line.
pub struct LegacyClient {
    settings: LegacySettings,
    retry: RetryPolicy,
    sequence: AtomicU64,
}

impl LegacyClient {
    pub fn new(settings: LegacySettings, retry: RetryPolicy) -> Self {
        Self {
            settings,
            retry,
            sequence: AtomicU64::new(1),
        }
    }

    pub fn settings(&self) -> &LegacySettings {
        &self.settings
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    async fn exchange(&self, line: &str) -> Result<WireMessage, LegacyError> {
        let addr = self.settings.address();
        let stream = timeout(self.settings.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| LegacyError::ConnectTimeout {
                addr: addr.clone(),
                timeout: self.settings.connect_timeout,
            })??;
        stream.set_nodelay(true)?;

        let (reader, mut writer) = stream.into_split();
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        let mut reader = BufReader::new(reader);
        let mut response = String::new();
        let read = timeout(self.settings.read_timeout, reader.read_line(&mut response))
            .await
            .map_err(|_| LegacyError::ReadTimeout(self.settings.read_timeout))??;
        if read == 0 {
            return Err(LegacyError::EmptyResponse);
        }

        let response = response.trim_end_matches(['\r', '\n']);
        debug!(response, "Received from WMS");
        Ok(WireMessage::decode(response)?)
    }
}

#[async_trait]
impl LegacyGateway for LegacyClient {
    #[instrument(skip(self, message), fields(sequence))]
    async fn send(&self, mut message: WireMessage) -> Result<WireMessage, LegacyError> {
        if message.sequence_number.is_none() {
            message.sequence_number = Some(self.next_sequence().to_string());
        }
        if message.timestamp.is_none() {
            message.timestamp = Some(wire_timestamp());
        }
        tracing::Span::current().record("sequence", message.sequence_number.as_deref());

        let encoded = message.encode();
        let line = encoded.as_str();
        debug!(line, "Sending to WMS");

        let response = self
            .retry
            .run(move |attempt| {
                debug!(attempt, "WMS exchange attempt");
                self.exchange(line)
            })
            .await?;

        info!(
            response_type = response.message_type.as_deref().unwrap_or(""),
            "WMS exchange completed"
        );
        Ok(response)
    }
}
