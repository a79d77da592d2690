use crate::legacy::{LegacySettings, RetryPolicy};
use crate::publish::TopicSettings;
use crate::simulator::{ProgressionSchedule, SimulatorSettings};
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Service configuration, read from `WMS_`-prefixed environment variables
/// (`WMS_LEGACY_PORT=9100`, `WMS_SIMULATOR_ENABLED=true`, ...).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AdapterConfig {
    // Legacy system
    #[serde(default = "default_legacy_host")]
    pub legacy_host: String,

    #[serde(default = "default_legacy_port")]
    pub legacy_port: u16,

    #[serde(default = "default_connect_timeout_ms")]
    pub legacy_connect_timeout_ms: u64,

    #[serde(default = "default_read_timeout_ms")]
    pub legacy_read_timeout_ms: u64,

    /// Attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub legacy_max_attempts: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub legacy_retry_delay_ms: u64,

    #[serde(default = "default_retry_multiplier")]
    pub legacy_retry_multiplier: f64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub legacy_retry_max_delay_ms: u64,

    // Topics
    #[serde(default = "default_orders_topic")]
    pub orders_topic: String,

    #[serde(default = "default_cancellations_topic")]
    pub cancellations_topic: String,

    #[serde(default = "default_package_status_topic")]
    pub package_status_topic: String,

    #[serde(default = "default_warehouse_events_topic")]
    pub warehouse_events_topic: String,

    #[serde(default = "default_dead_letter_topic")]
    pub dead_letter_topic: String,

    // Runtime
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,

    /// Deliveries of one inbound message before it is dead-lettered.
    #[serde(default = "default_intake_max_deliveries")]
    pub intake_max_deliveries: u32,

    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,

    #[serde(default = "default_store_shards")]
    pub store_shards: usize,

    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // Simulator
    #[serde(default)]
    pub simulator_enabled: bool,

    #[serde(default = "default_simulator_host")]
    pub simulator_host: String,

    #[serde(default = "default_simulator_port")]
    pub simulator_port: u16,

    /// Multiplies the simulated processing delays.
    #[serde(default = "default_simulator_time_scale")]
    pub simulator_time_scale: f64,
}

fn default_legacy_host() -> String {
    "localhost".to_string()
}

fn default_legacy_port() -> u16 {
    9000
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_read_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_retry_multiplier() -> f64 {
    2.0
}

fn default_retry_max_delay_ms() -> u64 {
    10_000
}

fn default_orders_topic() -> String {
    "orders".to_string()
}

fn default_cancellations_topic() -> String {
    "order-cancellations".to_string()
}

fn default_package_status_topic() -> String {
    "package-status".to_string()
}

fn default_warehouse_events_topic() -> String {
    "warehouse-events".to_string()
}

fn default_dead_letter_topic() -> String {
    "wms-dead-letter".to_string()
}

fn default_worker_pool_size() -> usize {
    8
}

fn default_intake_max_deliveries() -> u32 {
    3
}

fn default_channel_buffer() -> usize {
    256
}

fn default_store_shards() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_simulator_host() -> String {
    "127.0.0.1".to_string()
}

fn default_simulator_port() -> u16 {
    9999
}

fn default_simulator_time_scale() -> f64 {
    1.0
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            legacy_host: default_legacy_host(),
            legacy_port: default_legacy_port(),
            legacy_connect_timeout_ms: default_connect_timeout_ms(),
            legacy_read_timeout_ms: default_read_timeout_ms(),
            legacy_max_attempts: default_max_attempts(),
            legacy_retry_delay_ms: default_retry_delay_ms(),
            legacy_retry_multiplier: default_retry_multiplier(),
            legacy_retry_max_delay_ms: default_retry_max_delay_ms(),
            orders_topic: default_orders_topic(),
            cancellations_topic: default_cancellations_topic(),
            package_status_topic: default_package_status_topic(),
            warehouse_events_topic: default_warehouse_events_topic(),
            dead_letter_topic: default_dead_letter_topic(),
            worker_pool_size: default_worker_pool_size(),
            intake_max_deliveries: default_intake_max_deliveries(),
            channel_buffer: default_channel_buffer(),
            store_shards: default_store_shards(),
            log_level: default_log_level(),
            simulator_enabled: false,
            simulator_host: default_simulator_host(),
            simulator_port: default_simulator_port(),
            simulator_time_scale: default_simulator_time_scale(),
        }
    }
}

impl AdapterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("WMS"))
            .build()?
            .try_deserialize()
    }

    pub fn legacy_settings(&self) -> LegacySettings {
        LegacySettings {
            host: self.legacy_host.clone(),
            port: self.legacy_port,
            connect_timeout: Duration::from_millis(self.legacy_connect_timeout_ms),
            read_timeout: Duration::from_millis(self.legacy_read_timeout_ms),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.legacy_max_attempts,
            initial_delay: Duration::from_millis(self.legacy_retry_delay_ms),
            max_delay: Duration::from_millis(self.legacy_retry_max_delay_ms),
            multiplier: self.legacy_retry_multiplier,
        }
    }

    pub fn topics(&self) -> TopicSettings {
        TopicSettings {
            orders: self.orders_topic.clone(),
            cancellations: self.cancellations_topic.clone(),
            package_status: self.package_status_topic.clone(),
            warehouse_events: self.warehouse_events_topic.clone(),
            dead_letter: self.dead_letter_topic.clone(),
        }
    }

    pub fn simulator_settings(&self) -> SimulatorSettings {
        SimulatorSettings {
            host: self.simulator_host.clone(),
            port: self.simulator_port,
            schedule: ProgressionSchedule::scaled(self.simulator_time_scale),
            channel_buffer: self.channel_buffer,
        }
    }
}
