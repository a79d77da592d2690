//! # WMS Bridge
//!
//! > **Connects an order/event message bus to a legacy warehouse system that only speaks
//! > a line-oriented TCP protocol.**
//!
//! Orders come in from the bus, become legacy protocol requests, and every package state
//! change goes back out as status and event messages.
//!
//! ## 🗺️ Module Tour
//!
//! ```text
//! bus ─> intake ─> orchestrator ─> legacy client ─> (TCP) ─> legacy system / simulator
//!                      │
//!                      ├─> store (package + events, one actor per shard)
//!                      └─> publish (package-status, warehouse-events, dead letters)
//! ```
//!
//! - [`codec`]: the 9-field `|`-delimited wire format.
//! - [`legacy`]: TCP client with timeouts and retry, behind the [`LegacyGateway`](legacy::LegacyGateway) trait.
//! - [`simulator`]: an in-process stand-in for the legacy system.
//! - [`model`]: packages, events, bus messages.
//! - [`store`]: keyed package storage built on `keyed_actor`.
//! - [`orchestrator`]: the package state machine.
//! - [`intake`]: at-least-once consumption with ack, redelivery and dead letters.
//! - [`publish`]: outbound notifications.
//! - [`lifecycle`]: wiring, health, shutdown.
//! - [`config`]: `WMS_*` environment configuration.
//!
//! ## 🚀 Running
//!
//! ```bash
//! # Against a local simulator, with compressed processing delays
//! WMS_SIMULATOR_ENABLED=true WMS_SIMULATOR_TIME_SCALE=0.1 RUST_LOG=info cargo run
//! ```

pub mod codec;
pub mod config;
pub mod intake;
pub mod legacy;
pub mod lifecycle;
pub mod model;
pub mod orchestrator;
pub mod publish;
pub mod simulator;
pub mod store;
