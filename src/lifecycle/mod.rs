//! Service wiring: startup, health and graceful shutdown.

pub mod health;
pub mod system;

pub use health::{ComponentStatus, HealthReport};
pub use system::{AdapterSystem, SystemError};
