use crate::model::now;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentStatus {
    Up,
    Down,
}

impl From<bool> for ComponentStatus {
    fn from(up: bool) -> Self {
        if up {
            ComponentStatus::Up
        } else {
            ComponentStatus::Down
        }
    }
}

/// Liveness snapshot. Simulator fields are absent when it is not running in-process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub wms_tcp_connection: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_wms_server: Option<ComponentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_packages_count: Option<usize>,
    pub overall_status: ComponentStatus,
    pub timestamp: NaiveDateTime,
}

impl HealthReport {
    /// Overall status follows the legacy connection.
    pub fn new(wms_connected: bool, simulator: Option<(bool, usize)>) -> Self {
        Self {
            wms_tcp_connection: wms_connected.into(),
            mock_wms_server: simulator.map(|(running, _)| running.into()),
            mock_packages_count: simulator.map(|(_, count)| count),
            overall_status: wms_connected.into(),
            timestamp: now(),
        }
    }
}
