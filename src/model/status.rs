use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Lifecycle of a tracked package.
///
/// ```text
/// RECEIVED -> PROCESSING -> PICKED -> PACKED -> SHIPPED -> DELIVERED
///     \____________\___________\_________\______> FAILED / RETURNED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageStatus {
    Received,
    Processing,
    Picked,
    Packed,
    Shipped,
    Delivered,
    Failed,
    Returned,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown package status: {0}")]
pub struct UnknownStatus(pub String);

impl PackageStatus {
    pub const ALL: [PackageStatus; 8] = [
        PackageStatus::Received,
        PackageStatus::Processing,
        PackageStatus::Picked,
        PackageStatus::Packed,
        PackageStatus::Shipped,
        PackageStatus::Delivered,
        PackageStatus::Failed,
        PackageStatus::Returned,
    ];

    /// Status assumed when the legacy system reports something unrecognized.
    pub const WIRE_FALLBACK: PackageStatus = PackageStatus::Processing;

    pub fn as_str(self) -> &'static str {
        match self {
            PackageStatus::Received => "RECEIVED",
            PackageStatus::Processing => "PROCESSING",
            PackageStatus::Picked => "PICKED",
            PackageStatus::Packed => "PACKED",
            PackageStatus::Shipped => "SHIPPED",
            PackageStatus::Delivered => "DELIVERED",
            PackageStatus::Failed => "FAILED",
            PackageStatus::Returned => "RETURNED",
        }
    }

    /// Packages that already left the warehouse can no longer be cancelled.
    pub fn is_cancellable(self) -> bool {
        !matches!(self, PackageStatus::Shipped | PackageStatus::Delivered)
    }

    /// Total mapping from a status string reported by the legacy system.
    ///
    /// Enum names match case-insensitively. The legacy system's own vocabulary maps
    /// `ACCEPTED` to `PROCESSING` and `CANCELLED` to `FAILED`; anything else becomes
    /// [`Self::WIRE_FALLBACK`].
    pub fn from_wire(value: &str) -> Self {
        let normalized = value.trim().to_ascii_uppercase();
        if let Ok(status) = normalized.parse() {
            return status;
        }
        match normalized.as_str() {
            "ACCEPTED" => PackageStatus::Processing,
            "CANCELLED" | "CANCELED" => PackageStatus::Failed,
            _ => {
                warn!(status = value, fallback = %Self::WIRE_FALLBACK, "Unknown status from WMS");
                Self::WIRE_FALLBACK
            }
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
