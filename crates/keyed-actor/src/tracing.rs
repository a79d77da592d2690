//! # Tracing Setup
//!
//! One-call subscriber installation shared by every binary in the workspace.
//!
//! ```bash
//! RUST_LOG=info cargo run                  # compact lifecycle logs
//! RUST_LOG=debug cargo run                 # request payloads and wire lines
//! RUST_LOG=wms_bridge=debug,info cargo run # per-crate filtering
//! ```
//!
//! Actors log with a `kind` field naming the record type, so the target is
//! hidden.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, reading `RUST_LOG` and falling back to `default_level`.
///
/// Returns `false` if a subscriber was already installed (tests install their own).
pub fn setup_tracing(default_level: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
