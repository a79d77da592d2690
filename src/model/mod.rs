//! # Domain Model
//!
//! Packages, their audit events, and the messages exchanged over the bus.

pub mod event;
pub mod messages;
pub mod package;
pub mod status;

pub use event::*;
pub use messages::*;
pub use package::*;
pub use status::*;

use chrono::NaiveDateTime;

/// Value of every `source` field this service emits.
pub const SOURCE: &str = "WMS-ADAPTER";

/// Local wall-clock time, the timestamp flavour used throughout the model.
pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
