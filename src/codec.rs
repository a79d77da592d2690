//! # Wire Codec
//!
//! The legacy warehouse system speaks one line per message, nine `|`-separated fields in a
//! fixed order:
//!
//! ```text
//! messageType|sequenceNumber|trackingId|orderId|operation|status|location|data|timestamp
//! ```
//!
//! An absent field is an empty segment. Field values are never escaped, so they must not
//! contain `|`; the codec does not check this.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Field separator on the wire.
pub const DELIMITER: char = '|';

/// Number of fields in every line.
pub const FIELD_COUNT: usize = 9;

/// Message types exchanged with the legacy system.
pub mod kind {
    pub const ORDER: &str = "ORDER";
    pub const QUERY: &str = "QUERY";
    pub const PING: &str = "PING";
    pub const PONG: &str = "PONG";
    pub const ACK: &str = "ACK";
    pub const STATUS: &str = "STATUS";
    pub const ERROR: &str = "ERROR";
}

/// Operation codes carried in the `operation` field.
pub mod operation {
    pub const CREATE: &str = "CREATE";
    pub const CANCEL: &str = "CANCEL";
    pub const STATUS: &str = "STATUS";
    pub const TEST: &str = "TEST";
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid message format. Expected 9 fields, got {found}")]
    MalformedMessage { found: usize },
}

/// One line of the legacy protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireMessage {
    pub message_type: Option<String>,
    pub sequence_number: Option<String>,
    pub tracking_id: Option<String>,
    pub order_id: Option<String>,
    pub operation: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub data: Option<String>,
    pub timestamp: Option<String>,
}

impl WireMessage {
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: Some(message_type.into()),
            ..Self::default()
        }
    }

    pub fn with_sequence_number(mut self, value: impl Into<String>) -> Self {
        self.sequence_number = Some(value.into());
        self
    }

    pub fn with_tracking_id(mut self, value: impl Into<String>) -> Self {
        self.tracking_id = Some(value.into());
        self
    }

    pub fn with_order_id(mut self, value: impl Into<String>) -> Self {
        self.order_id = Some(value.into());
        self
    }

    pub fn with_operation(mut self, value: impl Into<String>) -> Self {
        self.operation = Some(value.into());
        self
    }

    pub fn with_status(mut self, value: impl Into<String>) -> Self {
        self.status = Some(value.into());
        self
    }

    pub fn with_location(mut self, value: impl Into<String>) -> Self {
        self.location = Some(value.into());
        self
    }

    pub fn with_data(mut self, value: impl Into<String>) -> Self {
        self.data = Some(value.into());
        self
    }

    pub fn with_timestamp(mut self, value: impl Into<String>) -> Self {
        self.timestamp = Some(value.into());
        self
    }

    /// Case-insensitive comparison of the message type.
    pub fn is_type(&self, expected: &str) -> bool {
        self.message_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(expected))
    }

    /// Encodes the message as a line, without the terminator.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decodes one line (terminator already stripped).
    pub fn decode(line: &str) -> Result<Self, CodecError> {
        let parts: Vec<&str> = line.split(DELIMITER).collect();
        if parts.len() != FIELD_COUNT {
            return Err(CodecError::MalformedMessage { found: parts.len() });
        }

        let field = |i: usize| -> Option<String> {
            let part = parts[i];
            (!part.is_empty()).then(|| part.to_string())
        };

        Ok(Self {
            message_type: field(0),
            sequence_number: field(1),
            tracking_id: field(2),
            order_id: field(3),
            operation: field(4),
            status: field(5),
            location: field(6),
            data: field(7),
            timestamp: field(8),
        })
    }

    fn fields(&self) -> [&Option<String>; FIELD_COUNT] {
        [
            &self.message_type,
            &self.sequence_number,
            &self.tracking_id,
            &self.order_id,
            &self.operation,
            &self.status,
            &self.location,
            &self.data,
            &self.timestamp,
        ]
    }
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.fields().into_iter().enumerate() {
            if i > 0 {
                write!(f, "{DELIMITER}")?;
            }
            f.write_str(value.as_deref().unwrap_or(""))?;
        }
        Ok(())
    }
}

impl FromStr for WireMessage {
    type Err = CodecError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        Self::decode(line)
    }
}

/// Local wall-clock time in the ISO-8601 form the legacy system expects.
pub fn wire_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.3f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_fields_in_order_with_empty_segments() {
        let msg = WireMessage::new(kind::ORDER)
            .with_sequence_number("7")
            .with_tracking_id("T1")
            .with_order_id("O1")
            .with_operation(operation::CREATE)
            .with_timestamp("2024-05-01T10:00:00");

        assert_eq!(msg.encode(), "ORDER|7|T1|O1|CREATE||||2024-05-01T10:00:00");
    }

    #[test]
    fn test_all_absent_encodes_to_eight_delimiters() {
        assert_eq!(WireMessage::default().encode(), "||||||||");
        assert_eq!(
            WireMessage::decode("||||||||").unwrap(),
            WireMessage::default()
        );
    }

    #[test]
    fn test_decode_keeps_trailing_empty_segments() {
        let msg = WireMessage::decode("PONG|3|||||||").unwrap();
        assert_eq!(msg.message_type.as_deref(), Some("PONG"));
        assert_eq!(msg.sequence_number.as_deref(), Some("3"));
        assert_eq!(msg.timestamp, None);
    }

    #[test]
    fn test_round_trip_preserves_message() {
        let msg = WireMessage::new(kind::STATUS)
            .with_sequence_number("42")
            .with_tracking_id("TRK-9")
            .with_status("PICKED")
            .with_location("Aisle 4")
            .with_data("{\"order_id\":\"O9\"}")
            .with_timestamp(wire_timestamp());

        let decoded: WireMessage = msg.encode().parse().unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_decode_rejects_wrong_field_counts() {
        for line in ["", "PING", "A|B|C|D|E|F|G|H", "A|B|C|D|E|F|G|H|I|J"] {
            let err = WireMessage::decode(line).unwrap_err();
            let expected = line.split('|').count();
            assert_eq!(err, CodecError::MalformedMessage { found: expected });
        }
    }

    #[test]
    fn test_delimiter_inside_value_breaks_decoding() {
        let msg = WireMessage::new(kind::ORDER).with_data("a|b");
        assert!(WireMessage::decode(&msg.encode()).is_err());
    }

    #[test]
    fn test_is_type_ignores_case() {
        let msg = WireMessage::new("ack");
        assert!(msg.is_type(kind::ACK));
        assert!(!msg.is_type(kind::ERROR));
        assert!(!WireMessage::default().is_type(kind::ACK));
    }
}
