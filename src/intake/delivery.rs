use tokio::sync::oneshot;
use tracing::debug;

/// Settlement of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckKind {
    /// Done with this message, do not deliver it again.
    Ack,
    /// Deliver it again later.
    Nak,
}

/// One inbound message awaiting settlement.
///
/// Dropping a delivery without settling it is reported to the sender as a closed channel,
/// which transports treat like a `Nak`.
#[derive(Debug)]
pub struct Delivery {
    pub payload: Vec<u8>,
    /// 1 on first delivery.
    pub attempt: u32,
    settle: oneshot::Sender<AckKind>,
}

impl Delivery {
    pub fn new(payload: impl Into<Vec<u8>>, attempt: u32) -> (Self, oneshot::Receiver<AckKind>) {
        let (settle, settled) = oneshot::channel();
        let delivery = Self {
            payload: payload.into(),
            attempt,
            settle,
        };
        (delivery, settled)
    }

    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    pub fn ack(self) {
        self.finish(AckKind::Ack);
    }

    pub fn nak(self) {
        self.finish(AckKind::Nak);
    }

    fn finish(self, kind: AckKind) {
        if self.settle.send(kind).is_err() {
            debug!(?kind, attempt = self.attempt, "Delivery settled after sender went away");
        }
    }
}
