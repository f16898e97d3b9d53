// Event Source Port - inbound broker boundary

use crate::error::Result;
use async_trait::async_trait;

/// One at-least-once delivery from the broker. The payload is the raw JSON
/// body; decoding into `AppointmentInfo` is the ingestor's job.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub tag: u64,
    pub payload: serde_json::Value,
}

/// Broker consumption interface with explicit settlement.
///
/// A delivery stays outstanding until the ingestor settles it, which is how
/// backpressure works: nothing is acknowledged before the admission
/// transaction durably commits (or the event is durably rejected).
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Next delivery; `None` when the source is closed
    async fn next(&self) -> Result<Option<Delivery>>;

    /// Settle a delivery as processed
    async fn ack(&self, tag: u64) -> Result<()>;

    /// Settle a delivery as invalid; the broker dead-letters it
    async fn reject(&self, tag: u64) -> Result<()>;

    /// Return a delivery for later redelivery (transient store failure)
    async fn requeue(&self, tag: u64) -> Result<()>;
}
