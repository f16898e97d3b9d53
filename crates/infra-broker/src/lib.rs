// ClinicQ Infrastructure - Broker Adapter
// Implements: EventSource over a bounded in-process channel.
// The real deployment bridges the clinic's AMQP broker onto the publisher
// handle; the coordinator only ever sees the EventSource port.

mod channel_source;

pub use channel_source::{channel_broker, ChannelEventSource, EventPublisher};
