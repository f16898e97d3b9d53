// Application Layer - Use Cases and Coordinator Logic

pub mod admission;
pub mod backoff;
pub mod ingest;
pub mod service;
pub mod shutdown;
pub mod transition;

// Re-exports
pub use admission::{AdmissionOutcome, AdmitRequest};
pub use backoff::Backoff;
pub use ingest::{IngestPolicy, Ingestor};
pub use service::{QueuePosition, QueueService};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
