// Port Layer - Interfaces for external dependencies

pub mod event_source;
pub mod id_provider;
pub mod notifier;
pub mod queue_repository;
pub mod time_provider;
pub mod transaction;

// Re-exports
pub use event_source::{Delivery, EventSource};
pub use id_provider::IdProvider;
pub use notifier::{BroadcastNotifier, ChangeNotifier, QueueChange};
pub use queue_repository::QueueRepository;
pub use time_provider::TimeProvider;
pub use transaction::{QueueTransaction, Transaction, TransactionalQueueRepository};
