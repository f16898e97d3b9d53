// Domain Layer - Pure business logic and entities

pub mod entry;
pub mod error;
pub mod partition;
pub mod principal;

// Re-exports
pub use entry::{AppointmentId, AppointmentInfo, EntryId, EntryStatus, PatientId, QueueEntry};
pub use error::DomainError;
pub use partition::{ClinicCalendar, PartitionKey, SessionSet};
pub use principal::{Principal, Role};
