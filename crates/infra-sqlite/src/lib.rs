// ClinicQ Infrastructure - SQLite Queue Store
// Implements: QueueRepository, TransactionalQueueRepository

mod connection;
mod migration;
mod queue_repository;
mod transaction;

pub use connection::create_pool;
pub use migration::run_migrations;
pub use queue_repository::SqliteQueueRepository;
pub use transaction::SqliteQueueTransaction;

// Note: sqlx::Error conversion is handled by map_sqlx_error here
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for
// AppError in the core crate).
