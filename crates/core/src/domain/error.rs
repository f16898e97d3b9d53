// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Unknown entry status: {0}")]
    UnknownStatus(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
