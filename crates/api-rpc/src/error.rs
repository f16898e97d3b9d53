//! RPC Error Types
//!
//! Maps application errors to stable JSON-RPC error codes.

use clinicq_core::domain::DomainError;
use clinicq_core::error::AppError;
use jsonrpsee::types::ErrorObjectOwned;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const ILLEGAL_TRANSITION: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const EMPTY_QUEUE: i32 = 4004;
    pub const FORBIDDEN: i32 = 4005;
    pub const CONFLICT: i32 = 4006;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const STORE_ERROR: i32 = 5001;
    pub const STORE_UNAVAILABLE: i32 = 5002;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    match err {
        AppError::Domain(DomainError::IllegalTransition { .. }) => {
            ErrorObjectOwned::owned(code::ILLEGAL_TRANSITION, err.to_string(), None::<()>)
        }
        AppError::Domain(e) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
        }
        AppError::InvalidEvent(msg) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, msg, None::<()>)
        }
        AppError::NotFound(msg) => ErrorObjectOwned::owned(code::NOT_FOUND, msg, None::<()>),
        AppError::EmptyQueue(partition) => ErrorObjectOwned::owned(
            code::EMPTY_QUEUE,
            format!("No callable entry in partition {}", partition),
            None::<()>,
        ),
        AppError::Conflict(msg) => ErrorObjectOwned::owned(code::CONFLICT, msg, None::<()>),
        AppError::StoreUnavailable(msg) => {
            // Retryable by the caller; committed state is unaffected
            ErrorObjectOwned::owned(code::STORE_UNAVAILABLE, msg, None::<()>)
        }
        AppError::Database(msg) => ErrorObjectOwned::owned(code::STORE_ERROR, msg, None::<()>),
        AppError::Serialization(e) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
        }
        AppError::Io(e) => ErrorObjectOwned::owned(code::INTERNAL_ERROR, e.to_string(), None::<()>),
        AppError::Config(msg) => ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>),
        AppError::Internal(msg) => ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>),
    }
}

/// Rate-limit refusal
pub fn throttled() -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        code::THROTTLED,
        "Rate limit exceeded. Please slow down.",
        None::<()>,
    )
}

/// Role lacks permission for the requested operation
pub fn forbidden(msg: impl Into<String>) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(code::FORBIDDEN, msg.into(), None::<()>)
}
