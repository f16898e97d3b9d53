//! ClinicQ JSON-RPC API
//!
//! Exposes the query/transition facade to clinic-facing consumers over
//! JSON-RPC 2.0, with coarse role authorization at the verified-token
//! boundary.

pub mod auth;
pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
