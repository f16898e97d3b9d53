//! Daemon configuration loaded from environment variables.
//!
//! Every knob has a sensible default so a bare `clinicq` starts up
//! against a local database with morning/afternoon sessions.

const DEFAULT_DB_PATH: &str = "~/.clinicq/queue.db";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;
const DEFAULT_SESSIONS: &str = "morning,afternoon";
const DEFAULT_SESSION: &str = "morning";
const DEFAULT_GRACE_WINDOW_MS: i64 = 15 * 60 * 1000;
const DEFAULT_INGEST_CAPACITY: usize = 1024;
const DEFAULT_RATE_LIMIT_BURST: u32 = 200;
const DEFAULT_RATE_LIMIT_PER_SEC: u32 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub sessions: Vec<String>,
    pub default_session: String,
    pub utc_offset_minutes: i32,
    pub grace_window_ms: i64,
    pub ingest_capacity: usize,
    pub rate_limit_burst: u32,
    pub rate_limit_per_sec: u32,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        let db_path = std::env::var("CLINICQ_DB_PATH")
            .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DB_PATH).into_owned());

        let rpc_host =
            std::env::var("CLINICQ_RPC_HOST").unwrap_or_else(|_| DEFAULT_RPC_HOST.to_string());

        let rpc_port = std::env::var("CLINICQ_RPC_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RPC_PORT);

        let sessions: Vec<String> = std::env::var("CLINICQ_SESSIONS")
            .unwrap_or_else(|_| DEFAULT_SESSIONS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let default_session = std::env::var("CLINICQ_DEFAULT_SESSION")
            .unwrap_or_else(|_| DEFAULT_SESSION.to_string());

        let utc_offset_minutes = std::env::var("CLINICQ_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let grace_window_ms = std::env::var("CLINICQ_GRACE_WINDOW_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_GRACE_WINDOW_MS);

        let ingest_capacity = std::env::var("CLINICQ_INGEST_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_INGEST_CAPACITY);

        let rate_limit_burst = std::env::var("CLINICQ_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_BURST);

        let rate_limit_per_sec = std::env::var("CLINICQ_RATE_LIMIT_PER_SEC")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_PER_SEC);

        let log_format =
            std::env::var("CLINICQ_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

        Self {
            db_path,
            rpc_host,
            rpc_port,
            sessions,
            default_session,
            utc_offset_minutes,
            grace_window_ms,
            ingest_capacity,
            rate_limit_burst,
            rate_limit_per_sec,
            log_format,
        }
    }
}
