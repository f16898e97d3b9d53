//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over TCP on localhost; the clinic gateway terminates TLS
//! and auth in front of it.

use crate::handler::RpcHandler;
use crate::types::{
    AdmitRequest, CallNextRequest, ListQueueRequest, PositionRequest, StatsRequest,
    TransitionRequest,
};
use clinicq_core::application::{IngestPolicy, QueueService};
use clinicq_core::port::TimeProvider;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
    pub rate_limit_burst: u32,
    pub rate_limit_per_sec: u32,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
            rate_limit_burst: 200,
            rate_limit_per_sec: 100,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        service: Arc<QueueService>,
        policy: IngestPolicy,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let handler = Arc::new(RpcHandler::new(
            service,
            policy,
            time_provider,
            config.rate_limit_burst,
            config.rate_limit_per_sec,
        ));
        Self { config, handler }
    }

    /// Start the JSON-RPC server
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP (localhost only)"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method("queue.admit.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: AdmitRequest = params.parse()?;
                    handler.admit(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.list.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ListQueueRequest = params.parse()?;
                    handler.list(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.position.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: PositionRequest = params.parse()?;
                    handler.position(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.call_next.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: CallNextRequest = params.parse()?;
                    handler.call_next(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.transition.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: TransitionRequest = params.parse()?;
                    handler.transition(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("admin.stats.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: StatsRequest = params.parse()?;
                    handler.stats(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        info!("JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok(handle)
    }
}
