//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use crate::auth;
use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    AdmitRequest, AdmitResponse, CallNextRequest, CallNextResponse, ListQueueRequest,
    ListQueueResponse, PositionRequest, PositionResponse, StatsRequest, StatsResponse,
    TransitionRequest, TransitionResponse,
};
use clinicq_core::application::admission::AdmitRequest as CoreAdmitRequest;
use clinicq_core::application::{IngestPolicy, QueueService};
use clinicq_core::domain::{EntryStatus, PartitionKey};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<QueueService>,
    policy: IngestPolicy,
    time_provider: Arc<dyn clinicq_core::port::TimeProvider>,
    rate_limiter: RateLimiter,
}

impl RpcHandler {
    pub fn new(
        service: Arc<QueueService>,
        policy: IngestPolicy,
        time_provider: Arc<dyn clinicq_core::port::TimeProvider>,
        rate_limit_burst: u32,
        rate_limit_per_sec: u32,
    ) -> Self {
        Self {
            service,
            policy,
            time_provider,
            rate_limiter: RateLimiter::new(rate_limit_burst, rate_limit_per_sec),
        }
    }

    /// Current partition for an optional session name
    fn resolve_partition(&self, session: Option<&str>) -> Result<PartitionKey, ErrorObjectOwned> {
        let session = self
            .policy
            .sessions()
            .resolve(session)
            .map_err(|e| to_rpc_error(e.into()))?
            .to_string();
        let day = self
            .policy
            .calendar()
            .day_of(self.time_provider.now_millis());
        Ok(PartitionKey::new(day, session))
    }

    async fn check_rate_limit(&self) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.check().await {
            Ok(())
        } else {
            Err(throttled())
        }
    }

    /// queue.admit.v1
    pub async fn admit(&self, params: AdmitRequest) -> Result<AdmitResponse, ErrorObjectOwned> {
        self.check_rate_limit().await?;
        let principal = auth::require_queue_manager(&params.auth)?;

        let partition = self.resolve_partition(params.session.as_deref())?;
        if params.appointment_id.trim().is_empty() || params.patient_id.trim().is_empty() {
            return Err(to_rpc_error(clinicq_core::AppError::InvalidEvent(
                "appointment_id and patient_id must not be empty".to_string(),
            )));
        }

        let req = CoreAdmitRequest {
            appointment_id: params.appointment_id,
            patient_id: params.patient_id,
            doctor_id: params.doctor_id,
            clinic_day: partition.clinic_day,
            session: partition.session,
        };

        info!(subject = %principal.subject, "Manual admission requested");
        let outcome = self.service.admit(req).await.map_err(to_rpc_error)?;
        let already_queued = !outcome.is_new();

        Ok(AdmitResponse {
            entry: outcome.entry().clone().into(),
            already_queued,
        })
    }

    /// queue.list.v1
    pub async fn list(&self, params: ListQueueRequest) -> Result<ListQueueResponse, ErrorObjectOwned> {
        auth::principal(&params.auth)?;
        let partition = self.resolve_partition(params.session.as_deref())?;

        let entries = self
            .service
            .list_active(&partition)
            .await
            .map_err(to_rpc_error)?;

        Ok(ListQueueResponse {
            partition: partition.to_string(),
            entries: entries.into_iter().map(Into::into).collect(),
        })
    }

    /// queue.position.v1
    pub async fn position(
        &self,
        params: PositionRequest,
    ) -> Result<PositionResponse, ErrorObjectOwned> {
        auth::principal(&params.auth)?;

        let position = self
            .service
            .position_of(&params.appointment_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(PositionResponse {
            entry_id: position.entry.id.clone(),
            partition: position.entry.partition().to_string(),
            queue_number: position.entry.queue_number,
            position: position.position,
            ahead: position.ahead,
        })
    }

    /// queue.call_next.v1
    pub async fn call_next(
        &self,
        params: CallNextRequest,
    ) -> Result<CallNextResponse, ErrorObjectOwned> {
        self.check_rate_limit().await?;
        auth::require_queue_manager(&params.auth)?;

        let partition = self.resolve_partition(params.session.as_deref())?;
        let entry = self
            .service
            .call_next(&partition)
            .await
            .map_err(to_rpc_error)?;

        Ok(CallNextResponse {
            entry: entry.into(),
        })
    }

    /// queue.transition.v1
    pub async fn transition(
        &self,
        params: TransitionRequest,
    ) -> Result<TransitionResponse, ErrorObjectOwned> {
        self.check_rate_limit().await?;
        auth::require_queue_manager(&params.auth)?;

        let target = EntryStatus::parse(&params.target)
            .map_err(|e| to_rpc_error(e.into()))?;

        let entry = self
            .service
            .transition(&params.entry_id, target)
            .await
            .map_err(to_rpc_error)?;

        Ok(TransitionResponse {
            entry: entry.into(),
        })
    }

    /// admin.stats.v1
    pub async fn stats(&self, params: StatsRequest) -> Result<StatsResponse, ErrorObjectOwned> {
        auth::require_queue_manager(&params.auth)?;
        let partition = self.resolve_partition(params.session.as_deref())?;

        let mut counts = [0i64; 5];
        for (slot, status) in counts.iter_mut().zip([
            EntryStatus::Waiting,
            EntryStatus::Called,
            EntryStatus::InProgress,
            EntryStatus::Done,
            EntryStatus::Skipped,
        ]) {
            *slot = self
                .service
                .count_by_status(&partition, status)
                .await
                .map_err(to_rpc_error)?;
        }

        Ok(StatsResponse {
            partition: partition.to_string(),
            waiting: counts[0],
            called: counts[1],
            in_progress: counts[2],
            done: counts[3],
            skipped: counts[4],
        })
    }
}
