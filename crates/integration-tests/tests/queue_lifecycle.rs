//! End-to-end queue lifecycle tests against a real SQLite store.
//!
//! Covers admission ordering, idempotent redelivery, the status state
//! machine and the ordered read paths.

use std::sync::Arc;

use chrono::NaiveDate;
use clinicq_core::application::{AdmitRequest, QueueService};
use clinicq_core::domain::{DomainError, EntryStatus, PartitionKey};
use clinicq_core::error::AppError;
use clinicq_core::port::id_provider::UuidProvider;
use clinicq_core::port::notifier::BroadcastNotifier;
use clinicq_core::port::time_provider::SystemTimeProvider;
use clinicq_infra_sqlite::{create_pool, run_migrations, SqliteQueueRepository};

async fn service() -> Arc<QueueService> {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let repo = Arc::new(SqliteQueueRepository::new(pool.clone()));
    let tx_repo = Arc::new(SqliteQueueRepository::new(pool));
    Arc::new(QueueService::new(
        tx_repo,
        repo,
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
        Arc::new(BroadcastNotifier::new(64)),
    ))
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn admit_req(appointment_id: &str, session: &str) -> AdmitRequest {
    AdmitRequest {
        appointment_id: appointment_id.to_string(),
        patient_id: format!("patient-{}", appointment_id),
        doctor_id: Some("dr-lee".to_string()),
        clinic_day: day(),
        session: session.to_string(),
    }
}

#[tokio::test]
async fn admissions_get_increasing_numbers_and_fifo_call_order() {
    let service = service().await;
    let partition = PartitionKey::new(day(), "morning");

    for i in 1..=3 {
        let outcome = service
            .admit(admit_req(&format!("appt-{}", i), "morning"))
            .await
            .unwrap();
        assert!(outcome.is_new());
        assert_eq!(outcome.entry().queue_number, i as i64);
    }

    let entries = service.list_active(&partition).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries.iter().map(|e| e.queue_number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    // call_next walks the queue in number order
    let first = service.call_next(&partition).await.unwrap();
    assert_eq!(first.queue_number, 1);
    assert_eq!(first.status, EntryStatus::Called);

    let second = service.call_next(&partition).await.unwrap();
    assert_eq!(second.queue_number, 2);
}

#[tokio::test]
async fn duplicate_admission_returns_original_entry() {
    let service = service().await;

    let first = service.admit(admit_req("appt-dup", "morning")).await.unwrap();
    assert!(first.is_new());

    let second = service.admit(admit_req("appt-dup", "morning")).await.unwrap();
    assert!(!second.is_new());
    assert_eq!(second.entry().id, first.entry().id);
    assert_eq!(second.entry().queue_number, first.entry().queue_number);

    // Only one row exists for the appointment
    let partition = PartitionKey::new(day(), "morning");
    let entries = service.list_active(&partition).await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn sessions_number_independently() {
    let service = service().await;

    let morning = service.admit(admit_req("appt-m", "morning")).await.unwrap();
    let afternoon = service
        .admit(admit_req("appt-a", "afternoon"))
        .await
        .unwrap();

    assert_eq!(morning.entry().queue_number, 1);
    assert_eq!(afternoon.entry().queue_number, 1);
}

#[tokio::test]
async fn full_visit_lifecycle() {
    let service = service().await;
    let partition = PartitionKey::new(day(), "morning");

    service.admit(admit_req("appt-visit", "morning")).await.unwrap();

    let called = service.call_next(&partition).await.unwrap();
    assert_eq!(called.status, EntryStatus::Called);
    assert!(called.called_at.is_some());

    let in_progress = service
        .transition(&called.id, EntryStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(in_progress.status, EntryStatus::InProgress);

    let done = service
        .transition(&called.id, EntryStatus::Done)
        .await
        .unwrap();
    assert_eq!(done.status, EntryStatus::Done);
    assert!(done.finished_at.is_some());

    // The finished entry no longer shows up as active
    let entries = service.list_active(&partition).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn illegal_transition_is_rejected_and_state_unchanged() {
    let service = service().await;

    let outcome = service.admit(admit_req("appt-ill", "morning")).await.unwrap();
    let id = outcome.entry().id.clone();

    let err = service.transition(&id, EntryStatus::Done).await.unwrap_err();
    match err {
        AppError::Domain(DomainError::IllegalTransition { from, to }) => {
            assert_eq!(from, "WAITING");
            assert_eq!(to, "DONE");
        }
        other => panic!("expected IllegalTransition, got {:?}", other),
    }

    let entry = service.find_entry(&id).await.unwrap().unwrap();
    assert_eq!(entry.status, EntryStatus::Waiting);
}

#[tokio::test]
async fn skipped_is_terminal() {
    let service = service().await;

    let outcome = service.admit(admit_req("appt-skip", "morning")).await.unwrap();
    let id = outcome.entry().id.clone();

    let skipped = service.transition(&id, EntryStatus::Skipped).await.unwrap();
    assert_eq!(skipped.status, EntryStatus::Skipped);

    // No way back onto the queue for this entry
    let err = service.transition(&id, EntryStatus::Called).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::IllegalTransition { .. })
    ));
}

#[tokio::test]
async fn call_next_on_empty_partition_reports_empty_queue() {
    let service = service().await;

    service.admit(admit_req("appt-only-m", "morning")).await.unwrap();

    let empty = PartitionKey::new(day(), "afternoon");
    let err = service.call_next(&empty).await.unwrap_err();
    assert!(matches!(err, AppError::EmptyQueue(_)));
}

#[tokio::test]
async fn position_counts_only_active_entries_ahead() {
    let service = service().await;
    let partition = PartitionKey::new(day(), "morning");

    for i in 1..=3 {
        service
            .admit(admit_req(&format!("appt-pos-{}", i), "morning"))
            .await
            .unwrap();
    }

    let position = service.position_of("appt-pos-3").await.unwrap();
    assert_eq!(position.position, 3);
    assert_eq!(position.ahead, 2);

    // Finishing the head entry moves everyone up
    let head = service.call_next(&partition).await.unwrap();
    service
        .transition(&head.id, EntryStatus::InProgress)
        .await
        .unwrap();
    service.transition(&head.id, EntryStatus::Done).await.unwrap();

    let position = service.position_of("appt-pos-3").await.unwrap();
    assert_eq!(position.position, 2);
    assert_eq!(position.ahead, 1);
}

#[tokio::test]
async fn position_of_unknown_appointment_is_not_found() {
    let service = service().await;
    let err = service.position_of("appt-missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn committed_changes_reach_subscribers() {
    let service = service().await;
    let mut changes = service.subscribe();

    let outcome = service.admit(admit_req("appt-notify", "morning")).await.unwrap();
    let id = outcome.entry().id.clone();
    let partition = PartitionKey::new(day(), "morning");

    service.call_next(&partition).await.unwrap();
    service.transition(&id, EntryStatus::InProgress).await.unwrap();

    let admitted = changes.recv().await.unwrap();
    assert_eq!(admitted.status, EntryStatus::Waiting);
    assert_eq!(admitted.entry_id, id);

    let called = changes.recv().await.unwrap();
    assert_eq!(called.status, EntryStatus::Called);

    let in_progress = changes.recv().await.unwrap();
    assert_eq!(in_progress.status, EntryStatus::InProgress);
}

#[tokio::test]
async fn per_status_counts_track_the_partition() {
    let service = service().await;
    let partition = PartitionKey::new(day(), "morning");

    for i in 1..=3 {
        service
            .admit(admit_req(&format!("appt-count-{}", i), "morning"))
            .await
            .unwrap();
    }
    let head = service.call_next(&partition).await.unwrap();
    service.transition(&head.id, EntryStatus::InProgress).await.unwrap();
    service.transition(&head.id, EntryStatus::Done).await.unwrap();

    let waiting = service
        .count_by_status(&partition, EntryStatus::Waiting)
        .await
        .unwrap();
    let done = service
        .count_by_status(&partition, EntryStatus::Done)
        .await
        .unwrap();

    assert_eq!(waiting, 2);
    assert_eq!(done, 1);
}
