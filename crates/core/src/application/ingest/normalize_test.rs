//! Unit tests for inbound event validation

use super::*;
use crate::domain::{ClinicCalendar, SessionSet};
use chrono::{TimeZone, Utc};

fn policy() -> IngestPolicy {
    let sessions = SessionSet::new(
        vec!["morning".to_string(), "afternoon".to_string()],
        "morning",
    )
    .unwrap();
    IngestPolicy::new(sessions, ClinicCalendar::new(0), 15 * 60 * 1000)
}

fn event(appointment_id: &str, patient_id: &str) -> AppointmentInfo {
    AppointmentInfo {
        appointment_id: appointment_id.to_string(),
        patient_id: patient_id.to_string(),
        doctor_id: None,
        start_time: None,
        session: None,
    }
}

const NOW: i64 = 1_772_409_600_000; // 2026-03-02 00:00:00 UTC

#[test]
fn empty_appointment_id_rejected() {
    let result = policy().normalize(&event("", "p-1"), NOW);
    assert!(matches!(result, Err(AppError::InvalidEvent(_))));
}

#[test]
fn empty_patient_id_rejected() {
    let result = policy().normalize(&event("apt-1", "  "), NOW);
    assert!(matches!(result, Err(AppError::InvalidEvent(_))));
}

#[test]
fn unknown_session_rejected() {
    let mut info = event("apt-1", "p-1");
    info.session = Some("evening".to_string());

    let result = policy().normalize(&info, NOW);
    assert!(matches!(result, Err(AppError::InvalidEvent(_))));
}

#[test]
fn missing_session_resolves_to_default() {
    let req = policy().normalize(&event("apt-1", "p-1"), NOW).unwrap();
    assert_eq!(req.session, "morning");
    assert_eq!(req.clinic_day.to_string(), "2026-03-02");
}

#[test]
fn start_time_past_grace_window_rejected() {
    let mut info = event("apt-1", "p-1");
    // One hour before now, grace window is fifteen minutes
    info.start_time = Some(Utc.timestamp_millis_opt(NOW - 60 * 60 * 1000).unwrap());

    let result = policy().normalize(&info, NOW);
    assert!(matches!(result, Err(AppError::InvalidEvent(_))));
}

#[test]
fn start_time_within_grace_window_accepted() {
    let mut info = event("apt-1", "p-1");
    info.start_time = Some(Utc.timestamp_millis_opt(NOW - 5 * 60 * 1000).unwrap());
    info.session = Some("afternoon".to_string());

    let req = policy().normalize(&info, NOW).unwrap();
    assert_eq!(req.appointment_id, "apt-1");
    assert_eq!(req.session, "afternoon");
}

#[test]
fn future_start_time_accepted() {
    let mut info = event("apt-2", "p-2");
    info.start_time = Some(Utc.timestamp_millis_opt(NOW + 60 * 60 * 1000).unwrap());

    assert!(policy().normalize(&info, NOW).is_ok());
}
