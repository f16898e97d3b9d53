// Partition Domain Model
//
// A partition is the (clinic day, session) grouping within which queue
// numbers are unique and ordered.

use crate::domain::error::{DomainError, Result};
use chrono::{DateTime, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Partition key: one clinic day of one session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    pub clinic_day: NaiveDate,
    pub session: String,
}

impl PartitionKey {
    pub fn new(clinic_day: NaiveDate, session: impl Into<String>) -> Self {
        Self {
            clinic_day,
            session: session.into(),
        }
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.clinic_day, self.session)
    }
}

/// The configured set of valid session names plus the default applied to
/// events that carry none.
#[derive(Debug, Clone)]
pub struct SessionSet {
    names: Vec<String>,
    default: String,
}

impl SessionSet {
    pub fn new(names: Vec<String>, default: impl Into<String>) -> Result<Self> {
        let default = default.into();
        if names.is_empty() {
            return Err(DomainError::Validation(
                "session set must not be empty".to_string(),
            ));
        }
        if !names.contains(&default) {
            return Err(DomainError::UnknownSession(default));
        }
        Ok(Self { names, default })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Map an optional inbound session name to a concrete one.
    /// `None` resolves to the default; an unknown name is rejected.
    pub fn resolve<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str> {
        match requested {
            None => Ok(&self.default),
            Some(name) if self.contains(name) => Ok(name),
            Some(name) => Err(DomainError::UnknownSession(name.to_string())),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Maps instants to clinic days using a fixed UTC offset.
///
/// The boundary is a configuration decision, not wall-clock local time;
/// a fixed offset keeps day assignment stable across the operational day.
#[derive(Debug, Clone, Copy)]
pub struct ClinicCalendar {
    utc_offset_minutes: i32,
}

impl ClinicCalendar {
    pub fn new(utc_offset_minutes: i32) -> Self {
        Self { utc_offset_minutes }
    }

    /// Clinic day containing the given instant (epoch ms)
    pub fn day_of(&self, epoch_millis: i64) -> NaiveDate {
        let utc = DateTime::from_timestamp_millis(epoch_millis)
            .unwrap_or(DateTime::UNIX_EPOCH);
        (utc + Duration::minutes(self.utc_offset_minutes as i64)).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_falls_back_to_default() {
        let sessions =
            SessionSet::new(vec!["morning".to_string(), "afternoon".to_string()], "morning")
                .unwrap();

        assert_eq!(sessions.resolve(None).unwrap(), "morning");
        assert_eq!(sessions.resolve(Some("afternoon")).unwrap(), "afternoon");
        assert!(matches!(
            sessions.resolve(Some("evening")),
            Err(DomainError::UnknownSession(_))
        ));
    }

    #[test]
    fn default_must_be_a_member() {
        let result = SessionSet::new(vec!["morning".to_string()], "evening");
        assert!(result.is_err());
    }

    #[test]
    fn day_boundary_follows_offset() {
        // 2026-03-02 01:30 UTC
        let instant = chrono::NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();

        let utc = ClinicCalendar::new(0);
        assert_eq!(utc.day_of(instant).to_string(), "2026-03-02");

        // Clinic three hours behind UTC is still on the previous day
        let behind = ClinicCalendar::new(-180);
        assert_eq!(behind.day_of(instant).to_string(), "2026-03-01");
    }

    #[test]
    fn partition_key_display() {
        let key = PartitionKey::new(
            chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            "morning",
        );
        assert_eq!(key.to_string(), "2026-03-02/morning");
    }
}
