//! Attendance model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub checked_in_by: Option<Uuid>,
}

/// Attendance joined with the registration, event and attendee
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceListRow {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub entry_code: String,
    pub event_id: Uuid,
    pub event_title: String,
    pub event_date: NaiveDate,
    pub user_full_name: Option<String>,
    pub user_email: String,
}

/// How a check-in request identifies the registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInTarget {
    EntryCode(String),
    RegistrationId(Uuid),
}

impl CheckInTarget {
    /// Method name recorded in the audit log
    pub fn method(&self) -> &'static str {
        match self {
            CheckInTarget::EntryCode(_) => "entry_code",
            CheckInTarget::RegistrationId(_) => "registration_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInOutcome {
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub entry_code: String,
    pub already_checked_in: bool,
    pub checked_in_at: DateTime<Utc>,
}

/// Present/absent figures for one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttendanceStats {
    pub event_id: Uuid,
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    pub rate: u32,
}
